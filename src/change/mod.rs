//! Change requests
//!
//! One requested DDL operation against one table, plus the capability every
//! routable change exposes to the routing policy.

mod kinds;

pub use kinds::*;

use crate::error::OscResult;
use crate::fragment::{alter_fragment, FragmentContext};
use serde::{Deserialize, Serialize};

/// Catalog-qualified table reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(rename = "tableName")]
    pub table: String,
}

impl TableRef {
    pub fn new(table: impl Into<String>) -> Self {
        Self { catalog: None, schema: None, table: table.into() }
    }

    pub fn in_catalog(catalog: impl Into<String>, table: impl Into<String>) -> Self {
        Self { catalog: Some(catalog.into()), schema: None, table: table.into() }
    }
}

/// Per-change tool flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum ToolUsage {
    /// Use the configured default
    #[default]
    Inherit,
    Enabled,
    Disabled,
}

impl ToolUsage {
    pub fn resolve(self, default_on: bool) -> bool {
        match self {
            ToolUsage::Inherit => default_on,
            ToolUsage::Enabled => true,
            ToolUsage::Disabled => false,
        }
    }
}

impl From<Option<bool>> for ToolUsage {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => ToolUsage::Inherit,
            Some(true) => ToolUsage::Enabled,
            Some(false) => ToolUsage::Disabled,
        }
    }
}

impl From<ToolUsage> for Option<bool> {
    fn from(value: ToolUsage) -> Self {
        match value {
            ToolUsage::Inherit => None,
            ToolUsage::Enabled => Some(true),
            ToolUsage::Disabled => Some(false),
        }
    }
}

/// Capability of a change that may be executed through the tool.
pub trait ToolRoutable {
    /// Kind name, matched against `skip_changes`
    fn change_name(&self) -> &'static str;
    fn target_table(&self) -> &str;
    /// Database (catalog) of the target table, if the change names one
    fn target_database(&self) -> Option<&str>;
    fn tool_usage(&self) -> ToolUsage;
    /// Per-change override of the tool options
    fn tool_options(&self) -> Option<&str>;
    /// ALTER clause text passed to the tool
    fn alter_fragment(&self, ctx: &FragmentContext<'_>) -> OscResult<String>;
}

/// A single requested DDL change.
///
/// The tool flag and options are routing hints and are never serialized, so
/// toggling them does not alter a change's serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequest {
    #[serde(flatten)]
    pub table: TableRef,
    #[serde(default, skip_serializing)]
    pub use_tool: ToolUsage,
    #[serde(default, skip_serializing)]
    pub tool_options: Option<String>,
    pub change: ChangeKind,
}

impl ChangeRequest {
    pub fn new(table: TableRef, change: ChangeKind) -> Self {
        Self { table, use_tool: ToolUsage::Inherit, tool_options: None, change }
    }

    pub fn with_tool(mut self, usage: ToolUsage) -> Self {
        self.use_tool = usage;
        self
    }

    pub fn with_tool_options(mut self, options: impl Into<String>) -> Self {
        self.tool_options = Some(options.into());
        self
    }

    /// The structurally opposite change used for rollback, if one exists
    pub fn inverse(&self) -> Option<ChangeRequest> {
        let change = match &self.change {
            ChangeKind::AddColumn(c) => ChangeKind::DropColumn(DropColumnChange {
                column_name: None,
                columns: c.columns.iter().map(|col| col.name.clone()).collect(),
            }),
            ChangeKind::CreateIndex(c) => ChangeKind::DropIndex(DropIndexChange {
                index_name: c.index_name.clone()?,
            }),
            ChangeKind::AddUniqueConstraint(c) => {
                ChangeKind::DropUniqueConstraint(DropUniqueConstraintChange {
                    constraint_name: c.constraint_name.clone()?,
                })
            }
            ChangeKind::AddForeignKeyConstraint(c) => {
                ChangeKind::DropForeignKeyConstraint(DropForeignKeyConstraintChange {
                    constraint_name: c.constraint_name.clone()?,
                })
            }
            ChangeKind::AddPrimaryKey(_)
            | ChangeKind::DropColumn(_)
            | ChangeKind::DropUniqueConstraint(_)
            | ChangeKind::DropForeignKeyConstraint(_)
            | ChangeKind::DropIndex(_)
            | ChangeKind::ModifyDataType(_) => return None,
        };

        Some(ChangeRequest {
            table: self.table.clone(),
            use_tool: self.use_tool,
            tool_options: self.tool_options.clone(),
            change,
        })
    }
}

impl ToolRoutable for ChangeRequest {
    fn change_name(&self) -> &'static str {
        self.change.name()
    }

    fn target_table(&self) -> &str {
        &self.table.table
    }

    fn target_database(&self) -> Option<&str> {
        self.table.catalog.as_deref().filter(|c| !c.is_empty())
    }

    fn tool_usage(&self) -> ToolUsage {
        self.use_tool
    }

    fn tool_options(&self) -> Option<&str> {
        self.tool_options.as_deref()
    }

    fn alter_fragment(&self, ctx: &FragmentContext<'_>) -> OscResult<String> {
        alter_fragment(self, ctx)
    }
}
