//! Per-kind change parameters

use super::TableRef;
use serde::{Deserialize, Serialize};

/// The DDL operations that can be routed through the tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ChangeKind {
    AddColumn(AddColumnChange),
    DropColumn(DropColumnChange),
    AddPrimaryKey(AddPrimaryKeyChange),
    AddUniqueConstraint(AddUniqueConstraintChange),
    DropUniqueConstraint(DropUniqueConstraintChange),
    AddForeignKeyConstraint(AddForeignKeyConstraintChange),
    DropForeignKeyConstraint(DropForeignKeyConstraintChange),
    CreateIndex(CreateIndexChange),
    DropIndex(DropIndexChange),
    ModifyDataType(ModifyDataTypeChange),
}

impl ChangeKind {
    /// Name used by the `skip_changes` setting
    pub fn name(&self) -> &'static str {
        match self {
            ChangeKind::AddColumn(_) => "addColumn",
            ChangeKind::DropColumn(_) => "dropColumn",
            ChangeKind::AddPrimaryKey(_) => "addPrimaryKey",
            ChangeKind::AddUniqueConstraint(_) => "addUniqueConstraint",
            ChangeKind::DropUniqueConstraint(_) => "dropUniqueConstraint",
            ChangeKind::AddForeignKeyConstraint(_) => "addForeignKeyConstraint",
            ChangeKind::DropForeignKeyConstraint(_) => "dropForeignKeyConstraint",
            ChangeKind::CreateIndex(_) => "createIndex",
            ChangeKind::DropIndex(_) => "dropIndex",
            ChangeKind::ModifyDataType(_) => "modifyDataType",
        }
    }
}

/// Default value of a new column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DefaultValue {
    /// Quoted as a string literal
    Value(String),
    Numeric(String),
    Boolean(bool),
    /// Raw SQL expression, emitted as-is
    Computed(String),
}

/// Constraints declared inline on a new column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnConstraints {
    /// `None` renders as `NULL`
    pub nullable: Option<bool>,
    pub foreign_key_name: Option<String>,
    /// Shorthand reference such as `parent(id)`
    pub references: Option<String>,
    pub referenced_table_name: Option<String>,
    pub referenced_column_names: Option<String>,
    pub unique: bool,
    pub unique_constraint_name: Option<String>,
}

impl ColumnConstraints {
    /// Referenced table and column text, from `references` or the split fields
    pub fn reference_target(&self) -> Option<(String, String)> {
        if let Some(references) = self.references.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            return Some(match references.find('(') {
                Some(open) => (
                    references[..open].trim().to_string(),
                    references[open + 1..].trim_end_matches(')').trim().to_string(),
                ),
                None => (references.to_string(), String::new()),
            });
        }
        self.referenced_table_name
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|table| {
                (
                    table.to_string(),
                    self.referenced_column_names.clone().unwrap_or_default(),
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default)]
    pub constraints: ColumnConstraints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DefaultValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_column: Option<String>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            constraints: ColumnConstraints::default(),
            default_value: None,
            remarks: None,
            after_column: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddColumnChange {
    pub columns: Vec<ColumnSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DropColumnChange {
    /// Used when `columns` is empty
    pub column_name: Option<String>,
    pub columns: Vec<String>,
}

impl DropColumnChange {
    pub fn column_names(&self) -> Vec<&str> {
        if self.columns.is_empty() {
            self.column_name.as_deref().into_iter().collect()
        } else {
            self.columns.iter().map(String::as_str).collect()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPrimaryKeyChange {
    pub column_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddUniqueConstraintChange {
    pub column_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropUniqueConstraintChange {
    pub constraint_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddForeignKeyConstraintChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_name: Option<String>,
    pub base_column_names: Vec<String>,
    pub referenced_table: TableRef,
    pub referenced_column_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<String>,
    #[serde(default)]
    pub deferrable: bool,
    #[serde(default)]
    pub initially_deferred: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropForeignKeyConstraintChange {
    pub constraint_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexColumn {
    /// Column name, optionally with a prefix length such as `name(10)`
    pub name: String,
    /// Functional index part, emitted unescaped
    #[serde(default)]
    pub computed: bool,
}

impl IndexColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), computed: false }
    }

    pub fn computed(expression: impl Into<String>) -> Self {
        Self { name: expression.into(), computed: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIndexChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,
    #[serde(default)]
    pub unique: bool,
    pub columns: Vec<IndexColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropIndexChange {
    pub index_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyDataTypeChange {
    pub column_name: String,
    pub new_data_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_target_shorthand() {
        let constraints = ColumnConstraints {
            references: Some("test_parent(id)".to_string()),
            ..Default::default()
        };
        assert_eq!(
            constraints.reference_target(),
            Some(("test_parent".to_string(), "id".to_string()))
        );
    }

    #[test]
    fn test_reference_target_split_fields() {
        let constraints = ColumnConstraints {
            referenced_table_name: Some("test_parent".to_string()),
            referenced_column_names: Some("id".to_string()),
            ..Default::default()
        };
        assert_eq!(
            constraints.reference_target(),
            Some(("test_parent".to_string(), "id".to_string()))
        );
        assert_eq!(ColumnConstraints::default().reference_target(), None);
    }

    #[test]
    fn test_drop_column_falls_back_to_single_name() {
        let single = DropColumnChange { column_name: Some("email".to_string()), columns: vec![] };
        assert_eq!(single.column_names(), vec!["email"]);

        let multiple = DropColumnChange {
            column_name: Some("ignored".to_string()),
            columns: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(multiple.column_names(), vec!["a", "b"]);
    }
}
