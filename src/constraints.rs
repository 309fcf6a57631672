//! Constraint name resolution around the tool's shadow table
//!
//! While the tool runs, the live table is a copy named `_<table>_new`, and with
//! `--alter-foreign-keys-method` its foreign keys are recreated under new names:
//! a name starting with `__` loses both underscores, any other name gains one.

use crate::catalog::Catalog;
use crate::change::TableRef;
use crate::error::OscResult;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Name of the shadow copy the tool builds for `table`
pub fn shadow_table_name(table: &str) -> String {
    format!("_{}_new", table)
}

/// Table to reference from a foreign key on `base_table` during a tool run.
///
/// A self reference must point at the shadow copy, which is the table being altered.
pub fn resolve_referenced_table(base_table: &str, referenced_table: &str) -> String {
    if base_table.eq_ignore_ascii_case(referenced_table) {
        shadow_table_name(referenced_table)
    } else {
        referenced_table.to_string()
    }
}

/// Name a foreign key gets after one tool run
pub fn renamed_constraint(name: &str) -> String {
    match name.strip_prefix("__") {
        Some(stripped) => stripped.to_string(),
        None => format!("_{}", name),
    }
}

/// Determines constraint names valid on the live table.
///
/// When enabled, the catalog decides which name currently exists. When
/// disabled, the rename rule is applied without any lookup and tables are
/// assumed to have no primary key.
#[derive(Debug)]
pub struct ConstraintNameResolver {
    enabled: AtomicBool,
}

impl Default for ConstraintNameResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintNameResolver {
    pub fn new() -> Self {
        Self { enabled: AtomicBool::new(true) }
    }

    pub fn disabled() -> Self {
        Self { enabled: AtomicBool::new(false) }
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// The name under which `constraint_name` must be referenced inside a tool run on `table`.
    ///
    /// The tool works on the shadow copy, whose foreign keys already carry the
    /// next name of whatever the live table currently uses.
    pub fn current_constraint_name(
        &self,
        catalog: &dyn Catalog,
        table: &TableRef,
        constraint_name: &str,
    ) -> OscResult<String> {
        if !self.is_enabled() {
            return Ok(renamed_constraint(constraint_name));
        }

        let existing = catalog.foreign_key_names(table)?;
        let once = renamed_constraint(constraint_name);
        let twice = renamed_constraint(&once);
        let live = [constraint_name, once.as_str(), twice.as_str()]
            .into_iter()
            .find(|candidate| existing.iter().any(|n| n.eq_ignore_ascii_case(candidate)));

        match live {
            Some(live) => Ok(renamed_constraint(live)),
            None => {
                debug!(
                    "Constraint {} not found on {}, applying the rename rule",
                    constraint_name, table.table
                );
                Ok(once)
            }
        }
    }

    pub fn has_primary_key(&self, catalog: &dyn Catalog, table: &TableRef) -> OscResult<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }
        catalog.has_primary_key(table)
    }
}
