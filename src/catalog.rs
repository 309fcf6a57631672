//! Catalog metadata lookups
//!
//! The routing core only needs two facts about the live schema: whether a
//! table already has a primary key, and which foreign keys it carries.

use crate::change::TableRef;
use crate::error::OscResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Read access to live schema metadata.
pub trait Catalog: Send + Sync {
    fn has_primary_key(&self, table: &TableRef) -> OscResult<bool>;

    /// Names of the foreign key constraints defined on `table`
    fn foreign_key_names(&self, table: &TableRef) -> OscResult<Vec<String>>;
}

/// Metadata of one table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMetadata {
    #[serde(default)]
    pub primary_key: Option<Vec<String>>,
    #[serde(default)]
    pub foreign_keys: Vec<String>,
}

/// In-memory catalog, keyed by table name.
///
/// Used for offline planning and tests; unknown tables have no keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticCatalog {
    tables: HashMap<String, TableMetadata>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(table: &str) -> String {
        table.to_ascii_lowercase()
    }

    pub fn with_primary_key(mut self, table: &str, columns: &[&str]) -> Self {
        self.tables.entry(Self::key(table)).or_default().primary_key =
            Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn with_foreign_key(mut self, table: &str, constraint_name: &str) -> Self {
        self.tables
            .entry(Self::key(table))
            .or_default()
            .foreign_keys
            .push(constraint_name.to_string());
        self
    }

    pub fn table(&self, table: &TableRef) -> Option<&TableMetadata> {
        self.tables.get(&Self::key(&table.table))
    }
}

impl Catalog for StaticCatalog {
    fn has_primary_key(&self, table: &TableRef) -> OscResult<bool> {
        Ok(self
            .table(table)
            .and_then(|t| t.primary_key.as_ref())
            .is_some_and(|pk| !pk.is_empty()))
    }

    fn foreign_key_names(&self, table: &TableRef) -> OscResult<Vec<String>> {
        Ok(self.table(table).map(|t| t.foreign_keys.clone()).unwrap_or_default())
    }
}
