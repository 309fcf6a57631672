//! SQL dialect abstraction
//!
//! Identifier escaping, literal quoting and type resolution used when rendering
//! ALTER fragments and native DDL. Implementations are strategies selected by the caller.

mod mysql;

pub use mysql::MysqlDialect;

/// Dialect-specific SQL rendering.
pub trait Dialect: Send + Sync {
    /// Escape a single object name, quoting only when required.
    fn escape_object_name(&self, name: &str) -> String;

    /// Render a string literal.
    fn quote_literal(&self, value: &str) -> String;

    /// Map a declared column type to the database type.
    fn resolve_data_type(&self, declared: &str) -> String;

    fn escape_column_name(&self, name: &str) -> String {
        self.escape_object_name(name)
    }

    /// Escape each column of a list and join them with `, `.
    fn escape_column_name_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.escape_column_name(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Escape a table name, qualified with its catalog when given.
    fn escape_table_name(&self, catalog: Option<&str>, table: &str) -> String {
        match catalog.filter(|c| !c.is_empty()) {
            Some(catalog) => format!(
                "{}.{}",
                self.escape_object_name(catalog),
                self.escape_object_name(table)
            ),
            None => self.escape_object_name(table),
        }
    }

    fn escape_constraint_name(&self, name: &str) -> String {
        self.escape_object_name(name)
    }

    fn escape_index_name(&self, name: &str) -> String {
        self.escape_object_name(name)
    }
}
