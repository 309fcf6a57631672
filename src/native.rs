//! Native DDL generator
//!
//! Generates the direct MySQL/MariaDB statements for a change. These run when
//! the tool is not used and are shown next to the tool command in previews.

use crate::change::{ChangeKind, ChangeRequest};
use crate::dialect::Dialect;
use crate::fragment::{add_column_clauses, foreign_key_clause, index_column_list, unique_clause};
use crate::routing::NativeStatement;

pub struct NativeGenerator<'a> {
    dialect: &'a dyn Dialect,
}

impl<'a> NativeGenerator<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self { dialect }
    }

    /// Generate the direct statements for a single change
    pub fn generate(&self, change: &ChangeRequest) -> Vec<NativeStatement> {
        vec![NativeStatement::new(self.change_to_sql(change))]
    }

    fn change_to_sql(&self, change: &ChangeRequest) -> String {
        let dialect = self.dialect;
        let table = dialect.escape_table_name(change.table.catalog.as_deref(), &change.table.table);

        match &change.change {
            ChangeKind::AddColumn(c) => {
                self.alter_table(&table, add_column_clauses(c, &change.table, dialect, false))
            }
            ChangeKind::DropColumn(c) => self.alter_table(
                &table,
                c.column_names()
                    .into_iter()
                    .map(|name| format!("DROP COLUMN {}", dialect.escape_column_name(name)))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            ChangeKind::AddPrimaryKey(c) => self.alter_table(
                &table,
                format!("ADD PRIMARY KEY ({})", dialect.escape_column_name_list(&c.column_names)),
            ),
            ChangeKind::AddUniqueConstraint(c) => self.alter_table(
                &table,
                unique_clause(c.constraint_name.as_deref(), &c.column_names, dialect),
            ),
            ChangeKind::DropUniqueConstraint(c) => self.alter_table(
                &table,
                format!("DROP KEY {}", dialect.escape_constraint_name(&c.constraint_name)),
            ),
            ChangeKind::AddForeignKeyConstraint(c) => {
                self.alter_table(&table, foreign_key_clause(c, &change.table, dialect, false))
            }
            ChangeKind::DropForeignKeyConstraint(c) => self.alter_table(
                &table,
                format!("DROP FOREIGN KEY {}", dialect.escape_constraint_name(&c.constraint_name)),
            ),
            ChangeKind::CreateIndex(c) => {
                let unique = if c.unique { "UNIQUE " } else { "" };
                match &c.index_name {
                    Some(name) => format!(
                        "CREATE {}INDEX {} ON {} ({})",
                        unique,
                        dialect.escape_index_name(name),
                        table,
                        index_column_list(c, dialect)
                    ),
                    // MySQL requires a name for CREATE INDEX
                    None => self.alter_table(
                        &table,
                        format!("ADD {}INDEX ({})", unique, index_column_list(c, dialect)),
                    ),
                }
            }
            ChangeKind::DropIndex(c) => {
                format!("DROP INDEX {} ON {}", dialect.escape_index_name(&c.index_name), table)
            }
            ChangeKind::ModifyDataType(c) => self.alter_table(
                &table,
                format!(
                    "MODIFY {} {}",
                    dialect.escape_column_name(&c.column_name),
                    dialect.resolve_data_type(&c.new_data_type)
                ),
            ),
        }
    }

    fn alter_table(&self, table: &str, clauses: String) -> String {
        format!("ALTER TABLE {} {}", table, clauses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{
        AddColumnChange, AddForeignKeyConstraintChange, AddPrimaryKeyChange, ColumnConstraints,
        ColumnSpec, CreateIndexChange, DropIndexChange, IndexColumn, TableRef,
    };
    use crate::dialect::MysqlDialect;
    use pretty_assertions::assert_eq;

    fn sql(kind: ChangeKind) -> String {
        let change = ChangeRequest::new(TableRef::in_catalog("testdb", "person"), kind);
        let statements = NativeGenerator::new(&MysqlDialect).generate(&change);
        assert_eq!(statements.len(), 1);
        statements[0].sql.clone()
    }

    #[test]
    fn test_add_column_keeps_real_table_for_self_reference() {
        let mut column = ColumnSpec::new("parent_id", "INT");
        column.constraints = ColumnConstraints {
            foreign_key_name: Some("fk_parent".to_string()),
            references: Some("person(id)".to_string()),
            ..Default::default()
        };
        assert_eq!(
            sql(ChangeKind::AddColumn(AddColumnChange { columns: vec![column] })),
            "ALTER TABLE testdb.person ADD COLUMN parent_id INT NULL, ADD CONSTRAINT fk_parent FOREIGN KEY (parent_id) REFERENCES person(id)"
        );
    }

    #[test]
    fn test_primary_key_is_never_dropped() {
        assert_eq!(
            sql(ChangeKind::AddPrimaryKey(AddPrimaryKeyChange {
                column_names: vec!["id".to_string()],
                constraint_name: None,
            })),
            "ALTER TABLE testdb.person ADD PRIMARY KEY (id)"
        );
    }

    #[test]
    fn test_foreign_key_self_reference() {
        assert_eq!(
            sql(ChangeKind::AddForeignKeyConstraint(AddForeignKeyConstraintChange {
                constraint_name: Some("fk_parent".to_string()),
                base_column_names: vec!["parent_id".to_string()],
                referenced_table: TableRef::new("person"),
                referenced_column_names: vec!["id".to_string()],
                on_delete: Some("SET NULL".to_string()),
                on_update: None,
                deferrable: false,
                initially_deferred: false,
            })),
            "ALTER TABLE testdb.person ADD CONSTRAINT fk_parent FOREIGN KEY (parent_id) REFERENCES person(id) ON DELETE SET NULL"
        );
    }

    #[test]
    fn test_index_statements() {
        assert_eq!(
            sql(ChangeKind::CreateIndex(CreateIndexChange {
                index_name: Some("idx_email".to_string()),
                unique: true,
                columns: vec![IndexColumn::new("email")],
            })),
            "CREATE UNIQUE INDEX idx_email ON testdb.person (email)"
        );
        assert_eq!(
            sql(ChangeKind::CreateIndex(CreateIndexChange {
                index_name: None,
                unique: false,
                columns: vec![IndexColumn::new("email")],
            })),
            "ALTER TABLE testdb.person ADD INDEX (email)"
        );
        assert_eq!(
            sql(ChangeKind::DropIndex(DropIndexChange { index_name: "idx_email".to_string() })),
            "DROP INDEX idx_email ON testdb.person"
        );
    }
}
