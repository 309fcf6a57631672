//! ALTER clause rendering
//!
//! Renders the text that follows `ALTER TABLE <name>` for each change kind.
//! The tool accepts a single ALTER per invocation, so multi-clause changes
//! are one comma-joined clause list. Column lists must be non-empty.

use crate::catalog::Catalog;
use crate::change::{
    AddColumnChange, AddForeignKeyConstraintChange, ChangeKind, ChangeRequest, ColumnSpec,
    CreateIndexChange, DefaultValue, IndexColumn, TableRef,
};
use crate::constraints::{resolve_referenced_table, ConstraintNameResolver};
use crate::dialect::Dialect;
use crate::error::OscResult;

/// Collaborators needed to render a fragment
#[derive(Clone, Copy)]
pub struct FragmentContext<'a> {
    pub dialect: &'a dyn Dialect,
    pub catalog: &'a dyn Catalog,
    pub constraints: &'a ConstraintNameResolver,
}

/// Render the ALTER clause the tool will apply for `change`.
pub fn alter_fragment(change: &ChangeRequest, ctx: &FragmentContext<'_>) -> OscResult<String> {
    let dialect = ctx.dialect;
    let table = &change.table;

    let alter = match &change.change {
        ChangeKind::AddColumn(c) => add_column_clauses(c, table, dialect, true),
        ChangeKind::DropColumn(c) => c
            .column_names()
            .into_iter()
            .map(|name| format!("DROP COLUMN {}", dialect.escape_column_name(name)))
            .collect::<Vec<_>>()
            .join(", "),
        ChangeKind::AddPrimaryKey(c) => {
            let add = format!("ADD PRIMARY KEY ({})", dialect.escape_column_name_list(&c.column_names));
            // Replacing a primary key has to happen in the same tool run
            if ctx.constraints.has_primary_key(ctx.catalog, table)? {
                format!("DROP PRIMARY KEY, {}", add)
            } else {
                add
            }
        }
        ChangeKind::AddUniqueConstraint(c) => {
            unique_clause(c.constraint_name.as_deref(), &c.column_names, dialect)
        }
        ChangeKind::DropUniqueConstraint(c) => {
            format!("DROP KEY {}", dialect.escape_constraint_name(&c.constraint_name))
        }
        ChangeKind::AddForeignKeyConstraint(c) => foreign_key_clause(c, table, dialect, true),
        ChangeKind::DropForeignKeyConstraint(c) => {
            let current = ctx
                .constraints
                .current_constraint_name(ctx.catalog, table, &c.constraint_name)?;
            format!("DROP FOREIGN KEY {}", dialect.escape_constraint_name(&current))
        }
        ChangeKind::CreateIndex(c) => {
            let mut alter = String::from("ADD ");
            if c.unique {
                alter.push_str("UNIQUE ");
            }
            alter.push_str("INDEX ");
            if let Some(name) = &c.index_name {
                alter.push_str(&dialect.escape_index_name(name));
                alter.push(' ');
            }
            alter.push_str(&format!("({})", index_column_list(c, dialect)));
            alter
        }
        ChangeKind::DropIndex(c) => format!("DROP INDEX {}", dialect.escape_index_name(&c.index_name)),
        ChangeKind::ModifyDataType(c) => format!(
            "MODIFY {} {}",
            dialect.escape_column_name(&c.column_name),
            dialect.resolve_data_type(&c.new_data_type)
        ),
    };

    Ok(alter)
}

/// `ADD COLUMN` clauses plus the inline constraint clauses of every column.
///
/// `during_tool_run` redirects self references to the shadow table.
pub(crate) fn add_column_clauses(
    change: &AddColumnChange,
    table: &TableRef,
    dialect: &dyn Dialect,
    during_tool_run: bool,
) -> String {
    change
        .columns
        .iter()
        .map(|column| {
            let mut clauses = vec![column_clause(column, dialect)];
            clauses.extend(column_constraint_clauses(column, table, dialect, during_tool_run));
            clauses.join(", ")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn column_clause(column: &ColumnSpec, dialect: &dyn Dialect) -> String {
    let mut sql = format!(
        "ADD COLUMN {} {}",
        dialect.escape_column_name(&column.name),
        dialect.resolve_data_type(&column.column_type)
    );

    if column.constraints.nullable == Some(false) {
        sql.push_str(" NOT NULL");
    } else {
        sql.push_str(" NULL");
    }

    if let Some(default) = &column.default_value {
        let rendered = match default {
            DefaultValue::Value(v) => dialect.quote_literal(v),
            DefaultValue::Numeric(n) => n.clone(),
            DefaultValue::Boolean(true) => "b'1'".to_string(),
            DefaultValue::Boolean(false) => "b'0'".to_string(),
            DefaultValue::Computed(expr) => expr.clone(),
        };
        sql.push_str(&format!(" DEFAULT {}", rendered));
    }

    if let Some(remarks) = column.remarks.as_deref().filter(|r| !r.is_empty()) {
        sql.push_str(&format!(" COMMENT {}", dialect.quote_literal(remarks)));
    }

    if let Some(after) = column.after_column.as_deref().filter(|a| !a.is_empty()) {
        sql.push_str(&format!(" AFTER {}", dialect.escape_column_name(after)));
    }

    sql
}

/// Foreign key then unique clause declared inline on a column.
fn column_constraint_clauses(
    column: &ColumnSpec,
    table: &TableRef,
    dialect: &dyn Dialect,
    during_tool_run: bool,
) -> Vec<String> {
    let constraints = &column.constraints;
    let mut clauses = Vec::new();

    if let Some((referenced_table, referenced_columns)) = constraints.reference_target() {
        let referenced_table = if during_tool_run {
            resolve_referenced_table(&table.table, &referenced_table)
        } else {
            referenced_table
        };
        let referenced_columns: Vec<String> = referenced_columns
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        let mut clause = String::from("ADD ");
        if let Some(name) = constraints.foreign_key_name.as_deref().filter(|n| !n.is_empty()) {
            clause.push_str(&format!("CONSTRAINT {} ", dialect.escape_constraint_name(name)));
        }
        clause.push_str(&format!(
            "FOREIGN KEY ({}) REFERENCES {}({})",
            dialect.escape_column_name(&column.name),
            dialect.escape_object_name(&referenced_table),
            dialect.escape_column_name_list(&referenced_columns)
        ));
        clauses.push(clause);
    }

    if constraints.unique {
        clauses.push(unique_clause(
            constraints.unique_constraint_name.as_deref(),
            std::slice::from_ref(&column.name),
            dialect,
        ));
    }

    clauses
}

pub(crate) fn unique_clause(name: Option<&str>, columns: &[String], dialect: &dyn Dialect) -> String {
    let mut clause = String::from("ADD ");
    if let Some(name) = name.filter(|n| !n.is_empty()) {
        clause.push_str(&format!("CONSTRAINT {} ", dialect.escape_constraint_name(name)));
    }
    clause.push_str(&format!("UNIQUE ({})", dialect.escape_column_name_list(columns)));
    clause
}

pub(crate) fn foreign_key_clause(
    change: &AddForeignKeyConstraintChange,
    table: &TableRef,
    dialect: &dyn Dialect,
    during_tool_run: bool,
) -> String {
    let mut alter = String::from("ADD ");
    if let Some(name) = change.constraint_name.as_deref().filter(|n| !n.is_empty()) {
        alter.push_str(&format!("CONSTRAINT {} ", dialect.escape_constraint_name(name)));
    }

    let referenced = &change.referenced_table;
    let referenced_name = if during_tool_run {
        resolve_referenced_table(&table.table, &referenced.table)
    } else {
        referenced.table.clone()
    };

    alter.push_str(&format!(
        "FOREIGN KEY ({}) REFERENCES {}({})",
        dialect.escape_column_name_list(&change.base_column_names),
        dialect.escape_table_name(referenced.catalog.as_deref(), &referenced_name),
        dialect.escape_column_name_list(&change.referenced_column_names)
    ));

    if let Some(on_delete) = &change.on_delete {
        alter.push_str(&format!(" ON DELETE {}", on_delete));
    }
    if let Some(on_update) = &change.on_update {
        alter.push_str(&format!(" ON UPDATE {}", on_update));
    }
    if change.deferrable {
        alter.push_str(" DEFERRABLE");
    }
    if change.initially_deferred {
        alter.push_str(" INITIALLY DEFERRED");
    }
    alter
}

pub(crate) fn index_column_list(change: &CreateIndexChange, dialect: &dyn Dialect) -> String {
    change
        .columns
        .iter()
        .map(|column| index_column(column, dialect))
        .collect::<Vec<_>>()
        .join(", ")
}

fn index_column(column: &IndexColumn, dialect: &dyn Dialect) -> String {
    if column.computed {
        return column.name.clone();
    }
    // "name(10)" indexes a prefix; only the column name is escaped
    match column.name.find('(') {
        Some(open) => format!(
            "{}{}",
            dialect.escape_column_name(&column.name[..open]),
            &column.name[open..]
        ),
        None => dialect.escape_column_name(&column.name),
    }
}
