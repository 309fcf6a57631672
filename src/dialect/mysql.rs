//! MySQL/MariaDB SQL dialect.

use super::Dialect;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static PLAIN_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid identifier pattern"));

/// Words that must be quoted when used as identifiers.
static RESERVED_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "ADD", "ALL", "ALTER", "AND", "AS", "ASC", "BETWEEN", "BY", "CASCADE", "CASE", "CHANGE",
        "CHECK", "COLUMN", "CONSTRAINT", "CREATE", "CROSS", "DATABASE", "DEFAULT", "DELETE", "DESC",
        "DISTINCT", "DROP", "ELSE", "EXISTS", "FOREIGN", "FROM", "GRANT", "GROUP", "HAVING", "IN",
        "INDEX", "INNER", "INSERT", "INTERVAL", "INTO", "IS", "JOIN", "KEY", "KEYS", "LEFT", "LIKE",
        "LIMIT", "LOCK", "MODIFY", "NOT", "NULL", "ON", "OR", "ORDER", "OUTER", "PRIMARY",
        "REFERENCES", "RENAME", "REPLACE", "RIGHT", "SELECT", "SET", "SHOW", "TABLE", "THEN", "TO",
        "TRIGGER", "UNION", "UNIQUE", "UPDATE", "USAGE", "USE", "USING", "VALUES", "WHEN", "WHERE",
        "WITH",
    ]
    .into_iter()
    .collect()
});

/// Integer types whose display width is dropped on resolution.
const INTEGER_TYPES: &[&str] = &["TINYINT", "SMALLINT", "MEDIUMINT", "INT", "BIGINT"];

/// MySQL/MariaDB dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    pub fn new() -> Self {
        Self
    }

    fn needs_quoting(name: &str) -> bool {
        !PLAIN_IDENTIFIER.is_match(name)
            || name.starts_with(|c: char| c.is_ascii_digit())
            || RESERVED_WORDS.contains(name.to_ascii_uppercase().as_str())
    }
}

impl Dialect for MysqlDialect {
    fn escape_object_name(&self, name: &str) -> String {
        if Self::needs_quoting(name) {
            // Backticks inside a quoted name are doubled
            format!("`{}`", name.replace('`', "``"))
        } else {
            name.to_string()
        }
    }

    fn quote_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
    }

    fn resolve_data_type(&self, declared: &str) -> String {
        let declared = declared.trim();
        let (base, params, suffix) = match (declared.find('('), declared.rfind(')')) {
            (Some(open), Some(close)) if close > open => (
                declared[..open].trim(),
                Some(declared[open + 1..close].trim()),
                declared[close + 1..].trim(),
            ),
            _ => {
                // "int unsigned" keeps its modifier without parameters
                let mut parts = declared.splitn(2, char::is_whitespace);
                (parts.next().unwrap_or(""), None, parts.next().unwrap_or("").trim())
            }
        };

        let base = base.to_ascii_uppercase();
        let mut resolved = match base.as_str() {
            "INTEGER" => "INT".to_string(),
            "BOOLEAN" | "BOOL" => "BIT(1)".to_string(),
            b if INTEGER_TYPES.contains(&b) => base.clone(),
            _ => match params {
                Some(p) if !p.is_empty() => format!("{}({})", base, p),
                _ => base.clone(),
            },
        };

        if !suffix.is_empty() {
            resolved.push(' ');
            resolved.push_str(&suffix.to_ascii_uppercase());
        }
        resolved
    }
}
