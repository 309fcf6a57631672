//! Tool command line construction
//!
//! Argument order is fixed: program, option tokens, `--recursion-method=none`,
//! `--alter=<clauses>`, `--password=<pwd>`, `--execute` and the DSN
//! `h=<host>,P=<port>,u=<user>,D=<database>,t=<table>`.

use super::tokenize::tokenize;
use crate::config::ToolSettings;
use crate::connection::ConnectionParams;
use std::fmt;

const MASKED_PASSWORD: &str = "***";

/// A fully resolved tool run against one table
#[derive(Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    /// Tokenized options of the winning option layer
    pub options: Vec<String>,
    pub alter: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
    pub table: String,
    /// Run with `PTDEBUG=1`
    pub debug: bool,
}

impl ToolInvocation {
    fn dsn(&self) -> String {
        format!(
            "h={},P={},u={},D={},t={}",
            self.host, self.port, self.user, self.database, self.table
        )
    }

    /// Argument vector, program first
    pub fn build_command(&self) -> Vec<String> {
        let mut command = Vec::with_capacity(self.options.len() + 6);
        command.push(self.program.clone());
        command.extend(self.options.iter().cloned());
        command.push("--recursion-method=none".to_string());
        command.push(format!("--alter={}", self.alter));
        if let Some(password) = &self.password {
            command.push(format!("--password={}", password));
        }
        command.push("--execute".to_string());
        command.push(self.dsn());
        command
    }

    /// Human readable command with the password masked.
    ///
    /// This is the only form of the command that may be logged or printed.
    pub fn display_command(&self) -> String {
        let mut parts = Vec::with_capacity(self.options.len() + 6);
        parts.push(self.program.clone());
        parts.extend(self.options.iter().cloned());
        parts.push("--recursion-method=none".to_string());
        parts.push(format!("--alter=\"{}\"", self.alter));
        if self.password.is_some() {
            parts.push(format!("--password={}", MASKED_PASSWORD));
        }
        parts.push("--execute".to_string());
        parts.push(self.dsn());
        parts.join(" ")
    }
}

impl fmt::Debug for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolInvocation")
            .field("program", &self.program)
            .field("options", &self.options)
            .field("alter", &self.alter)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| MASKED_PASSWORD))
            .field("database", &self.database)
            .field("table", &self.table)
            .field("debug", &self.debug)
            .finish()
    }
}

/// Builds invocations from the tool settings and the target connection
pub struct CommandLineBuilder<'a> {
    settings: &'a ToolSettings,
    connection: &'a ConnectionParams,
}

impl<'a> CommandLineBuilder<'a> {
    pub fn new(settings: &'a ToolSettings, connection: &'a ConnectionParams) -> Self {
        Self { settings, connection }
    }

    /// Option string of the winning layer.
    ///
    /// A per-change override wins even when empty, then the global setting,
    /// then the built-in default.
    pub fn effective_options<'b>(&'b self, change_options: Option<&'b str>) -> &'b str {
        change_options.unwrap_or_else(|| self.settings.global_options())
    }

    pub fn build(
        &self,
        database: &str,
        table: &str,
        change_options: Option<&str>,
        alter: impl Into<String>,
    ) -> ToolInvocation {
        ToolInvocation {
            program: self.settings.tool_program().to_string_lossy().into_owned(),
            options: tokenize(self.effective_options(change_options)),
            alter: alter.into(),
            host: self.connection.host.clone(),
            port: self.connection.port,
            user: self.connection.user.clone(),
            password: self.settings.password.clone().filter(|p| !p.is_empty()),
            database: database.to_string(),
            table: table.to_string(),
            debug: self.settings.debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ALTER: &str = "ADD COLUMN new_column INT NULL";

    fn settings(options: Option<&str>) -> ToolSettings {
        ToolSettings {
            options: options.map(str::to_string),
            password: Some("root".to_string()),
            ..Default::default()
        }
    }

    fn connection() -> ConnectionParams {
        ConnectionParams::new("localhost", 3306, "user", "testdb")
    }

    fn command(settings: &ToolSettings, change_options: Option<&str>, alter: &str) -> String {
        let connection = connection();
        let invocation =
            CommandLineBuilder::new(settings, &connection).build("testdb", "person", change_options, alter);
        format!("[{}]", invocation.build_command().join(", "))
    }

    #[test]
    fn test_build_command_with_default_options() {
        assert_eq!(
            command(&settings(None), None, ALTER),
            "[mariadb-schema-change, --alter-foreign-keys-method=auto, --nocheck-unique-key-change, --recursion-method=none, --alter=ADD COLUMN new_column INT NULL, --password=root, --execute, h=localhost,P=3306,u=user,D=testdb,t=person]"
        );
    }

    #[test]
    fn test_display_command_masks_password() {
        let settings = settings(None);
        let connection = connection();
        let invocation = CommandLineBuilder::new(&settings, &connection).build("testdb", "person", None, ALTER);
        assert_eq!(
            invocation.display_command(),
            "mariadb-schema-change --alter-foreign-keys-method=auto --nocheck-unique-key-change --recursion-method=none --alter=\"ADD COLUMN new_column INT NULL\" --password=*** --execute h=localhost,P=3306,u=user,D=testdb,t=person"
        );
    }

    #[test]
    fn test_display_never_contains_password() {
        let connection = connection();
        for password in ["root", "s3cr3t!", "person", "a b"] {
            let settings = ToolSettings { password: Some(password.to_string()), ..Default::default() };
            let invocation =
                CommandLineBuilder::new(&settings, &connection).build("testdb", "accounts", None, "DROP INDEX idx");
            assert!(invocation.build_command().contains(&format!("--password={}", password)));
            assert!(!invocation.display_command().contains(password));
        }
    }

    #[test]
    fn test_debug_output_masks_password() {
        let settings = ToolSettings { password: Some("s3cr3t!".to_string()), ..Default::default() };
        let connection = connection();
        let invocation = CommandLineBuilder::new(&settings, &connection).build("testdb", "person", None, ALTER);

        let debug = format!("{:?}", invocation);
        assert!(!debug.contains("s3cr3t!"));
        assert!(debug.contains(r#"password: Some("***")"#));
    }

    #[test]
    fn test_per_change_options_win() {
        assert_eq!(
            command(&settings(Some("--config /tmp/percona.conf")), Some("--per-change-option"), ALTER),
            "[mariadb-schema-change, --per-change-option, --recursion-method=none, --alter=ADD COLUMN new_column INT NULL, --password=root, --execute, h=localhost,P=3306,u=user,D=testdb,t=person]"
        );
        assert_eq!(
            command(&settings(None), Some(""), ALTER),
            "[mariadb-schema-change, --recursion-method=none, --alter=ADD COLUMN new_column INT NULL, --password=root, --execute, h=localhost,P=3306,u=user,D=testdb,t=person]"
        );
    }

    #[test]
    fn test_multi_clause_alter_is_one_argument() {
        assert_eq!(
            command(&settings(None), None, "ADD COLUMN new_column INT NULL, ADD COLUMN email VARCHAR(255) NULL"),
            "[mariadb-schema-change, --alter-foreign-keys-method=auto, --nocheck-unique-key-change, --recursion-method=none, --alter=ADD COLUMN new_column INT NULL, ADD COLUMN email VARCHAR(255) NULL, --password=root, --execute, h=localhost,P=3306,u=user,D=testdb,t=person]"
        );
    }

    #[test]
    fn test_global_options() {
        let cases = [
            (
                "--config /tmp/percona.conf",
                "--config, /tmp/percona.conf",
            ),
            (
                "--config /tmp/percona.conf --alter-foreign-keys-method=auto",
                "--config, /tmp/percona.conf, --alter-foreign-keys-method=auto",
            ),
            (
                r#"--config "/tmp/file with spaces.conf""#,
                "--config, /tmp/file with spaces.conf",
            ),
            (r#"--config "/tmp/percona.conf""#, "--config, /tmp/percona.conf"),
            (
                r#"--critical-load="Threads_running=160" --alter-foreign-keys-method="auto""#,
                "--critical-load=Threads_running=160, --alter-foreign-keys-method=auto",
            ),
            (
                r#"--arg1="val1 val2" --alter-foreign-keys-method="auto""#,
                "--arg1=val1 val2, --alter-foreign-keys-method=auto",
            ),
        ];

        for (options, expected_tokens) in cases {
            assert_eq!(
                command(&settings(Some(options)), None, ALTER),
                format!(
                    "[mariadb-schema-change, {}, --recursion-method=none, --alter=ADD COLUMN new_column INT NULL, --password=root, --execute, h=localhost,P=3306,u=user,D=testdb,t=person]",
                    expected_tokens
                )
            );
        }
    }

    #[test]
    fn test_missing_password_is_omitted() {
        let settings = ToolSettings::default();
        let connection = connection();
        let invocation = CommandLineBuilder::new(&settings, &connection).build("testdb", "person", None, ALTER);
        assert!(!invocation.build_command().iter().any(|t| t.starts_with("--password")));
        assert!(!invocation.display_command().contains("--password"));
    }

    #[test]
    fn test_tool_path_prefixes_program() {
        let settings = ToolSettings { path: "/opt/mariadb/bin".to_string(), ..Default::default() };
        let connection = connection();
        let invocation = CommandLineBuilder::new(&settings, &connection).build("testdb", "person", None, ALTER);
        assert_eq!(invocation.program, "/opt/mariadb/bin/mariadb-schema-change");
    }
}
