//! Application configuration module
//!
//! Loads the process-wide tool settings from an optional `osc.toml`, the
//! environment (`MARIADB_TOOLS_*`) and a `.env` file.

use crate::connection::ConnectionParams;
use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Options passed to the tool when neither the global nor the per-change override is set
pub const DEFAULT_TOOL_OPTIONS: &str = "--alter-foreign-keys-method=auto --nocheck-unique-key-change";

/// Executable name of the online schema change tool
pub const TOOL_NAME: &str = "mariadb-schema-change";

const ENV_PREFIX: &str = "MARIADB_TOOLS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration sources: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Settings controlling how changes are routed through the tool
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Abort the run when the tool is required but missing
    pub fail_if_missing: bool,
    /// In preview mode, print only the tool command, not the native DDL
    pub no_alter_sql_dry_mode: bool,
    /// Comma separated change kind names that never use the tool
    pub skip_changes: String,
    /// Global option override; `None` means [`DEFAULT_TOOL_OPTIONS`]
    pub options: Option<String>,
    /// Value used by changes that inherit the tool flag
    pub default_on: bool,
    pub password: Option<String>,
    /// Directory containing the tool; empty uses `PATH`
    pub path: String,
    /// Runs the tool with `PTDEBUG=1`
    pub debug: bool,
    pub keep_alive: bool,
    pub keep_alive_interval_secs: u64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            fail_if_missing: false,
            no_alter_sql_dry_mode: false,
            skip_changes: String::new(),
            options: None,
            default_on: true,
            password: None,
            path: String::new(),
            debug: false,
            keep_alive: true,
            keep_alive_interval_secs: 30,
        }
    }
}

impl std::fmt::Debug for ToolSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSettings")
            .field("fail_if_missing", &self.fail_if_missing)
            .field("no_alter_sql_dry_mode", &self.no_alter_sql_dry_mode)
            .field("skip_changes", &self.skip_changes)
            .field("options", &self.options)
            .field("default_on", &self.default_on)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("path", &self.path)
            .field("debug", &self.debug)
            .field("keep_alive", &self.keep_alive)
            .field("keep_alive_interval_secs", &self.keep_alive_interval_secs)
            .finish()
    }
}

impl ToolSettings {
    /// Build settings from a prepared source builder
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: ToolSettings = builder.build()?.try_deserialize()?;
        if settings.keep_alive && settings.keep_alive_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "keep_alive_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(settings)
    }

    /// Whether the given change kind is listed in `skip_changes`
    pub fn skips(&self, change_name: &str) -> bool {
        self.skip_changes
            .split(',')
            .map(str::trim)
            .any(|name| !name.is_empty() && name == change_name)
    }

    /// Option string of the global layer (override or built-in default)
    pub fn global_options(&self) -> &str {
        self.options.as_deref().unwrap_or(DEFAULT_TOOL_OPTIONS)
    }

    /// Program to launch, honouring the configured tool directory
    pub fn tool_program(&self) -> PathBuf {
        if self.path.trim().is_empty() {
            PathBuf::from(TOOL_NAME)
        } else {
            PathBuf::from(self.path.trim()).join(TOOL_NAME)
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub tool: ToolSettings,
    /// Target connection from `DATABASE_URL`, if set
    pub connection: Option<ConnectionParams>,
}

impl Settings {
    /// Load settings from `osc.toml`, environment variables and `.env`
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        let builder = config::Config::builder()
            .add_source(config::File::with_name("osc").required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));
        let tool = ToolSettings::from_builder(builder)?;

        let connection = match std::env::var("DATABASE_URL") {
            Ok(url) => Some(
                ConnectionParams::from_connection_string(&url)
                    .map_err(|e| ConfigError::InvalidValue(e.to_string()))?,
            ),
            Err(_) => None,
        };

        Ok(Self { tool, connection })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn from_toml(toml: &str) -> Result<ToolSettings, ConfigError> {
        ToolSettings::from_builder(
            config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
        )
    }

    #[test]
    fn test_default_tool_settings() {
        let settings = from_toml("").unwrap();
        assert!(!settings.fail_if_missing);
        assert!(!settings.no_alter_sql_dry_mode);
        assert!(settings.default_on);
        assert!(settings.keep_alive);
        assert_eq!(settings.global_options(), DEFAULT_TOOL_OPTIONS);
        assert_eq!(settings.tool_program(), PathBuf::from("mariadb-schema-change"));
    }

    #[test]
    fn test_overrides_from_file() {
        let settings = from_toml(
            r#"
            fail_if_missing = true
            default_on = false
            options = "--config /tmp/percona.conf"
            path = "/opt/mariadb-tools/bin"
            password = "root"
            "#,
        )
        .unwrap();
        assert!(settings.fail_if_missing);
        assert!(!settings.default_on);
        assert_eq!(settings.global_options(), "--config /tmp/percona.conf");
        assert_eq!(settings.password.as_deref(), Some("root"));
        assert_eq!(
            settings.tool_program(),
            PathBuf::from("/opt/mariadb-tools/bin/mariadb-schema-change")
        );
    }

    #[test]
    fn test_skip_changes_matches_whole_names() {
        let settings = from_toml(r#"skip_changes = "addColumn, dropIndex""#).unwrap();
        assert!(settings.skips("addColumn"));
        assert!(settings.skips("dropIndex"));
        assert!(!settings.skips("createIndex"));
        assert!(!settings.skips("add"));
        assert!(!ToolSettings::default().skips(""));
    }

    #[test]
    fn test_debug_output_masks_password() {
        let settings = from_toml(r#"password = "hunter2""#).unwrap();
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains(r#"password: Some("***")"#));
    }

    #[test]
    fn test_zero_keep_alive_interval_rejected() {
        let result = from_toml("keep_alive_interval_secs = 0");
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }
}
