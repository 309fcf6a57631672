//! Error handling module
//!
//! Provides the unified error type for routing and executing online schema changes.

use thiserror::Error;
use tracing::error;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum OscError {
    /// Fatal: the run must not continue with the current configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    #[error("No database password configured; set MARIADB_TOOLS_PASSWORD to run {tool}")]
    MissingPassword { tool: String },

    #[error("Failed to start {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}\nstdout:\n{stdout}\nstderr:\n{stderr}")]
    Execution {
        command: String,
        status: String,
        stdout: String,
        stderr: String,
    },

    #[error("Catalog lookup failed: {0}")]
    Catalog(String),

    /// Fatal: live runs only execute tool invocations
    #[error("Refusing to execute, these changes would need direct DDL: {changes}")]
    NativeFallback { changes: String },
}

impl OscError {
    /// True for errors that abort the whole migration run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            OscError::Config(_) | OscError::MissingPassword { .. } | OscError::NativeFallback { .. }
        )
    }

    /// Log the error once at the boundary where it surfaces
    pub fn log(&self) {
        match self {
            OscError::Execution { command, status, stderr, .. } => {
                error!("Tool execution failed ({}): {} - {}", status, command, stderr.trim());
            }
            other => error!("{}", other),
        }
    }
}

/// Result type alias for the crate
pub type OscResult<T> = Result<T, OscError>;

/// Helper function to create a configuration error
pub fn config_error(msg: impl Into<String>) -> OscError {
    OscError::Config(msg.into())
}

/// Helper function to create a catalog error
pub fn catalog_error(msg: impl Into<String>) -> OscError {
    OscError::Catalog(msg.into())
}
