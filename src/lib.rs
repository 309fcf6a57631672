//! osc-migrate
//!
//! Routes DDL changes on large MySQL/MariaDB tables through the online schema
//! change tool `mariadb-schema-change` instead of a blocking `ALTER TABLE`.
//!
//! - `change`: change requests and the routable capability
//! - `fragment`: ALTER clause text consumed by the tool
//! - `tool`: option tokenization, command line, availability probe, execution
//! - `constraints`: foreign key names across the tool's shadow table
//! - `routing`: the per-change decision between tool, native DDL and preview

pub mod catalog;
pub mod change;
pub mod config;
pub mod connection;
pub mod constraints;
pub mod dialect;
pub mod error;
pub mod fragment;
pub mod native;
pub mod routing;
pub mod tool;

pub use change::{ChangeKind, ChangeRequest, TableRef, ToolRoutable, ToolUsage};
pub use config::{Settings, ToolSettings};
pub use error::{OscError, OscResult};
pub use routing::{
    ensure_tool_only, plan_changes, route, route_change, route_rollback, ExecutorKind, NativeStatement,
    RoutedChange, RoutingContext, Statement,
};
