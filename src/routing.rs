//! Change routing
//!
//! Decides per change whether it runs through the tool, as native DDL, or as
//! preview comments. Rules are checked in order and the first match wins:
//!
//! 1. kind listed in `skip_changes`: native statements
//! 2. tool flag resolved against `default_on`; disabled: native statements
//! 3. tool unavailable: configuration error with `fail_if_missing`, else native statements
//! 4. preview: masked command comment, explanation and the native statements,
//!    or the command comment alone with `no_alter_sql_dry_mode`
//! 5. live: a single tool invocation

use crate::catalog::Catalog;
use crate::change::{ChangeRequest, ToolRoutable};
use crate::config::{ToolSettings, TOOL_NAME};
use crate::connection::ConnectionParams;
use crate::constraints::ConstraintNameResolver;
use crate::dialect::Dialect;
use crate::error::{config_error, OscError, OscResult};
use crate::fragment::FragmentContext;
use crate::native::NativeGenerator;
use crate::tool::{CommandLineBuilder, ToolAvailability, ToolInvocation};
use std::fmt;
use tracing::{debug, info, warn};

/// A direct DDL statement executed by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeStatement {
    pub sql: String,
}

impl NativeStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }
}

/// One element of a routed change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Spawns the tool when executed
    Invocation(ToolInvocation),
    Native(NativeStatement),
    /// Preview annotation, never executed
    Comment(String),
}

impl Statement {
    pub fn is_comment(&self) -> bool {
        matches!(self, Statement::Comment(_))
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Invocation(invocation) => write!(f, "{}", invocation.display_command()),
            Statement::Native(native) => write!(f, "{};", native.sql),
            Statement::Comment(text) => write!(f, "-- {}", text),
        }
    }
}

/// Kind of executor the statements are produced for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutorKind {
    /// Statements are applied to the database
    #[default]
    Live,
    /// Statements are only printed (dry run)
    Preview,
}

/// Everything routing needs besides the change itself
#[derive(Clone, Copy)]
pub struct RoutingContext<'a> {
    pub settings: &'a ToolSettings,
    pub availability: &'a ToolAvailability,
    pub connection: &'a ConnectionParams,
    pub executor: ExecutorKind,
    pub dialect: &'a dyn Dialect,
    pub catalog: &'a dyn Catalog,
    pub constraints: &'a ConstraintNameResolver,
}

impl<'a> RoutingContext<'a> {
    pub fn fragment_context(&self) -> FragmentContext<'a> {
        FragmentContext {
            dialect: self.dialect,
            catalog: self.catalog,
            constraints: self.constraints,
        }
    }
}

/// Route a change given its native statements
pub fn route<C: ToolRoutable + ?Sized>(
    change: &C,
    native: Vec<NativeStatement>,
    ctx: &RoutingContext<'_>,
) -> OscResult<Vec<Statement>> {
    let settings = ctx.settings;
    let name = change.change_name();
    let natives = || native.iter().cloned().map(Statement::Native).collect::<Vec<_>>();

    if settings.skips(name) {
        debug!("{} is listed in skip_changes, not using {}", name, TOOL_NAME);
        return Ok(natives());
    }

    if !change.tool_usage().resolve(settings.default_on) {
        debug!("{} on {} does not use {}", name, change.target_table(), TOOL_NAME);
        return Ok(natives());
    }

    if !ctx.availability.is_available() {
        if settings.fail_if_missing {
            return Err(config_error(format!(
                "{} is not installed or not on the PATH, but fail_if_missing is set",
                TOOL_NAME
            )));
        }
        info!("{} is not available, applying {} directly", TOOL_NAME, name);
        return Ok(natives());
    }

    let alter = change.alter_fragment(&ctx.fragment_context())?;
    let database = change.target_database().unwrap_or(&ctx.connection.database);
    let invocation = CommandLineBuilder::new(settings, ctx.connection).build(
        database,
        change.target_table(),
        change.tool_options(),
        alter,
    );

    match ctx.executor {
        ExecutorKind::Preview if settings.no_alter_sql_dry_mode => {
            Ok(vec![Statement::Comment(invocation.display_command())])
        }
        ExecutorKind::Preview => {
            let mut statements = Vec::with_capacity(native.len() + 2);
            statements.push(Statement::Comment(invocation.display_command()));
            statements.push(Statement::Comment(format!(
                "Instead of the following statements, {} will be used",
                TOOL_NAME
            )));
            statements.extend(natives());
            Ok(statements)
        }
        ExecutorKind::Live => {
            info!("{} on {} will use {}", name, change.target_table(), TOOL_NAME);
            Ok(vec![Statement::Invocation(invocation)])
        }
    }
}

/// Route a change, generating its native statements with the context's dialect
pub fn route_change(change: &ChangeRequest, ctx: &RoutingContext<'_>) -> OscResult<Vec<Statement>> {
    let native = NativeGenerator::new(ctx.dialect).generate(change);
    route(change, native, ctx)
}

/// Route the inverse of a change; `None` when the change cannot be rolled back
pub fn route_rollback(
    change: &ChangeRequest,
    ctx: &RoutingContext<'_>,
) -> Option<OscResult<Vec<Statement>>> {
    change.inverse().map(|inverse| route_change(&inverse, ctx))
}

/// Statements routed for one change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedChange {
    pub change_name: &'static str,
    pub table: String,
    pub statements: Vec<Statement>,
}

impl RoutedChange {
    pub fn has_native(&self) -> bool {
        self.statements.iter().any(|s| matches!(s, Statement::Native(_)))
    }
}

/// Route a list of changes in order.
///
/// For rollback the inverses are routed last change first, and changes
/// without an inverse are skipped.
pub fn plan_changes(
    changes: &[ChangeRequest],
    rollback: bool,
    ctx: &RoutingContext<'_>,
) -> OscResult<Vec<RoutedChange>> {
    let ordered: Vec<&ChangeRequest> = if rollback {
        changes.iter().rev().collect()
    } else {
        changes.iter().collect()
    };

    let mut plan = Vec::with_capacity(ordered.len());
    for change in ordered {
        let statements = if rollback {
            match route_rollback(change, ctx) {
                Some(routed) => routed?,
                None => {
                    warn!(
                        "{} on {} cannot be rolled back, skipping",
                        change.change_name(),
                        change.target_table()
                    );
                    continue;
                }
            }
        } else {
            route_change(change, ctx)?
        };

        plan.push(RoutedChange {
            change_name: change.change_name(),
            table: change.target_table().to_string(),
            statements,
        });
    }
    Ok(plan)
}

/// Refuse a live plan that still needs direct DDL.
///
/// Only tool invocations are executed, so running a plan with native
/// statements would apply later tool changes on top of missing ones.
pub fn ensure_tool_only(plan: &[RoutedChange]) -> OscResult<()> {
    let native: Vec<String> = plan
        .iter()
        .filter(|routed| routed.has_native())
        .map(|routed| format!("{} on {}", routed.change_name, routed.table))
        .collect();

    if native.is_empty() {
        Ok(())
    } else {
        Err(OscError::NativeFallback { changes: native.join(", ") })
    }
}
