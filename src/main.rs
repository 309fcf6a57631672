//! osc-migrate - online schema changes for MySQL/MariaDB
//!
//! Reads a JSON list of change requests and routes each one through
//! `mariadb-schema-change` or plain DDL. Without `--execute` the routed
//! statements are only printed.

use anyhow::Context;
use clap::Parser;
use osc_migrate::catalog::StaticCatalog;
use osc_migrate::connection::ConnectionParams;
use osc_migrate::constraints::ConstraintNameResolver;
use osc_migrate::dialect::MysqlDialect;
use osc_migrate::tool::{execute_invocation, NoKeepAlive, ToolAvailability};
use osc_migrate::{
    ensure_tool_only, plan_changes, ChangeRequest, ExecutorKind, RoutingContext, Settings, Statement,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "osc-migrate")]
#[command(about = "Route MySQL/MariaDB DDL through mariadb-schema-change")]
#[command(version)]
struct Cli {
    /// JSON file containing an array of change requests
    changes: PathBuf,

    /// Route the inverse of each change, last change first
    #[arg(long)]
    rollback: bool,

    /// Run the tool instead of printing a preview
    #[arg(long)]
    execute: bool,

    /// JSON catalog snapshot with primary and foreign keys per table
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Connection URL, overrides DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let settings = Settings::load()?;
    info!("Configuration loaded");

    let connection = match &cli.database_url {
        Some(url) => ConnectionParams::from_connection_string(url)?,
        None => settings
            .connection
            .clone()
            .context("DATABASE_URL must be set or --database-url given")?,
    };
    info!("Target: {}", connection.to_display_string());

    let raw = std::fs::read_to_string(&cli.changes)
        .with_context(|| format!("Failed to read {}", cli.changes.display()))?;
    let changes: Vec<ChangeRequest> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid change list in {}", cli.changes.display()))?;

    let (catalog, constraints) = match &cli.catalog {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let catalog: StaticCatalog = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid catalog in {}", path.display()))?;
            (catalog, ConstraintNameResolver::new())
        }
        // Nothing to look up, so constraint names follow the rename rule alone
        None => (StaticCatalog::new(), ConstraintNameResolver::disabled()),
    };

    let availability = ToolAvailability::for_program(settings.tool.tool_program());
    let dialect = MysqlDialect::new();
    let ctx = RoutingContext {
        settings: &settings.tool,
        availability: &availability,
        connection: &connection,
        executor: if cli.execute { ExecutorKind::Live } else { ExecutorKind::Preview },
        dialect: &dialect,
        catalog: &catalog,
        constraints: &constraints,
    };

    // Everything is routed before the first tool run starts
    let plan = plan_changes(&changes, cli.rollback, &ctx).inspect_err(|e| e.log())?;
    if cli.execute {
        ensure_tool_only(&plan).inspect_err(|e| e.log())?;
    }

    for routed in plan {
        for statement in routed.statements {
            match statement {
                Statement::Invocation(invocation) if cli.execute => {
                    let outcome = execute_invocation(&invocation, &settings.tool, &NoKeepAlive)
                        .await
                        .inspect_err(|e| e.log())?;
                    println!("{}", outcome.stdout.trim_end());
                }
                other => println!("{}", other),
            }
        }
    }

    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,osc_migrate=debug"));

    // Logs go to stderr so printed statements stay clean on stdout
    let registry = tracing_subscriber::registry().with(env_filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    }
}
