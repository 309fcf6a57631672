//! Tool process execution
//!
//! Spawns the tool, waits for it while optionally pinging the caller's
//! connection, and reports captured output. No timeout and no retry.

use super::command::ToolInvocation;
use crate::config::{ToolSettings, TOOL_NAME};
use crate::error::{OscError, OscResult};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Liveness ping for the connection held open while the tool runs
#[allow(async_fn_in_trait)]
pub trait KeepAlive {
    async fn ping(&self) -> OscResult<()>;

    /// No connection to maintain; the ping timer is not started
    fn is_noop(&self) -> bool {
        false
    }
}

/// Keep-alive for callers without a connection to maintain
#[derive(Debug, Clone, Copy, Default)]
pub struct NoKeepAlive;

impl KeepAlive for NoKeepAlive {
    async fn ping(&self) -> OscResult<()> {
        Ok(())
    }

    fn is_noop(&self) -> bool {
        true
    }
}

/// Result of a successful tool run
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
    /// Keep-alive pings sent while waiting
    pub pings: u32,
}

/// Run the tool and wait for it to exit.
///
/// A non-zero exit becomes [`OscError::Execution`] carrying the captured output.
pub async fn execute_invocation<K: KeepAlive>(
    invocation: &ToolInvocation,
    settings: &ToolSettings,
    keep_alive: &K,
) -> OscResult<ExecutionOutcome> {
    if invocation.password.is_none() {
        return Err(OscError::MissingPassword { tool: TOOL_NAME.to_string() });
    }

    let shown_command = invocation.display_command();
    let command_line = invocation.build_command();
    let (program, args) = command_line
        .split_first()
        .ok_or_else(|| OscError::Config("Empty tool command".to_string()))?;

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if invocation.debug {
        info!("Running {} with PTDEBUG=1", TOOL_NAME);
        command.env("PTDEBUG", "1");
    }

    info!("Executing: {}", shown_command);
    let started = Instant::now();
    let mut child = command.spawn().map_err(|source| OscError::Spawn {
        command: shown_command.clone(),
        source,
    })?;

    // Pipes must be drained while waiting or a full pipe stalls the tool
    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();
    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(pipe) = stdout_pipe.as_mut() {
            if let Err(e) = pipe.read_to_end(&mut buf).await {
                warn!("Failed to read {} stdout: {}", TOOL_NAME, e);
            }
        }
        buf
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(pipe) = stderr_pipe.as_mut() {
            if let Err(e) = pipe.read_to_end(&mut buf).await {
                warn!("Failed to read {} stderr: {}", TOOL_NAME, e);
            }
        }
        buf
    });

    let mut pings = 0u32;
    let waited = if settings.keep_alive && !keep_alive.is_noop() {
        let period = Duration::from_secs(settings.keep_alive_interval_secs.max(1));
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            tokio::select! {
                status = child.wait() => break status,
                _ = ticker.tick() => {
                    pings += 1;
                    if let Err(e) = keep_alive.ping().await {
                        warn!("Keep-alive ping failed: {}", e);
                    } else {
                        debug!("Keep-alive ping {} sent", pings);
                    }
                }
            }
        }
    } else {
        child.wait().await
    };
    let status =
        waited.map_err(|source| OscError::Spawn { command: shown_command.clone(), source })?;

    // Tool output may carry table data in any encoding
    let stdout = String::from_utf8_lossy(&stdout_task.await.unwrap_or_default()).into_owned();
    let stderr = String::from_utf8_lossy(&stderr_task.await.unwrap_or_default()).into_owned();
    let elapsed = started.elapsed();

    for line in stdout.lines() {
        debug!("{}: {}", TOOL_NAME, line);
    }

    if !status.success() {
        return Err(OscError::Execution {
            command: shown_command,
            status: status.to_string(),
            stdout,
            stderr,
        });
    }

    info!("{} finished in {:.1}s", TOOL_NAME, elapsed.as_secs_f64());
    Ok(ExecutionOutcome { stdout, stderr, elapsed, pings })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn invocation(program: &str) -> ToolInvocation {
        ToolInvocation {
            program: program.to_string(),
            options: vec![],
            alter: "ADD COLUMN new_column INT NULL".to_string(),
            host: "localhost".to_string(),
            port: 3306,
            user: "user".to_string(),
            password: Some("root".to_string()),
            database: "testdb".to_string(),
            table: "person".to_string(),
            debug: false,
        }
    }

    fn quiet_settings() -> ToolSettings {
        ToolSettings { keep_alive: false, ..Default::default() }
    }

    struct FailingPing(AtomicU32);

    impl KeepAlive for FailingPing {
        async fn ping(&self) -> OscResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(OscError::Catalog("connection lost".to_string()))
        }
    }

    #[tokio::test]
    async fn test_successful_run() {
        let outcome = execute_invocation(&invocation("true"), &quiet_settings(), &NoKeepAlive)
            .await
            .unwrap();
        assert_eq!(outcome.pings, 0);
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_execution_error() {
        let err = execute_invocation(&invocation("false"), &quiet_settings(), &NoKeepAlive)
            .await
            .unwrap_err();
        match err {
            OscError::Execution { command, .. } => {
                assert!(command.contains("--password=***"));
                assert!(!command.contains("root"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let err = execute_invocation(
            &invocation("/nonexistent/mariadb-schema-change"),
            &quiet_settings(),
            &NoKeepAlive,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, OscError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_missing_password_fails_before_spawn() {
        let mut invocation = invocation("/nonexistent/mariadb-schema-change");
        invocation.password = None;
        let err = execute_invocation(&invocation, &quiet_settings(), &NoKeepAlive)
            .await
            .unwrap_err();
        assert!(matches!(err, OscError::MissingPassword { .. }));
    }

    #[tokio::test]
    async fn test_failed_run_keeps_non_utf8_output() {
        let mut invocation = invocation("sh");
        invocation.options = vec![
            "-c".to_string(),
            r"printf 'Error altering table \377 row\n'; printf 'fatal \377\n' >&2; exit 3".to_string(),
        ];
        let err = execute_invocation(&invocation, &quiet_settings(), &NoKeepAlive)
            .await
            .unwrap_err();
        match err {
            OscError::Execution { stdout, stderr, .. } => {
                assert!(stdout.contains("Error altering table"));
                assert!(stdout.contains('\u{FFFD}'));
                assert!(stderr.contains("fatal"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_no_keep_alive_sends_no_pings() {
        let settings = ToolSettings { keep_alive: true, keep_alive_interval_secs: 1, ..Default::default() };
        let mut invocation = invocation("sh");
        invocation.options = vec!["-c".to_string(), "sleep 2".to_string()];

        let outcome = tokio_test::block_on(execute_invocation(&invocation, &settings, &NoKeepAlive)).unwrap();
        assert_eq!(outcome.pings, 0);
    }

    #[test]
    fn test_ping_failures_are_not_fatal() {
        let settings = ToolSettings { keep_alive: true, keep_alive_interval_secs: 1, ..Default::default() };
        let mut invocation = invocation("sh");
        // `sh -c 'sleep 2' ...` ignores the remaining arguments
        invocation.options = vec!["-c".to_string(), "sleep 2".to_string()];
        let pinger = FailingPing(AtomicU32::new(0));

        let outcome = tokio_test::block_on(execute_invocation(&invocation, &settings, &pinger)).unwrap();
        assert!(outcome.pings >= 1);
        assert_eq!(outcome.pings, pinger.0.load(Ordering::SeqCst));
    }
}
