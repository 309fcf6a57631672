//! Tool availability probe
//!
//! Availability is determined once by running `<tool> --version` and cached
//! until reset. Concurrent first callers share a single probe run.

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

static VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+\.\d+(?:\.\d+)*)").expect("valid version pattern"));

/// Cached result of probing the tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityState {
    /// Not probed yet
    Unknown,
    /// Tool runs; carries the reported version
    Available(String),
    Unavailable,
}

impl AvailabilityState {
    pub fn is_available(&self) -> bool {
        matches!(self, AvailabilityState::Available(_))
    }

    pub fn version(&self) -> Option<&str> {
        match self {
            AvailabilityState::Available(version) => Some(version),
            _ => None,
        }
    }
}

/// Extract the first dotted version number from `--version` output
pub fn parse_version(output: &str) -> Option<String> {
    VERSION_PATTERN
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Determines whether the tool can be run.
///
/// Implementations never fail; every problem means [`AvailabilityState::Unavailable`].
pub trait VersionProbe: Send + Sync {
    fn probe(&self) -> AvailabilityState;
}

/// Runs the tool with `--version`
#[derive(Debug, Clone)]
pub struct CommandProbe {
    program: PathBuf,
}

impl CommandProbe {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }
}

impl VersionProbe for CommandProbe {
    fn probe(&self) -> AvailabilityState {
        let output = match Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                debug!("Could not run {}: {}", self.program.display(), e);
                return AvailabilityState::Unavailable;
            }
        };

        if !output.status.success() {
            debug!("{} --version exited with {}", self.program.display(), output.status);
            return AvailabilityState::Unavailable;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_version(&stdout) {
            Some(version) => AvailabilityState::Available(version),
            None => {
                warn!("Unrecognized version output from {}: {}", self.program.display(), stdout.trim());
                AvailabilityState::Unavailable
            }
        }
    }
}

/// Probe returning a fixed state
#[derive(Debug, Clone)]
pub struct StaticProbe(pub AvailabilityState);

impl StaticProbe {
    pub fn available(version: impl Into<String>) -> Self {
        Self(AvailabilityState::Available(version.into()))
    }

    pub fn unavailable() -> Self {
        Self(AvailabilityState::Unavailable)
    }
}

impl VersionProbe for StaticProbe {
    fn probe(&self) -> AvailabilityState {
        self.0.clone()
    }
}

/// Shared availability cache with explicit reset
pub struct ToolAvailability {
    prober: Box<dyn VersionProbe>,
    cell: RwLock<Arc<OnceCell<AvailabilityState>>>,
}

impl ToolAvailability {
    pub fn new(prober: impl VersionProbe + 'static) -> Self {
        Self {
            prober: Box::new(prober),
            cell: RwLock::new(Arc::new(OnceCell::new())),
        }
    }

    /// Cache backed by `<program> --version`
    pub fn for_program(program: impl Into<PathBuf>) -> Self {
        Self::new(CommandProbe::new(program))
    }

    fn current(&self) -> Arc<OnceCell<AvailabilityState>> {
        self.cell.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Cached state, probing on first use
    pub fn probe(&self) -> AvailabilityState {
        let cell = self.current();
        cell.get_or_init(|| {
            let state = self.prober.probe();
            match &state {
                AvailabilityState::Available(version) => {
                    info!("mariadb-schema-change {} is available", version)
                }
                _ => info!("mariadb-schema-change is not available"),
            }
            state
        })
        .clone()
    }

    pub fn is_available(&self) -> bool {
        self.probe().is_available()
    }

    /// State without triggering a probe
    pub fn state(&self) -> AvailabilityState {
        self.current().get().cloned().unwrap_or(AvailabilityState::Unknown)
    }

    /// Forget the cached state; the next call probes again
    pub fn reset(&self) {
        *self.cell.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(OnceCell::new());
    }
}

impl std::fmt::Debug for ToolAvailability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolAvailability").field("state", &self.state()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    struct CountingProbe {
        calls: Arc<AtomicUsize>,
        state: AvailabilityState,
    }

    impl VersionProbe for CountingProbe {
        fn probe(&self) -> AvailabilityState {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            self.state.clone()
        }
    }

    fn counting(state: AvailabilityState) -> (ToolAvailability, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let availability = ToolAvailability::new(CountingProbe { calls: calls.clone(), state });
        (availability, calls)
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("mariadb-schema-change 3.5.7"), Some("3.5.7".to_string()));
        assert_eq!(parse_version("pt-online-schema-change 3.0.13\n"), Some("3.0.13".to_string()));
        assert_eq!(parse_version("v10.11"), Some("10.11".to_string()));
        assert_eq!(parse_version("no version here"), None);
    }

    #[test]
    fn test_probe_is_cached_until_reset() {
        let (availability, calls) = counting(AvailabilityState::Available("3.5.7".to_string()));
        assert_eq!(availability.state(), AvailabilityState::Unknown);

        assert!(availability.is_available());
        assert!(availability.is_available());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(availability.state().version(), Some("3.5.7"));

        availability.reset();
        assert_eq!(availability.state(), AvailabilityState::Unknown);
        assert!(availability.is_available());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_first_use_probes_once() {
        let (availability, calls) = counting(AvailabilityState::Unavailable);
        let availability = Arc::new(availability);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let availability = availability.clone();
                thread::spawn(move || availability.is_available())
            })
            .collect();
        for handle in handles {
            assert!(!handle.join().unwrap());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let availability = ToolAvailability::for_program("/nonexistent/mariadb-schema-change");
        assert_eq!(availability.probe(), AvailabilityState::Unavailable);
    }

    #[test]
    fn test_static_probe() {
        assert!(ToolAvailability::new(StaticProbe::available("3.5.7")).is_available());
        assert!(!ToolAvailability::new(StaticProbe::unavailable()).is_available());
    }
}
