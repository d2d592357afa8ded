use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Directory holding rolling log files (`~/.tracescope/logs`).
pub fn log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tracescope")
        .join("logs")
}

/// Filter used when `RUST_LOG` is unset. Verbose runs open up the engine's
/// own resolution traces without drowning in dependency output.
fn default_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("warn,tracescope_core=debug,tracescope_cli=debug")
    } else {
        EnvFilter::new("info")
    }
}

/// Installs the global subscriber: a daily rolling file named after
/// `component`, plus stderr output when `verbose`.
///
/// Returns `None` if a subscriber is already installed (repeated calls from
/// one process are harmless). The guard must live as long as logging does.
pub fn init_logging(component: &str, verbose: bool) -> Option<WorkerGuard> {
    let log_dir = log_dir();
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("cannot create log dir {}: {}", log_dir.display(), e);
    }

    // cli.log.2026-01-21
    let file_appender = tracing_appender::rolling::daily(&log_dir, component);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose));
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let stderr_layer = verbose.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .ok()
        .map(|_| guard)
}
