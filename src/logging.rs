use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing.
///
/// `WINSANE_LOG=<file>` appends logs to that file. Otherwise `--verbose`
/// logs to stderr, and without either nothing is recorded. `RUST_LOG`
/// overrides the level in both cases.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if let Ok(log_path) = std::env::var("WINSANE_LOG") {
        match OpenOptions::new().create(true).append(true).open(&log_path) {
            Ok(file) => {
                let file_layer = fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .with_level(true);
                tracing_subscriber::registry()
                    .with(filter)
                    .with(file_layer)
                    .init();
                return;
            }
            Err(e) => eprintln!("warning: failed to open log file '{}': {}", log_path, e),
        }
    }

    if verbose {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}
