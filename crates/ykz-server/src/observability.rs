//! Log output for the dashboard binary.
//!
//! The subscriber is installed once, after configuration is loaded, so the
//! configured `logging.level` applies from the first event. `RUST_LOG`
//! overrides it when set.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Builds the filter from `RUST_LOG` if present and non-blank, else from
/// the configured level. Falls back to `info` when neither parses.
pub fn log_filter(level: &str, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .map(str::trim)
        .filter(|directives| !directives.is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init_tracing(level: &str) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = log_filter(level, rust_log.as_deref());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}
