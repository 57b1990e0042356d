//! Diagnostics setup.
//!
//! Events go to stderr so `--stdout` output stays a clean feed document.
//! The filter is read from `RSSINGLE_LOG` (`EnvFilter` syntax, e.g.
//! `rssingle=debug`) and defaults to errors only.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "RSSINGLE_LOG";

const DEFAULT_FILTER: &str = "error";

/// Builds the filter from [`LOG_ENV`], falling back to errors only when the
/// variable is unset or invalid.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. Safe to call more than once; later calls
/// are no-ops.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}
