//! Diagnostic logging to stderr.
//!
//! Filter comes from `KRONOS_LOG`, then `RUST_LOG`, defaulting to `info` so
//! the INFO/ERROR trail of a run is visible in the host's captured output.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn filter_from_env() -> EnvFilter {
    EnvFilter::try_from_env("KRONOS_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Safe to call more than once.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(filter_from_env())
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
