//! Structured logging setup.
//!
//! An `EnvFilter`-driven `tracing_subscriber` so operators can tune
//! verbosity per module via `RUST_LOG` without a rebuild.

use tracing_subscriber::EnvFilter;

/// Initialize the global `tracing` subscriber. Safe to call more than
/// once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
