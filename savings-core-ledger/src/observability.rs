//! Tracing initialisation for processes embedding the ledger.

use tracing_subscriber::EnvFilter;

/// Install a JSON fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_current_span(true)
        .with_target(false)
        .try_init();
}
