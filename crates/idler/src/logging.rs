//! Log output for client binaries.

use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter` (e.g. `"info"` or `"idler_session=debug,info"`).
///
/// Only the first call in a process installs anything; later calls are
/// no-ops, so tests and binaries can both call it freely.
pub fn init(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_err()
    {
        tracing::debug!("global subscriber already installed");
    }
}
