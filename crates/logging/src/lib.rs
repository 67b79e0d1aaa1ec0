//! RewardNet logging
//!
//! Shared tracing-subscriber initialization for the CLI and tests.

use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `debug` when verbose, `info`
/// when not. Safe to call more than once (later calls are no-ops), so
/// tests can initialize freely.
pub fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();

    debug!("Logging initialized (verbose={})", verbose);
}
