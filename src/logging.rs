//! Logging initialization.
//!
//! The engine emits `tracing` events; nothing is printed unless a subscriber is
//! installed. Binaries call [`init`] once at startup. `RUST_LOG` overrides the
//! default filter.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT_ONCE: Once = Once::new();

/// Installs a stderr fmt subscriber. `verbose` raises the default level from
/// `warn` to `info`. Later calls are no-ops.
pub fn init(verbose: bool) {
    INIT_ONCE.call_once(|| {
        let default = if verbose { "recdiff=info" } else { "recdiff=warn" };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
            )
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}
