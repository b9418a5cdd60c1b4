//! Log output for the backoffice server.
//!
//! The subscriber is installed before the configuration is read, so startup
//! errors are logged at `info`. Once `logging.level` is known the filter is
//! swapped in place. `RUST_LOG` wins over both.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

const STARTUP_LEVEL: &str = "info";

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

fn rust_log_is_set() -> bool {
    std::env::var_os("RUST_LOG").is_some()
}

/// Filter for `level`, unless `RUST_LOG` parses.
fn filter_for(level: &str) -> EnvFilter {
    if rust_log_is_set() {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return filter;
        }
    }
    EnvFilter::new(level)
}

/// Installs the global subscriber. Calling it again is a no-op.
pub fn init_tracing() {
    let (filter, handle) = reload::Layer::new(filter_for(STARTUP_LEVEL));
    if FILTER_HANDLE.set(handle).is_err() {
        return;
    }

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}

/// Switches the filter to the configured `logging.level`.
///
/// Does nothing when `RUST_LOG` is set or tracing was never initialized.
pub fn apply_logging_level(level: &str) {
    if rust_log_is_set() {
        return;
    }
    let Some(handle) = FILTER_HANDLE.get() else {
        return;
    };
    if let Err(e) = handle.reload(EnvFilter::new(level)) {
        tracing::warn!(level, error = %e, "Could not apply logging level");
        return;
    }
    tracing::debug!(level, "Logging level applied");
}
