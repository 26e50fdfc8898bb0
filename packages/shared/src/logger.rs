//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence. Without it, `default_level` applies to this
/// binary and the server library, while `tower_http` stays at `debug` so
/// request traces are visible.
pub fn setup_logger(bin_name: &str, default_level: &str) {
    let crate_name = bin_name.replace('-', "_");
    let default_directive = format!(
        "{crate_name}={default_level},mapshare_server={default_level},tower_http=debug,info"
    );

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // try_init: integration tests may call this more than once per process
    let installed = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init();

    match installed {
        Ok(()) => tracing::debug!(bin = bin_name, "Logger initialized"),
        Err(e) => tracing::debug!(error = %e, "Global subscriber already set, keeping it"),
    }
}
