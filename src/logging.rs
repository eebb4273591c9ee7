//! Diagnostic logging setup for the binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Env var holding an `EnvFilter` directive, e.g. `CMDHIST_LOG=cmdhist=debug`.
pub const LOG_ENV: &str = "CMDHIST_LOG";

/// Install a stderr subscriber. `verbose` raises the default level from
/// `warn` to `debug`; an explicit `CMDHIST_LOG` always wins.
pub fn init(verbose: bool) {
    let default = if verbose { "cmdhist=debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    // try_init: keep any subscriber installed earlier.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
