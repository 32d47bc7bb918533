//! Logging setup for the command-line front end

use tracing_subscriber::EnvFilter;

/// Install a stderr `tracing` subscriber.
///
/// `RUST_LOG` wins when set (e.g. `RUST_LOG=resource_reconciler=debug`).
/// Otherwise `verbosity` picks the level: 0 is `warn`, 1 is `info`, 2 or more
/// is `debug`.
pub fn setup_tracing(verbosity: u8) {
    let fallback = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
