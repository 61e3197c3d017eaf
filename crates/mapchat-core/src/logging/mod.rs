//! Structured logging with `tracing`.
//!
//! The engine itself only emits `tracing` events; installing a subscriber is
//! the host's job. [`init_subscriber`] is the stock stderr setup used by the
//! `mapchat` binary, and [`capture_logs`] is the in-memory variant for tests.

pub mod test_utils;

pub use test_utils::{CapturedEvent, CapturedLogs, capture_logs};

/// Initialize the global tracing subscriber with stderr output.
///
/// `RUST_LOG` takes precedence over `level` when set. Calling this more than
/// once is harmless; only the first call installs a subscriber.
pub fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    let _ = subscriber.try_init();
}

/// Initialize the global subscriber with newline-delimited JSON output on stderr.
pub fn init_json_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json();

    let _ = subscriber.try_init();
}
