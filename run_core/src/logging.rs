//! Tracing setup shared by the CLI and the core tests.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Warnings and errors only, unless RUST_LOG says otherwise
/// (e.g. `RUST_LOG=run_core=debug`).
pub fn init() {
    init_with_level("warn")
}

/// Install a compact stderr subscriber filtered at `default_level`.
///
/// RUST_LOG takes precedence when set. Stdout is left to command output
/// such as `runlog export --out -`.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Route every event at debug level and above to the test harness writer,
/// so output only shows for failing tests. Safe to call from every test.
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
