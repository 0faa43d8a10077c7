//! Logging setup
//!
//! Logs go to stderr so stdout carries only chat output. `RUST_LOG`
//! overrides the default filter.

use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool) {
    let default_filter = if verbose {
        "georag=debug,georag_core=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
