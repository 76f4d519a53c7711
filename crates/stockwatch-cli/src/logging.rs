//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset and no `-v` was given.
pub const DEFAULT_FILTER: &str = "info,stockwatch=info";

/// Filter directive for a `-v` count.
///
/// Targets match by prefix, so `stockwatch` covers every `stockwatch_*` crate.
pub fn filter_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => DEFAULT_FILTER,
        1 => "info,stockwatch=debug",
        _ => "debug,stockwatch=trace",
    }
}

/// Install the global fmt subscriber. `RUST_LOG` wins over `-v`.
///
/// Also bridges `log` records into tracing. Calling this twice is harmless.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_for_verbosity(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose > 0)
        .with_writer(std::io::stderr)
        .try_init();
}
