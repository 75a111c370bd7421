//! Linkdrop Logging
//!
//! Installs the global `tracing` subscriber. Logs go to stderr so stdout
//! stays reserved for program output (addresses, counts, links).

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info,linkdrop=debug";

/// Filter used with `--verbose` when `RUST_LOG` is not set
pub const VERBOSE_FILTER: &str = "debug";

/// Build the filter: `RUST_LOG` wins, then the verbosity default
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER })
    })
}

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init_logging(verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter(verbose))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(false);
        init_logging(true);
        tracing::info!("logging initialised");
    }

    #[test]
    fn test_filter_builds() {
        // Either RUST_LOG or the built-in default must produce a usable filter
        let _ = env_filter(false);
        let _ = env_filter(true);
    }
}
