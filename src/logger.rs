//! Logging support for emv
//!
//! Diagnostics go to stderr so they never mix with the report on stdout.
//! `EMV_LOG` takes a tracing filter directive (e.g. `emv=trace`) and wins over
//! `--verbose`.

use tracing_subscriber::{EnvFilter, fmt, prelude::*, registry};

pub const LOG_ENV: &str = "EMV_LOG";

/// Filter directive used when `EMV_LOG` is not set
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "emv=debug" } else { "emv=warn" }
}

/// Initialize the global tracing subscriber
///
/// Returns false if a subscriber was already installed; logging is never
/// allowed to abort a run.
pub fn init_logging(verbose: bool) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let subscriber = registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    )
    .with(filter);

    tracing::subscriber::set_global_default(subscriber).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true), "emv=debug");
        assert_eq!(default_directive(false), "emv=warn");
    }

    #[test]
    fn test_init_logging_twice() {
        // Only one global subscriber can ever be installed
        init_logging(false);
        assert!(!init_logging(true));
    }
}
