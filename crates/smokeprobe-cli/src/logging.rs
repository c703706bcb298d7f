//! Tracing subscriber setup.
//!
//! Logs go to stderr so `--json` reports on stdout stay machine-readable.
//! `RUST_LOG` wins over the `-v`/`-q` derived filter.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::CliConfig;

/// Filter from `RUST_LOG`, or from the verbosity when unset
#[must_use]
pub fn filter_for(config: &CliConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.filter_directive()))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(config: &CliConfig) {
    let filter = filter_for(config);
    let layer = if config.log_json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_ansi(config.color.should_color())
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    };

    let _ = tracing_subscriber::registry().with(layer).try_init();
}
