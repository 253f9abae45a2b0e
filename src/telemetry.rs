//! Logging setup for the depot binary.
//!
//! Events go to stderr so stdout stays reserved for command output.
//! `RUST_LOG` controls the filter (default `info`); `DEPOT_LOG_FORMAT=json`
//! switches to structured JSON lines.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

const LOG_FORMAT_ENV: &str = "DEPOT_LOG_FORMAT";

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|format| format == "json");

    let registry = tracing_subscriber::registry().with(filter);

    // a second init (e.g. from tests) keeps the first subscriber
    let _ = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
}
