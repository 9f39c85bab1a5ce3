//! Tracing setup.
//!
//! Logs go to stderr so stdout stays clean for the clock face and JSON
//! events. `RUST_LOG` overrides the default filter.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub fn init(verbose: bool) {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    let default_directive = if verbose {
        "info,chimeclock_core=debug,chimeclock_cli=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // A second init (e.g. in tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(filter)
        .try_init();

    tracing::debug!(verbose, "logging initialized");
}
