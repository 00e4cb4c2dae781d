//! Diagnostics for the `formbind` binary
//!
//! Library code only emits `tracing` events. The binary installs a subscriber
//! that reads `RUST_LOG` and writes compact lines to stderr, leaving stdout
//! to command output.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber, `warn` when `RUST_LOG` is unset
///
/// ```bash
/// RUST_LOG=formbind=debug formbind check person.yaml --type Person
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // A second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
