//! Console logging setup.
//!
//! Diagnostics go to stderr so stdout stays clean for the JSON report.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter for a `-v` count.
pub fn level_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info,vppa=info",
        _ => "debug,vppa=debug",
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `verbosity` when set.
/// A second call is a no-op.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_filter(verbosity)));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .try_init();
}
