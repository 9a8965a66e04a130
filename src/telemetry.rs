//! Tracing setup and span constructors.

use crate::config::{LogConfig, LogFormat};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match log.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, debug_span};

    /// Span covering the application of one roster event.
    pub fn event(kind: &'static str) -> Span {
        debug_span!("roster_event", kind = kind)
    }
}
