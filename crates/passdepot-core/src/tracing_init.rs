//! Shared tracing/logging initialization.
//!
//! The store is a library, so the embedding application decides when (and
//! whether) to install a global subscriber; this helper sets one up with the
//! env-filter and output format taken from the logging config section.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Initialise the global tracing subscriber from the logging config.
///
/// `RUST_LOG` overrides `logging.filter` when set. When `logging.json` is
/// `true`, emit structured JSON log lines instead of the human-readable
/// format.
pub fn init_tracing(logging: &LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| logging.filter.clone()),
    );
    if logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
