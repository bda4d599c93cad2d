//! Structured logging for the portal. One global fmt subscriber, installed
//! once at startup. A `RUST_LOG` filter, when present, replaces the
//! configured level wholesale.

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;

/// Directives appended after the configured level so dependency chatter
/// stays out of the audit-relevant log stream.
const QUIET_DEPENDENCIES: &[&str] = &["hyper=warn", "mio=warn", "tower=warn"];

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("log filter '{value}' does not parse")]
    Filter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("logging already initialised: {0}")]
    AlreadyInitialised(Box<dyn std::error::Error + Send + Sync>),
}

fn portal_filter(level: &str) -> Result<EnvFilter, TelemetryError> {
    let mut directives = vec![level.to_string()];
    directives.extend(QUIET_DEPENDENCIES.iter().map(|d| (*d).to_string()));
    let directives = directives.join(",");
    EnvFilter::try_new(&directives).map_err(|source| TelemetryError::Filter {
        value: directives,
        source,
    })
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => portal_filter(&config.log_level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .compact()
        .try_init()
        .map_err(TelemetryError::AlreadyInitialised)
}
