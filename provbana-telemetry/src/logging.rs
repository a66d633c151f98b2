//! ## provbana-telemetry::logging
//! **Process-wide `tracing` subscriber**
//!
//! Human readable or JSON lines on stdout. `RUST_LOG` takes precedence over
//! the configured level.

use provbana_config::LoggingConfig;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{fmt, EnvFilter};

pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Clone, Copy, Debug)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. Fails if one is already installed or
    /// the configured level does not parse.
    pub fn init(config: &LoggingConfig) -> Result<(), InitError> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => Self::filter(config)?,
        };
        let builder = fmt().with_env_filter(filter).with_thread_names(true);
        if config.json {
            builder.json().try_init()
        } else {
            builder.try_init()
        }
    }

    /// Filter derived from the configuration alone.
    pub fn filter(config: &LoggingConfig) -> Result<EnvFilter, ParseError> {
        EnvFilter::try_new(&config.level)
    }
}
