//! # Provbana Telemetry
//!
//! Crate for logging and metrics of scenario runs.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
