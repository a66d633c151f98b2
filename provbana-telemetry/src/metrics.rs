//! ## provbana-telemetry::metrics
//! **Prometheus counters and histograms of the event loop**

use std::time::Duration;

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};

const SECONDS_BUCKETS: &[f64] = &[0.001, 0.01, 0.1, 0.5, 1.0, 5.0, 30.0];

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub events_executed: IntCounter,
    pub events_failed: IntCounter,
    pub event_delay: Histogram,
    pub event_duration: Histogram,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let events_executed =
            IntCounter::new("provbana_events_executed_total", "Scenario events executed")?;
        let events_failed =
            IntCounter::new("provbana_events_failed_total", "Scenario events that failed")?;
        let event_delay = Histogram::with_opts(
            HistogramOpts::new(
                "provbana_event_delay_seconds",
                "Lateness of events relative to their scheduled time",
            )
            .buckets(SECONDS_BUCKETS.to_vec()),
        )?;
        let event_duration = Histogram::with_opts(
            HistogramOpts::new(
                "provbana_event_duration_seconds",
                "Execution time of event actions",
            )
            .buckets(SECONDS_BUCKETS.to_vec()),
        )?;

        registry.register(Box::new(events_executed.clone()))?;
        registry.register(Box::new(events_failed.clone()))?;
        registry.register(Box::new(event_delay.clone()))?;
        registry.register(Box::new(event_duration.clone()))?;

        Ok(Self {
            registry,
            events_executed,
            events_failed,
            event_delay,
            event_duration,
        })
    }

    pub fn record_executed(&self, delay: Duration, duration: Duration) {
        self.events_executed.inc();
        self.event_delay.observe(delay.as_secs_f64());
        self.event_duration.observe(duration.as_secs_f64());
    }

    pub fn record_failed(&self, duration: Duration) {
        self.events_failed.inc();
        self.event_duration.observe(duration.as_secs_f64());
    }

    /// Text exposition format of every registered metric.
    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
