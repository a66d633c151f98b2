//! ## provbana-simulator::rehearsal
//! **Dry-run a scenario end to end**
//!
//! A rehearsal runs the real executor against a [`DryRunNetwork`], by default
//! on a simulated clock so a scenario of any duration finishes instantly. The
//! built-in checks observe the in-memory chain, and the executed events are
//! summarised in a transcript hash.

use std::sync::Arc;

use provbana_checks::Registry;
use provbana_config::{ProvbanaConfig, Scenario};
use provbana_core::signal::AbortSignal;
use provbana_core::time::{Clock, SimClock, Time, WallTimeClock};
use provbana_engine::Executor;
use provbana_telemetry::MetricsRecorder;
use tracing::{info, instrument};

use crate::dry_run::DryRunNetwork;
use crate::error::RehearsalError;
use crate::transcript::{compare_hash, Entry, Transcript};

#[derive(Debug, Clone)]
pub struct RehearsalOptions {
    /// Follow wall time instead of jumping from event to event.
    pub wall_clock: bool,
    /// Register the built-in checks; without them neither the consistency
    /// check nor the scenario's named checks run.
    pub checks: bool,
    pub metrics: Option<Arc<MetricsRecorder>>,
    pub abort: AbortSignal,
}

impl Default for RehearsalOptions {
    fn default() -> Self {
        Self {
            wall_clock: false,
            checks: true,
            metrics: None,
            abort: AbortSignal::never(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RehearsalReport {
    pub scenario: String,
    /// Transcript hash, hex encoded.
    pub hash: String,
    pub events: Vec<Entry>,
    pub final_time: Time,
    pub final_height: u64,
    pub epoch: u32,
    pub registered_validators: usize,
}

impl RehearsalReport {
    /// Fails unless the transcript hash equals `expected`.
    pub fn validate_hash(&self, expected: &str) -> Result<(), RehearsalError> {
        compare_hash(expected, self.hash.clone())
    }
}

#[instrument(skip_all, fields(scenario = %scenario.name))]
pub async fn rehearse(
    scenario: &Scenario,
    config: &ProvbanaConfig,
    options: RehearsalOptions,
) -> Result<RehearsalReport, RehearsalError> {
    scenario.check()?;

    let clock: Arc<dyn Clock> = if options.wall_clock {
        Arc::new(WallTimeClock::new())
    } else {
        Arc::new(SimClock::new())
    };
    let net = Arc::new(DryRunNetwork::for_scenario(
        clock.clone(),
        scenario,
        config.rehearsal.blocks_per_second,
    )?);

    let checks = options
        .checks
        .then(|| Registry::with_defaults().init_network_checks(net.clone(), net.clone()));

    let transcript = Arc::new(Transcript::new());
    let mut executor = Executor::new(config.executor.clone()).with_sink(transcript.clone());
    if let Some(metrics) = options.metrics {
        executor = executor.with_metrics(metrics);
    }

    executor
        .run(
            clock.clone(),
            net.clone(),
            scenario,
            checks.as_ref(),
            &options.abort,
        )
        .await?;

    let report = RehearsalReport {
        scenario: scenario.name.clone(),
        hash: transcript.hash(),
        events: transcript.entries(),
        final_time: clock.now(),
        final_height: net.height(),
        epoch: net.epoch(),
        registered_validators: net.registered_validators(),
    };
    info!(
        hash = %report.hash,
        events = report.events.len(),
        height = report.final_height,
        "rehearsal finished"
    );
    Ok(report)
}
