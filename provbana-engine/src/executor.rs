//! ## provbana-engine::executor
//! **Scenario run loop**
//!
//! A run validates the scenario, turns its declarations into events, restarts
//! the clock and then drains the event queue strictly one event at a time.
//! The only suspension point is the wait for the next event's time, which a
//! user abort can interrupt. The first failing action ends the run.

use std::sync::Arc;
use std::time::Instant;

use provbana_checks::{Checker, Checks};
use provbana_config::{ExecutorConfig, Scenario};
use provbana_core::events::EventQueue;
use provbana_core::network::Network;
use provbana_core::signal::AbortSignal;
use provbana_core::time::{Clock, Time};
use provbana_telemetry::MetricsRecorder;
use tracing::{debug, error, info, instrument, warn};

use crate::error::RunError;
use crate::progress::ProgressLogger;
use crate::registry::{NetBasedValidatorRegistry, ValidatorRegistry};
use crate::schedule::Schedule;

/// Receives every successfully executed event.
pub trait EventSink: Send + Sync {
    fn record(&self, name: &str, time: Time);
}

/// Drives scenarios against a network.
#[derive(Clone, Default)]
pub struct Executor {
    config: ExecutorConfig,
    metrics: Option<Arc<MetricsRecorder>>,
    sink: Option<Arc<dyn EventSink>>,
}

impl Executor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Runs `scenario` on `network`, registering validators through the
    /// network's own RPC endpoints.
    ///
    /// Without `checks` neither the consistency check nor the scenario's
    /// named checks are scheduled.
    pub async fn run(
        &self,
        clock: Arc<dyn Clock>,
        network: Arc<dyn Network>,
        scenario: &Scenario,
        checks: Option<&Checks>,
        abort: &AbortSignal,
    ) -> Result<(), RunError> {
        let registry = Arc::new(NetBasedValidatorRegistry::new(network.clone()));
        self.run_with_registry(clock, network, scenario, checks, registry, abort)
            .await
    }

    /// Like [`Executor::run`] with an explicit validator registry.
    #[instrument(skip_all, fields(scenario = %scenario.name))]
    pub async fn run_with_registry(
        &self,
        clock: Arc<dyn Clock>,
        network: Arc<dyn Network>,
        scenario: &Scenario,
        checks: Option<&Checks>,
        registry: Arc<dyn ValidatorRegistry>,
        abort: &AbortSignal,
    ) -> Result<(), RunError> {
        scenario.check()?;
        let mut queue = self.schedule(network.clone(), scenario, checks, registry)?;

        // Network bring-up must not count against the scenario duration.
        clock.restart();
        info!(
            duration = %Time::from_secs_f32(scenario.duration),
            events = queue.len(),
            "starting scenario"
        );

        let progress =
            ProgressLogger::start(clock.clone(), network, self.config.progress_interval());
        let result = self.drain(&mut queue, clock.as_ref(), abort).await;
        progress.stop();

        if result.is_ok() {
            info!(time = %clock.now(), "scenario completed");
        }
        result
    }

    fn schedule(
        &self,
        network: Arc<dyn Network>,
        scenario: &Scenario,
        checks: Option<&Checks>,
        registry: Arc<dyn ValidatorRegistry>,
    ) -> Result<EventQueue, RunError> {
        // Resolve named checks before the network is touched.
        let mut configured = Vec::new();
        match checks {
            Some(checks) => {
                for entry in &scenario.checks {
                    let checker = checks
                        .get(&entry.check)
                        .ok_or_else(|| RunError::UnknownCheck(entry.check.clone()))?;
                    let checker: Arc<dyn Checker> = Arc::from(
                        checker
                            .configure(&entry.config)
                            .map_err(|source| RunError::Configure {
                                check: entry.check.clone(),
                                source,
                            })?,
                    );
                    configured.push((entry, checker));
                }
            }
            None if !scenario.checks.is_empty() => {
                warn!(
                    checks = scenario.checks.len(),
                    "Network checks skipped, ignoring scenario checks"
                );
            }
            None => {}
        }

        let end = Time::from_secs_f32(scenario.duration);
        let mut schedule = Schedule::new(network, registry, end);

        match checks {
            Some(checks) if self.config.consistency_checks => {
                schedule.consistency_check(checks.clone())
            }
            _ => info!("Network checks skipped"),
        }

        schedule.validators(&scenario.validators);
        for group in &scenario.nodes {
            schedule.nodes(group);
        }
        for group in &scenario.applications {
            schedule.applications(group)?;
        }
        for cheat in &scenario.cheats {
            schedule.cheat(cheat);
        }
        for update in &scenario.network_rules.updates {
            schedule.network_rules(update);
        }
        for advance in &scenario.advance_epoch {
            schedule.advance_epoch(advance);
        }
        for (entry, checker) in configured {
            schedule.check(entry.time, &entry.check, checker);
        }

        let queue = schedule.into_queue();
        debug!(events = queue.len(), "scenario scheduled");
        Ok(queue)
    }

    async fn drain(
        &self,
        queue: &mut EventQueue,
        clock: &dyn Clock,
        abort: &AbortSignal,
    ) -> Result<(), RunError> {
        while let Some(event) = queue.next() {
            let event_time = event.time();

            tokio::select! {
                biased;
                _ = abort.aborted() => {
                    warn!("received user abort, ending execution");
                    return Err(RunError::Aborted);
                }
                _ = clock.notify_at(event_time) => {}
            }

            let name = event.name().to_string();
            let delay = clock.delay(event_time);
            if delay > self.config.delay_warning() {
                warn!(
                    time = %clock.now(),
                    name = %name,
                    event_time = %event_time,
                    delay = delay.as_secs_f64(),
                    "starting processing event with delay"
                );
            } else {
                info!(
                    time = %clock.now(),
                    name = %name,
                    event_time = %event_time,
                    "starting processing event"
                );
            }

            let started = Instant::now();
            let successors = match event.run() {
                Ok(successors) => successors,
                Err(source) => {
                    let duration = started.elapsed();
                    error!(
                        time = %clock.now(),
                        name = %name,
                        event_time = %event_time,
                        error = %source,
                        duration = ?duration,
                        "event execution failed"
                    );
                    if let Some(metrics) = &self.metrics {
                        metrics.record_failed(duration);
                    }
                    return Err(RunError::Action { name, source });
                }
            };

            let duration = started.elapsed();
            if duration > self.config.slow_execution() {
                warn!(
                    time = %clock.now(),
                    name = %name,
                    event_time = %event_time,
                    duration = ?duration,
                    "processing of event completed (slow execution)"
                );
            } else {
                info!(
                    time = %clock.now(),
                    name = %name,
                    event_time = %event_time,
                    duration = ?duration,
                    "processing of event completed"
                );
            }
            if let Some(metrics) = &self.metrics {
                metrics.record_executed(delay, duration);
            }
            if let Some(sink) = &self.sink {
                sink.record(&name, event_time);
            }

            queue.add_all(successors);
        }
        Ok(())
    }
}
