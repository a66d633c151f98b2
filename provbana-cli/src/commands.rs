use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use provbana_config::{ProvbanaConfig, Scenario};
use provbana_core::signal::AbortSignal;
use provbana_simulator::{rehearse, RehearsalOptions, RehearsalReport};
use provbana_telemetry::MetricsRecorder;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "provbana", version, about)]
pub struct Cli {
    /// Runner configuration file; defaults to `config/provbana.yaml` and the
    /// `PROVBANA_*` environment
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check scenario files without running them
    Validate(ValidateArgs),
    /// Run a scenario against the in-memory dry-run network
    Rehearse(RehearseArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(required = true)]
    pub scenarios: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RehearseArgs {
    pub scenario: PathBuf,
    /// Follow wall time instead of jumping between events
    #[arg(long)]
    pub wall_clock: bool,
    /// Skip the consistency check and the scenario's named checks
    #[arg(long)]
    pub no_checks: bool,
    /// Fail unless the transcript hash equals this value
    #[arg(long)]
    pub validate_hash: Option<String>,
    /// Print Prometheus metrics of the event loop when done
    #[arg(long)]
    pub metrics: bool,
    /// Print every executed event
    #[arg(long)]
    pub events: bool,
}

impl Cli {
    pub fn load_config(&self) -> Result<ProvbanaConfig> {
        match &self.config {
            Some(path) => ProvbanaConfig::load_from_path(path)
                .with_context(|| format!("failed to load {}", path.display())),
            None => ProvbanaConfig::load().context("failed to load configuration"),
        }
    }
}

pub async fn run_command(cli: Cli, config: ProvbanaConfig) -> Result<()> {
    match cli.command {
        Commands::Validate(args) => validate(&args.scenarios),
        Commands::Rehearse(args) => {
            let report = run_rehearsal(&args, &config).await?;
            info!(hash = %report.hash, "rehearsal of {} passed", report.scenario);
            Ok(())
        }
    }
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    Scenario::load(path).with_context(|| format!("failed to read scenario {}", path.display()))
}

/// Validates every file, reporting all invalid ones before failing.
pub fn validate(paths: &[PathBuf]) -> Result<()> {
    let mut invalid = 0;
    for path in paths {
        let outcome = load_scenario(path).and_then(|s| Ok(s.check()?));
        match outcome {
            Ok(()) => println!("{}: ok", path.display()),
            Err(e) => {
                invalid += 1;
                println!("{}: invalid", path.display());
                for line in format!("{e:#}").lines() {
                    println!("  {line}");
                }
            }
        }
    }
    if invalid > 0 {
        bail!("{invalid} of {} scenario(s) invalid", paths.len());
    }
    Ok(())
}

async fn run_rehearsal(args: &RehearseArgs, config: &ProvbanaConfig) -> Result<RehearsalReport> {
    let scenario = load_scenario(&args.scenario)?;
    let metrics = if args.metrics {
        Some(Arc::new(
            MetricsRecorder::new().context("failed to register metrics")?,
        ))
    } else {
        None
    };

    let options = RehearsalOptions {
        wall_clock: args.wall_clock,
        checks: !args.no_checks,
        metrics: metrics.clone(),
        abort: AbortSignal::on_ctrl_c(),
    };
    let report = rehearse(&scenario, config, options)
        .await
        .with_context(|| format!("rehearsal of {} failed", scenario.name))?;

    if args.events {
        for entry in &report.events {
            println!("{:>12}  {}", entry.time.to_string(), entry.name);
        }
    }
    println!(
        "{}: {} events, final block {}, transcript {}",
        report.scenario,
        report.events.len(),
        report.final_height,
        report.hash
    );
    if let Some(metrics) = metrics {
        print!("{}", metrics.gather_metrics()?);
    }

    if let Some(expected) = &args.validate_hash {
        report.validate_hash(expected)?;
        println!("transcript hash validated");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_path(file: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../scenarios")
            .join(file)
    }

    #[test]
    fn parses_rehearse_flags() {
        let cli = Cli::try_parse_from([
            "provbana",
            "rehearse",
            "scenarios/baseline.yml",
            "--no-checks",
            "--validate-hash",
            "abc",
        ])
        .unwrap();
        match cli.command {
            Commands::Rehearse(args) => {
                assert!(args.no_checks);
                assert!(!args.wall_clock);
                assert_eq!(args.validate_hash.as_deref(), Some("abc"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn validate_needs_a_file() {
        assert!(Cli::try_parse_from(["provbana", "validate"]).is_err());
        let cli = Cli::try_parse_from(["provbana", "validate", "a.yml", "-c", "x.yaml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.yaml")));
    }

    #[test]
    fn bundled_scenarios_are_valid() {
        let paths: Vec<_> = ["baseline.yml", "expected_failure.yml", "validator_churn.yml"]
            .into_iter()
            .map(scenario_path)
            .collect();
        validate(&paths).unwrap();
    }

    #[test]
    fn missing_scenario_is_reported() {
        let err = validate(&[scenario_path("missing.yml")]).unwrap_err();
        assert_eq!(err.to_string(), "1 of 1 scenario(s) invalid");
    }

    #[tokio::test]
    async fn hash_mismatch_fails_the_rehearsal() {
        let mut args = RehearseArgs {
            scenario: scenario_path("expected_failure.yml"),
            wall_clock: false,
            no_checks: false,
            validate_hash: None,
            metrics: true,
            events: false,
        };
        let config = ProvbanaConfig::default();
        let report = run_rehearsal(&args, &config).await.unwrap();

        args.validate_hash = Some(report.hash.to_uppercase());
        run_rehearsal(&args, &config).await.unwrap();

        args.validate_hash = Some("00".into());
        let err = run_rehearsal(&args, &config).await.unwrap_err();
        assert!(err.to_string().starts_with("transcript hash mismatch"));
    }
}
