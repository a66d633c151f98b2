//! # Provbana Configuration
//!
//! Two kinds of configuration live here:
//! - **Runner configuration** (`ProvbanaConfig`): logging, run loop thresholds
//!   and rehearsal parameters, layered from defaults, YAML files and
//!   `PROVBANA_*` environment variables.
//! - **Scenario declarations** (`Scenario`): what a single run does, parsed
//!   from YAML and checked semantically before anything is executed.
//!
//! ### Key Submodules:
//! - `scenario`: scenario types and `Scenario::check`
//! - `checker`: typed options of a scenario check entry
//! - `validation`: shared validation helpers

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod checker;
mod error;
mod executor;
mod rehearsal;
pub mod scenario;
mod telemetry;
mod validation;

pub use checker::CheckerConfig;
pub use error::{format_validation_errors, ConfigError, ScenarioError};
pub use executor::ExecutorConfig;
pub use rehearsal::RehearsalConfig;
pub use scenario::Scenario;
pub use telemetry::LoggingConfig;
pub use validation::{is_valid_name, NAME_PATTERN};

const BASE_FILE: &str = "config/provbana.yaml";

/// Top-level runner configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct ProvbanaConfig {
    #[validate(nested)]
    #[serde(default)]
    pub logging: LoggingConfig,

    #[validate(nested)]
    #[serde(default)]
    pub executor: ExecutorConfig,

    #[validate(nested)]
    #[serde(default)]
    pub rehearsal: RehearsalConfig,
}

impl ProvbanaConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/provbana.yaml`, if present
    /// 3. `config/<PROVBANA_ENV>.yaml`, if present
    /// 4. `PROVBANA_*` environment variables, `__` separating nested keys
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(ProvbanaConfig::default()));

        if Path::new(BASE_FILE).exists() {
            figment = figment.merge(Yaml::file(BASE_FILE));
        }

        if let Ok(env) = std::env::var("PROVBANA_ENV") {
            let env_file = format!("config/{}.yaml", env);
            if Path::new(&env_file).exists() {
                figment = figment.merge(Yaml::file(env_file));
            }
        }

        Self::extract(figment)
    }

    /// Load configuration from a specific file, still honouring the environment.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        Self::extract(
            Figment::from(Serialized::defaults(ProvbanaConfig::default())).merge(Yaml::file(path)),
        )
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .merge(Env::prefixed("PROVBANA_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}
