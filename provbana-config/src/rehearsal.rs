//! Dry-run rehearsal parameters.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct RehearsalConfig {
    /// Block production rate of the in-memory network.
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_blocks_per_second")]
    pub blocks_per_second: u32,
}

impl Default for RehearsalConfig {
    fn default() -> Self {
        Self {
            blocks_per_second: default_blocks_per_second(),
        }
    }
}

fn default_blocks_per_second() -> u32 {
    1
}
