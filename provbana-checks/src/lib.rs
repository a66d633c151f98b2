//! # provbana-checks
//!
//! Pluggable network health checks evaluated during and at the end of a
//! scenario run.
//!
//! ### Key Submodules:
//! - `checker`: `Checker` contract, `Registry` of named factories, `Checks`
//! - `decorators`: expect-error and expect-failure wrappers
//! - `monitoring`: read-only time series interface consumed by checkers
//! - built-ins: `block_height`, `block_gas_rate`, `blocks_rolling`,
//!   `blocks_hashes`

pub mod block_gas_rate;
pub mod block_height;
pub mod blocks_hashes;
pub mod blocks_rolling;
pub mod checker;
pub mod decorators;
pub mod error;
pub mod monitoring;

#[cfg(test)]
mod testing;

pub use checker::{Checker, Checks, Factory, Registry};
pub use error::{CheckError, ConfigureError};
pub use monitoring::{BlockStatus, MemoryMonitor, MonitoringData, Series, SyncedSeries};
