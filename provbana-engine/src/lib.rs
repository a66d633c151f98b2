//! # provbana-engine
//!
//! Scenario driver: turns a validated scenario into timed events and runs
//! them against a network under test.
//!
//! ### Key Submodules:
//! - `executor`: `Executor`, the sequential run loop
//! - `registry`: validator registration used when validators join
//! - `validator_tracker`: id book-keeping for networks assigning validator ids
//! - `progress`: periodic progress logging while a run is in flight
//!
//! Events sharing a timestamp run in the order they were scheduled: shutdown
//! and consistency check first, then validators, nodes (by group, then
//! instance), applications, cheats, network rules, epoch advances and checks.

pub mod error;
pub mod executor;
pub mod progress;
pub mod registry;
mod schedule;
pub mod validator_tracker;

pub use error::{LifecycleError, RegistryError, RunError, TrackerError};
pub use executor::{EventSink, Executor};
pub use registry::{NetBasedValidatorRegistry, ValidatorRegistry};
pub use validator_tracker::ValidatorIdTracker;
