//! # provbana-simulator
//!
//! Rehearses scenarios without a real network. The executor runs unchanged
//! against an in-memory chain, so a scenario file can be checked for
//! scheduling mistakes and failing checks before it is pointed at a cluster.
//!
//! ### Key Submodules:
//! - `dry_run`: `DryRunNetwork`, the in-memory network and monitoring source
//! - `transcript`: executed-event record with a deterministic BLAKE3 hash
//! - `rehearsal`: `rehearse`, wiring clock, network, checks and executor

pub mod dry_run;
pub mod error;
pub mod rehearsal;
pub mod transcript;

pub use dry_run::DryRunNetwork;
pub use error::RehearsalError;
pub use rehearsal::{rehearse, RehearsalOptions, RehearsalReport};
pub use transcript::Transcript;
