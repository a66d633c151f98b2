//! # provbana-core
//!
//! Foundation layer of the scenario runner: scenario time, the event
//! scheduler's building blocks, and the collaborator contracts a network
//! under test has to satisfy.
//!
//! ### Key Submodules:
//! - `time`: `Clock` contract with a simulated and a wall-time variant
//! - `events`: time-ordered `Event`s and the `EventQueue` min-heap
//! - `signal`: user-abort signal observed between events
//! - `network`: `Network`, `Node`, `Application` and `RpcClient` contracts

pub mod error;
pub mod events;
pub mod network;
pub mod signal;
pub mod time;

pub mod prelude {
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::network::*;
    pub use crate::signal::*;
    pub use crate::time::*;
}

pub use error::{NetworkError, RpcError};
