//! bp-coord: turn-taking between the two plant controllers.
//!
//! Both controllers write actuator tags into the same store. The gate makes
//! them take strict turns: A, then B, then A. The turn lives in a small
//! persisted record behind a [`TurnStore`], so the controllers may run as
//! separate OS processes ([`FileTurnStore`]) or threads ([`MemoryTurnStore`]).

pub mod gate;
pub mod record;
pub mod store;

pub use gate::{CoordinationGate, GatePolicy, GateStats};
pub use record::{CoordinationRecord, Owner};
pub use store::{FileTurnStore, MemoryTurnStore, TurnStore};

use std::time::Duration;

use bp_core::CoreError;

pub type CoordResult<T> = Result<T, CoordError>;

#[derive(thiserror::Error, Debug)]
pub enum CoordError {
    #[error("Coordination record I/O: {0}")]
    Core(#[from] CoreError),

    #[error("{owner} signalled out of turn (turn belongs to {turn})")]
    OutOfTurn { owner: Owner, turn: Owner },

    #[error("{owner} gave up waiting for its turn after {waited:?}")]
    Timeout { owner: Owner, waited: Duration },

    #[error("Lock poisoned: {what}")]
    Poisoned { what: &'static str },
}
