//! Deterministic fault injection for the bottling plant.
//!
//! A [`FaultSequencer`] holds a fixed list of [`FaultKind`]s and a cursor.
//! Each call to [`FaultSequencer::apply_next`] applies exactly one fault to a
//! [`ProcessState`](bp_core::ProcessState) and moves the cursor according to
//! its [`CursorPolicy`]. Randomness comes from a seedable generator, so a
//! seed fixes the whole perturbation sequence.

pub mod error;
pub mod fault;
pub mod sequencer;

pub use error::{FaultError, FaultResult};
pub use fault::{FaultKind, StickState, presets};
pub use sequencer::{AppliedFault, CursorPolicy, FaultOutcome, FaultSequencer};
