//! bp-core: stable foundation for the bottling plant.
//!
//! Contains:
//! - tags (the fixed tag namespace shared by every process)
//! - state (ProcessState, actuator modes, thresholds)
//! - store (tag store interface + in-memory and file-backed stores)
//! - locked_file (shared/exclusive advisory locks around JSON files)
//! - report (severity-leveled log sink)
//! - numeric (finiteness and clamping helpers)
//! - timing (tick latency bookkeeping)
//! - error (shared error types)

pub mod error;
pub mod locked_file;
pub mod numeric;
pub mod report;
pub mod state;
pub mod store;
pub mod tags;
pub mod timing;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use report::{Severity, report};
pub use state::{Actuator, ActuatorMode, ProcessState, Thresholds};
pub use store::{FileTagStore, MemoryTagStore, TagStore, read_state, write_changes};
pub use tags::Tag;
pub use timing::{TickStats, Timer};
