//! Discrete-time physical process model for the bottling plant.
//!
//! Provides:
//! - Physics parameters (capacities, flow rates, conveyor geometry)
//! - A pure `advance(state, elapsed)` step for tank, bottle and conveyor
//! - Process events (overflow, empty tank, wasted water, bottle change)

pub mod error;
pub mod events;
pub mod params;
pub mod process;

pub use error::{SimError, SimResult};
pub use events::ProcessEvent;
pub use params::PhysicsParams;
pub use process::{Step, advance};
