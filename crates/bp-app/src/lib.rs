//! Shared application service layer for the bottling plant.
//!
//! Wires the physics, controllers, fault sequencers and coordination gate
//! into runnable roles, and provides the pieces every front-end needs:
//! configuration, the mode file, operator commands, the tick driver and an
//! offline closed-loop simulation.

pub mod config;
pub mod driver;
pub mod error;
pub mod mode;
pub mod operator;
pub mod roles;
pub mod simulate;

// Re-export key types for convenience
pub use config::{CoordinationConfig, FaultPlacement, FaultPlan, ModeConfig, PlantConfig};
pub use driver::TickDriver;
pub use error::{AppError, AppResult};
pub use mode::{ModePolicy, ModeSource, SimulationMode, read_mode_file, write_mode_file};
pub use operator::{AutoManipulator, AutoOperatorConfig, MENU, OperatorCommand, OperatorError};
pub use roles::{ControllerRole, ProcessRole, TickContext, TickReport, TickRole, owner_of};
pub use simulate::{SimCounters, SimOptions, SimOutcome, SimRecord, simulate};
