//! Control decision logic for the bottling plant.
//!
//! Two controllers share one process state but own disjoint actuators:
//! - **Controller A** ([`TankValveController`]) drives the tank input and
//!   output valves
//! - **Controller B** ([`ConveyorController`]) drives the conveyor engine
//!
//! # Architecture
//!
//! - Controllers are pure: they read a [`ProcessState`](bp_core::ProcessState)
//!   snapshot and return a [`Decision`], a list of actuator commands
//! - Operator modes come first: manual-off / manual-on pin the actuator and
//!   automatic logic is skipped for it
//! - Automatic logic is threshold based with a hysteresis band on the tank
//! - Sampling is fixed-period ([`SampleConfig`]); the tick driver owns the clock

pub mod command;
pub mod controller;
pub mod conveyor;
pub mod error;
pub mod sampled;
pub mod tank_valves;

pub use command::{ActuatorCommand, CommandReason, Decision};
pub use controller::{Controller, ControllerId};
pub use conveyor::{ConveyorController, ConveyorPolicy};
pub use error::{ControlError, ControlResult};
pub use sampled::{SampleClock, SampleConfig};
pub use tank_valves::TankValveController;
