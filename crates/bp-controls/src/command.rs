//! Actuator commands produced by controllers.

use core::fmt;

use bp_core::{Actuator, ProcessState};
use serde::{Deserialize, Serialize};

/// Why a controller asked for an actuator state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CommandReason {
    /// Operator holds the actuator in a manual mode.
    Manual,
    /// Tank level above `tank_level_max`.
    TankHigh { level: f64 },
    /// Tank level below `tank_level_min`.
    TankLow { level: f64 },
    /// Bottle full or not under the filler.
    BottleNotReady { level: f64, distance: f64 },
    /// Bottle under the filler and not yet full.
    BottleReady { level: f64, distance: f64 },
    /// Bottle away from the filler or full: move the line.
    MoveBottle { level: f64, distance: f64 },
    /// Bottle filling under the filler: hold the line.
    HoldBottle { level: f64, distance: f64 },
}

impl fmt::Display for CommandReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandReason::Manual => write!(f, "manual operator mode"),
            CommandReason::TankHigh { level } => write!(f, "high tank level: {level:.2}"),
            CommandReason::TankLow { level } => write!(f, "low tank level: {level:.2}"),
            CommandReason::BottleNotReady { level, distance }
            | CommandReason::BottleReady { level, distance }
            | CommandReason::MoveBottle { level, distance }
            | CommandReason::HoldBottle { level, distance } => {
                write!(f, "bottle level: {level:.2}, belt position: {distance:.2}")
            }
        }
    }
}

/// Request to put one actuator in a state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuatorCommand {
    pub actuator: Actuator,
    pub on: bool,
    pub reason: CommandReason,
}

impl ActuatorCommand {
    pub fn new(actuator: Actuator, on: bool, reason: CommandReason) -> Self {
        Self {
            actuator,
            on,
            reason,
        }
    }
}

impl fmt::Display for ActuatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match (self.actuator, self.on) {
            (Actuator::ConveyorEngine, true) => "started",
            (Actuator::ConveyorEngine, false) => "stopped",
            (_, true) => "opened",
            (_, false) => "closed",
        };
        write!(f, "{} {verb} ({})", self.actuator, self.reason)
    }
}

/// Everything a controller wants done this tick.
///
/// An actuator missing from `commands` is left as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decision {
    pub commands: Vec<ActuatorCommand>,
}

impl Decision {
    pub fn push(&mut self, command: ActuatorCommand) {
        self.commands.push(command);
    }

    pub fn command_for(&self, actuator: Actuator) -> Option<&ActuatorCommand> {
        self.commands.iter().find(|c| c.actuator == actuator)
    }

    /// Apply the commands to `state`; returns those that changed something.
    pub fn apply(&self, state: &mut ProcessState) -> Vec<ActuatorCommand> {
        let mut changed = Vec::new();
        for command in &self.commands {
            if state.actuator_status(command.actuator) != command.on {
                state.set_actuator_status(command.actuator, command.on);
                changed.push(*command);
            }
        }
        changed
    }
}
