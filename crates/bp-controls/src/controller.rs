//! Controller interface.

use core::fmt;

use bp_core::{Actuator, ProcessState};
use serde::{Deserialize, Serialize};

use crate::command::{ActuatorCommand, CommandReason, Decision};
use crate::error::{ControlError, ControlResult};

/// Which of the two plant controllers this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerId {
    /// Tank valve owner.
    A,
    /// Conveyor owner.
    B,
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerId::A => f.write_str("PLC1"),
            ControllerId::B => f.write_str("PLC2"),
        }
    }
}

/// A decision unit that owns a fixed set of actuators.
pub trait Controller: Send {
    fn id(&self) -> ControllerId;

    /// Actuators this controller may command. Disjoint between controllers.
    fn actuators(&self) -> &'static [Actuator];

    /// Decide actuator commands from a state snapshot.
    fn decide(&self, state: &ProcessState) -> ControlResult<Decision>;
}

/// Manual command for `actuator` if the operator holds it, else `None`.
pub(crate) fn manual_command(state: &ProcessState, actuator: Actuator) -> Option<ActuatorCommand> {
    state
        .actuator_mode(actuator)
        .forced_state()
        .map(|on| ActuatorCommand::new(actuator, on, CommandReason::Manual))
}

/// Reject a setpoint an automatic rule cannot compare against.
///
/// Only finiteness is checked. The ordering of the tank band is the
/// operator's concern; each rule reads just the setpoints it needs.
pub(crate) fn check_setpoint(name: &str, value: f64) -> ControlResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ControlError::InvalidThresholds {
            what: format!("{name} is not finite ({value})"),
        })
    }
}

pub(crate) fn check_reach(filler_reach: f64) -> ControlResult<f64> {
    if filler_reach.is_finite() && filler_reach >= 0.0 {
        Ok(filler_reach)
    } else {
        Err(ControlError::InvalidArg {
            what: "filler_reach must be finite and non-negative",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bp_core::ActuatorMode;

    #[test]
    fn non_finite_setpoint_is_rejected() {
        assert_eq!(check_setpoint("bottle_level_max", 0.9).unwrap(), 0.9);
        for value in [f64::NAN, f64::INFINITY] {
            assert!(matches!(
                check_setpoint("bottle_level_max", value),
                Err(ControlError::InvalidThresholds { .. })
            ));
        }
    }

    #[test]
    fn manual_mode_yields_manual_command() {
        let mut state = ProcessState::default();
        state.conveyor_engine_mode = ActuatorMode::ManualOn;
        let cmd = manual_command(&state, Actuator::ConveyorEngine).unwrap();
        assert!(cmd.on);
        assert_eq!(cmd.reason, CommandReason::Manual);
        assert!(manual_command(&state, Actuator::TankInputValve).is_none());
    }

    #[test]
    fn controller_ids_use_plant_names() {
        assert_eq!(ControllerId::A.to_string(), "PLC1");
        assert_eq!(ControllerId::B.to_string(), "PLC2");
    }
}
