//! Controller B: conveyor engine.

use bp_core::{Actuator, ProcessState};
use serde::{Deserialize, Serialize};

use crate::command::{ActuatorCommand, CommandReason, Decision};
use crate::controller::{Controller, ControllerId, check_reach, check_setpoint, manual_command};
use crate::error::ControlResult;

/// Variants of the release rule seen across controller builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConveyorPolicy {
    /// Only move a full bottle once the filler has stopped flowing.
    pub release_requires_no_flow: bool,
}

/// Moves full or absent bottles out, holds a filling bottle still.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConveyorController {
    pub filler_reach: f64,
    pub policy: ConveyorPolicy,
}

impl Default for ConveyorController {
    fn default() -> Self {
        Self {
            filler_reach: 1.0,
            policy: ConveyorPolicy::default(),
        }
    }
}

impl ConveyorController {
    pub fn new(filler_reach: f64, policy: ConveyorPolicy) -> ControlResult<Self> {
        Ok(Self {
            filler_reach: check_reach(filler_reach)?,
            policy,
        })
    }
}

impl Controller for ConveyorController {
    fn id(&self) -> ControllerId {
        ControllerId::B
    }

    fn actuators(&self) -> &'static [Actuator] {
        &[Actuator::ConveyorEngine]
    }

    fn decide(&self, state: &ProcessState) -> ControlResult<Decision> {
        let mut decision = Decision::default();
        if let Some(manual) = manual_command(state, Actuator::ConveyorEngine) {
            decision.push(manual);
            return Ok(decision);
        }
        let bottle_max = check_setpoint("bottle_level_max", state.thresholds.bottle_level_max)?;

        let level = state.bottle_level;
        let distance = state.bottle_distance_to_filler;
        let away = distance > self.filler_reach;
        let full = level > bottle_max
            && (!self.policy.release_requires_no_flow || state.tank_output_flow == 0.0);

        let command = if away || full {
            ActuatorCommand::new(
                Actuator::ConveyorEngine,
                true,
                CommandReason::MoveBottle { level, distance },
            )
        } else {
            ActuatorCommand::new(
                Actuator::ConveyorEngine,
                false,
                CommandReason::HoldBottle { level, distance },
            )
        };
        decision.push(command);
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bp_core::ActuatorMode;

    fn bottle(distance: f64, level: f64) -> ProcessState {
        let mut state = ProcessState::default();
        state.bottle_distance_to_filler = distance;
        state.bottle_level = level;
        state.thresholds.bottle_level_max = 0.9;
        state
    }

    fn conveyor_on(controller: &ConveyorController, state: &ProcessState) -> bool {
        controller
            .decide(state)
            .unwrap()
            .command_for(Actuator::ConveyorEngine)
            .unwrap()
            .on
    }

    #[test]
    fn absent_bottle_starts_conveyor() {
        assert!(conveyor_on(&ConveyorController::default(), &bottle(3.0, 0.0)));
    }

    #[test]
    fn full_bottle_starts_conveyor() {
        assert!(conveyor_on(&ConveyorController::default(), &bottle(0.2, 0.95)));
    }

    #[test]
    fn filling_bottle_holds_conveyor() {
        assert!(!conveyor_on(&ConveyorController::default(), &bottle(0.2, 0.4)));
        assert!(!conveyor_on(&ConveyorController::default(), &bottle(1.0, 0.4)));
    }

    #[test]
    fn no_flow_policy_waits_for_filler_to_stop() {
        let controller = ConveyorController::new(
            1.0,
            ConveyorPolicy {
                release_requires_no_flow: true,
            },
        )
        .unwrap();
        let mut state = bottle(0.2, 0.95);
        state.tank_output_flow = 0.5;
        assert!(!conveyor_on(&controller, &state));

        state.tank_output_flow = 0.0;
        assert!(conveyor_on(&controller, &state));
    }

    #[test]
    fn manual_off_holds_line_even_without_bottle() {
        let mut state = bottle(3.0, 0.0);
        state.conveyor_engine_mode = ActuatorMode::ManualOff;
        let decision = ConveyorController::default().decide(&state).unwrap();
        let cmd = decision.command_for(Actuator::ConveyorEngine).unwrap();
        assert!(!cmd.on);
        assert_eq!(cmd.reason, CommandReason::Manual);
    }

    #[test]
    fn tank_band_does_not_stop_the_line() {
        let mut state = bottle(3.0, 0.0);
        state.thresholds.tank_level_min = 0.9;
        state.thresholds.tank_level_max = 0.1;
        assert!(conveyor_on(&ConveyorController::default(), &state));

        state.thresholds.tank_level_min = f64::NAN;
        assert!(conveyor_on(&ConveyorController::default(), &state));
    }

    #[test]
    fn non_finite_bottle_setpoint_is_an_error() {
        let mut state = bottle(0.2, 0.5);
        state.thresholds.bottle_level_max = f64::NAN;
        assert!(ConveyorController::default().decide(&state).is_err());
    }

    #[test]
    fn only_commands_its_own_actuator() {
        let controller = ConveyorController::default();
        let decision = controller.decide(&bottle(3.0, 0.0)).unwrap();
        for cmd in &decision.commands {
            assert!(controller.actuators().contains(&cmd.actuator));
        }
    }
}
