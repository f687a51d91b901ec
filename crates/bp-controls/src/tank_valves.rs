//! Controller A: tank input and output valves.

use bp_core::{Actuator, ProcessState};
use serde::{Deserialize, Serialize};

use crate::command::{ActuatorCommand, CommandReason, Decision};
use crate::controller::{Controller, ControllerId, check_reach, check_setpoint, manual_command};
use crate::error::ControlResult;

/// Keeps the tank inside its level band and opens the filler for a waiting bottle.
///
/// Input valve: closes above `tank_level_max`, opens below `tank_level_min`,
/// otherwise stays where it is.
/// Output valve: closes when the bottle is full or not under the filler,
/// opens otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankValveController {
    /// A bottle further than this from the filler is not under it.
    pub filler_reach: f64,
}

impl Default for TankValveController {
    fn default() -> Self {
        Self { filler_reach: 1.0 }
    }
}

impl TankValveController {
    pub fn new(filler_reach: f64) -> ControlResult<Self> {
        Ok(Self {
            filler_reach: check_reach(filler_reach)?,
        })
    }

    fn input_valve(&self, state: &ProcessState) -> ControlResult<Option<ActuatorCommand>> {
        if let Some(manual) = manual_command(state, Actuator::TankInputValve) {
            return Ok(Some(manual));
        }
        let min = check_setpoint("tank_level_min", state.thresholds.tank_level_min)?;
        let max = check_setpoint("tank_level_max", state.thresholds.tank_level_max)?;
        let level = state.tank_level;
        let command = if level > max {
            Some(ActuatorCommand::new(
                Actuator::TankInputValve,
                false,
                CommandReason::TankHigh { level },
            ))
        } else if level < min {
            Some(ActuatorCommand::new(
                Actuator::TankInputValve,
                true,
                CommandReason::TankLow { level },
            ))
        } else {
            None
        };
        Ok(command)
    }

    fn output_valve(&self, state: &ProcessState) -> ControlResult<ActuatorCommand> {
        if let Some(manual) = manual_command(state, Actuator::TankOutputValve) {
            return Ok(manual);
        }
        let bottle_max = check_setpoint("bottle_level_max", state.thresholds.bottle_level_max)?;
        let level = state.bottle_level;
        let distance = state.bottle_distance_to_filler;
        let command = if level > bottle_max || distance > self.filler_reach {
            ActuatorCommand::new(
                Actuator::TankOutputValve,
                false,
                CommandReason::BottleNotReady { level, distance },
            )
        } else {
            ActuatorCommand::new(
                Actuator::TankOutputValve,
                true,
                CommandReason::BottleReady { level, distance },
            )
        };
        Ok(command)
    }
}

impl Controller for TankValveController {
    fn id(&self) -> ControllerId {
        ControllerId::A
    }

    fn actuators(&self) -> &'static [Actuator] {
        &[Actuator::TankInputValve, Actuator::TankOutputValve]
    }

    fn decide(&self, state: &ProcessState) -> ControlResult<Decision> {
        let mut decision = Decision::default();
        if let Some(cmd) = self.input_valve(state)? {
            decision.push(cmd);
        }
        decision.push(self.output_valve(state)?);
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bp_core::ActuatorMode;

    fn state_with_tank(level: f64) -> ProcessState {
        let mut state = ProcessState::default();
        state.tank_level = level;
        state.thresholds.tank_level_min = 0.3;
        state.thresholds.tank_level_max = 0.7;
        state
    }

    #[test]
    fn high_tank_closes_input() {
        let decision = TankValveController::default()
            .decide(&state_with_tank(0.75))
            .unwrap();
        let cmd = decision.command_for(Actuator::TankInputValve).unwrap();
        assert!(!cmd.on);
    }

    #[test]
    fn low_tank_opens_input() {
        let decision = TankValveController::default()
            .decide(&state_with_tank(0.1))
            .unwrap();
        assert!(decision.command_for(Actuator::TankInputValve).unwrap().on);
    }

    #[test]
    fn inside_band_leaves_input_alone() {
        for level in [0.3, 0.5, 0.7] {
            let decision = TankValveController::default()
                .decide(&state_with_tank(level))
                .unwrap();
            assert!(decision.command_for(Actuator::TankInputValve).is_none());
        }
    }

    #[test]
    fn manual_mode_overrides_band() {
        let mut state = state_with_tank(0.95);
        state.tank_input_valve_mode = ActuatorMode::ManualOn;
        let decision = TankValveController::default().decide(&state).unwrap();
        let cmd = decision.command_for(Actuator::TankInputValve).unwrap();
        assert!(cmd.on);
        assert_eq!(cmd.reason, CommandReason::Manual);
    }

    #[test]
    fn output_valve_opens_for_waiting_bottle() {
        let mut state = state_with_tank(0.5);
        state.bottle_distance_to_filler = 0.4;
        state.bottle_level = 0.2;
        let decision = TankValveController::default().decide(&state).unwrap();
        assert!(decision.command_for(Actuator::TankOutputValve).unwrap().on);
    }

    #[test]
    fn output_valve_closes_for_full_or_absent_bottle() {
        let controller = TankValveController::default();

        let mut full = state_with_tank(0.5);
        full.bottle_distance_to_filler = 0.4;
        full.bottle_level = 0.95;
        assert!(!controller.decide(&full).unwrap().command_for(Actuator::TankOutputValve).unwrap().on);

        let mut absent = state_with_tank(0.5);
        absent.bottle_distance_to_filler = 2.0;
        absent.bottle_level = 0.0;
        assert!(!controller.decide(&absent).unwrap().command_for(Actuator::TankOutputValve).unwrap().on);
    }

    #[test]
    fn output_valve_manual_off_wins() {
        let mut state = state_with_tank(0.5);
        state.bottle_distance_to_filler = 0.0;
        state.tank_output_valve_mode = ActuatorMode::ManualOff;
        let decision = TankValveController::default().decide(&state).unwrap();
        assert!(!decision.command_for(Actuator::TankOutputValve).unwrap().on);
    }

    #[test]
    fn inverted_band_still_serves_the_filler() {
        let mut state = state_with_tank(0.5);
        state.thresholds.tank_level_min = 0.9;
        state.thresholds.tank_level_max = 0.1;
        state.bottle_distance_to_filler = 0.5;
        state.bottle_level = 0.2;

        let decision = TankValveController::default().decide(&state).unwrap();
        assert!(decision.command_for(Actuator::TankOutputValve).unwrap().on);
        // Above the (inverted) max wins, as in a plain comparison chain.
        assert!(!decision.command_for(Actuator::TankInputValve).unwrap().on);
    }

    #[test]
    fn non_finite_tank_setpoint_is_an_error() {
        let mut state = state_with_tank(0.5);
        state.thresholds.tank_level_max = f64::INFINITY;
        assert!(TankValveController::default().decide(&state).is_err());
    }

    #[test]
    fn never_commands_the_conveyor() {
        let decision = TankValveController::default()
            .decide(&state_with_tank(0.1))
            .unwrap();
        assert!(decision.command_for(Actuator::ConveyorEngine).is_none());
    }

    #[test]
    fn negative_reach_rejected() {
        assert!(TankValveController::new(-1.0).is_err());
    }
}
