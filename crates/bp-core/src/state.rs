//! Process state shared by the process model, controllers and operators.

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::tags::Tag;

/// Operator-selected actuator mode.
///
/// Encoded on the wire with the operator command codes 1/2/3.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorMode {
    ManualOff,
    ManualOn,
    #[default]
    Auto,
}

impl ActuatorMode {
    pub fn code(self) -> u8 {
        match self {
            ActuatorMode::ManualOff => 1,
            ActuatorMode::ManualOn => 2,
            ActuatorMode::Auto => 3,
        }
    }

    pub fn from_code(code: f64) -> Option<Self> {
        match code {
            c if c == 1.0 => Some(ActuatorMode::ManualOff),
            c if c == 2.0 => Some(ActuatorMode::ManualOn),
            c if c == 3.0 => Some(ActuatorMode::Auto),
            _ => None,
        }
    }

    /// The actuator state an operator is holding, or `None` in auto.
    pub fn forced_state(self) -> Option<bool> {
        match self {
            ActuatorMode::ManualOff => Some(false),
            ActuatorMode::ManualOn => Some(true),
            ActuatorMode::Auto => None,
        }
    }
}

/// The three actuators of the plant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actuator {
    TankInputValve,
    TankOutputValve,
    ConveyorEngine,
}

impl Actuator {
    pub const ALL: [Actuator; 3] = [
        Actuator::TankInputValve,
        Actuator::TankOutputValve,
        Actuator::ConveyorEngine,
    ];

    pub fn status_tag(self) -> Tag {
        match self {
            Actuator::TankInputValve => Tag::TankInputValveStatus,
            Actuator::TankOutputValve => Tag::TankOutputValveStatus,
            Actuator::ConveyorEngine => Tag::ConveyorEngineStatus,
        }
    }

    pub fn mode_tag(self) -> Tag {
        match self {
            Actuator::TankInputValve => Tag::TankInputValveMode,
            Actuator::TankOutputValve => Tag::TankOutputValveMode,
            Actuator::ConveyorEngine => Tag::ConveyorEngineMode,
        }
    }
}

impl fmt::Display for Actuator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Actuator::TankInputValve => "tank input valve",
            Actuator::TankOutputValve => "tank output valve",
            Actuator::ConveyorEngine => "conveyor belt engine",
        };
        f.write_str(name)
    }
}

/// Operator setpoints. Read-only for controllers and the process model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub tank_level_min: f64,
    pub tank_level_max: f64,
    pub bottle_level_max: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            tank_level_min: Tag::TankLevelMin.default_value(),
            tank_level_max: Tag::TankLevelMax.default_value(),
            bottle_level_max: Tag::BottleLevelMax.default_value(),
        }
    }
}

/// Snapshot of every tag in the plant.
///
/// `tank_output_flow` and the level readings are plain numbers on purpose:
/// a corruption fault may park an out-of-domain value here and nothing in
/// this type is allowed to repair it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessState {
    pub tank_level: f64,
    pub tank_output_flow: f64,
    pub bottle_level: f64,
    pub bottle_distance_to_filler: f64,
    pub tank_input_valve_status: bool,
    pub tank_output_valve_status: bool,
    pub conveyor_engine_status: bool,
    pub tank_input_valve_mode: ActuatorMode,
    pub tank_output_valve_mode: ActuatorMode,
    pub conveyor_engine_mode: ActuatorMode,
    pub thresholds: Thresholds,
}

impl Default for ProcessState {
    fn default() -> Self {
        let mut state = Self {
            tank_level: 0.0,
            tank_output_flow: 0.0,
            bottle_level: 0.0,
            bottle_distance_to_filler: 0.0,
            tank_input_valve_status: false,
            tank_output_valve_status: false,
            conveyor_engine_status: false,
            tank_input_valve_mode: ActuatorMode::Auto,
            tank_output_valve_mode: ActuatorMode::Auto,
            conveyor_engine_mode: ActuatorMode::Auto,
            thresholds: Thresholds::default(),
        };
        for tag in Tag::ALL {
            // Defaults are all in-domain, so this cannot fail.
            let _ = state.set_tag_value(tag, tag.default_value());
        }
        state
    }
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

impl ProcessState {
    /// Build a state by reading every tag through `get`.
    pub fn from_tags<F>(mut get: F) -> CoreResult<Self>
    where
        F: FnMut(Tag) -> CoreResult<f64>,
    {
        let mut state = Self::default();
        for tag in Tag::ALL {
            state.set_tag_value(tag, get(tag)?)?;
        }
        Ok(state)
    }

    pub fn tag_value(&self, tag: Tag) -> f64 {
        match tag {
            Tag::TankLevel => self.tank_level,
            Tag::TankLevelMin => self.thresholds.tank_level_min,
            Tag::TankLevelMax => self.thresholds.tank_level_max,
            Tag::TankInputValveStatus => flag(self.tank_input_valve_status),
            Tag::TankInputValveMode => f64::from(self.tank_input_valve_mode.code()),
            Tag::TankOutputValveStatus => flag(self.tank_output_valve_status),
            Tag::TankOutputValveMode => f64::from(self.tank_output_valve_mode.code()),
            Tag::TankOutputFlow => self.tank_output_flow,
            Tag::BottleLevel => self.bottle_level,
            Tag::BottleLevelMax => self.thresholds.bottle_level_max,
            Tag::BottleDistanceToFiller => self.bottle_distance_to_filler,
            Tag::ConveyorEngineStatus => flag(self.conveyor_engine_status),
            Tag::ConveyorEngineMode => f64::from(self.conveyor_engine_mode.code()),
        }
    }

    /// Write one tag. Status tags follow truthiness (any non-zero is on);
    /// mode tags must carry a valid command code.
    pub fn set_tag_value(&mut self, tag: Tag, value: f64) -> CoreResult<()> {
        let mode = |value: f64| {
            ActuatorMode::from_code(value).ok_or(CoreError::InvalidTagValue { tag, value })
        };
        match tag {
            Tag::TankLevel => self.tank_level = value,
            Tag::TankLevelMin => self.thresholds.tank_level_min = value,
            Tag::TankLevelMax => self.thresholds.tank_level_max = value,
            Tag::TankInputValveStatus => self.tank_input_valve_status = value != 0.0,
            Tag::TankInputValveMode => self.tank_input_valve_mode = mode(value)?,
            Tag::TankOutputValveStatus => self.tank_output_valve_status = value != 0.0,
            Tag::TankOutputValveMode => self.tank_output_valve_mode = mode(value)?,
            Tag::TankOutputFlow => self.tank_output_flow = value,
            Tag::BottleLevel => self.bottle_level = value,
            Tag::BottleLevelMax => self.thresholds.bottle_level_max = value,
            Tag::BottleDistanceToFiller => self.bottle_distance_to_filler = value,
            Tag::ConveyorEngineStatus => self.conveyor_engine_status = value != 0.0,
            Tag::ConveyorEngineMode => self.conveyor_engine_mode = mode(value)?,
        }
        Ok(())
    }

    pub fn to_tag_values(&self) -> Vec<(Tag, f64)> {
        Tag::ALL
            .into_iter()
            .map(|tag| (tag, self.tag_value(tag)))
            .collect()
    }

    /// Tags whose value differs from `before`, with their new value.
    pub fn changes_from(&self, before: &ProcessState) -> Vec<(Tag, f64)> {
        Tag::ALL
            .into_iter()
            .filter_map(|tag| {
                let now = self.tag_value(tag);
                (now.to_bits() != before.tag_value(tag).to_bits()).then_some((tag, now))
            })
            .collect()
    }

    pub fn actuator_status(&self, actuator: Actuator) -> bool {
        match actuator {
            Actuator::TankInputValve => self.tank_input_valve_status,
            Actuator::TankOutputValve => self.tank_output_valve_status,
            Actuator::ConveyorEngine => self.conveyor_engine_status,
        }
    }

    pub fn set_actuator_status(&mut self, actuator: Actuator, on: bool) {
        match actuator {
            Actuator::TankInputValve => self.tank_input_valve_status = on,
            Actuator::TankOutputValve => self.tank_output_valve_status = on,
            Actuator::ConveyorEngine => self.conveyor_engine_status = on,
        }
    }

    pub fn actuator_mode(&self, actuator: Actuator) -> ActuatorMode {
        match actuator {
            Actuator::TankInputValve => self.tank_input_valve_mode,
            Actuator::TankOutputValve => self.tank_output_valve_mode,
            Actuator::ConveyorEngine => self.conveyor_engine_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_matches_tag_defaults() {
        let state = ProcessState::default();
        for tag in Tag::ALL {
            assert_eq!(state.tag_value(tag), tag.default_value(), "{tag}");
        }
    }

    #[test]
    fn status_tags_follow_truthiness() {
        let mut state = ProcessState::default();
        state.set_tag_value(Tag::ConveyorEngineStatus, 42.0).unwrap();
        assert!(state.conveyor_engine_status);
        assert_eq!(state.tag_value(Tag::ConveyorEngineStatus), 1.0);
    }

    #[test]
    fn invalid_mode_code_is_rejected() {
        let mut state = ProcessState::default();
        let err = state.set_tag_value(Tag::TankInputValveMode, 4.0).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTagValue { value, .. } if value == 4.0));
        assert_eq!(state.tank_input_valve_mode, ActuatorMode::Auto);
    }

    #[test]
    fn changes_list_only_touched_tags() {
        let before = ProcessState::default();
        let mut after = before.clone();
        after.tank_level = 0.61;
        after.set_actuator_status(Actuator::ConveyorEngine, true);

        let changes = after.changes_from(&before);
        assert_eq!(
            changes,
            vec![(Tag::TankLevel, 0.61), (Tag::ConveyorEngineStatus, 1.0)]
        );
    }

    #[test]
    fn manual_modes_force_state() {
        assert_eq!(ActuatorMode::ManualOff.forced_state(), Some(false));
        assert_eq!(ActuatorMode::ManualOn.forced_state(), Some(true));
        assert_eq!(ActuatorMode::Auto.forced_state(), None);
        for mode in [ActuatorMode::ManualOff, ActuatorMode::ManualOn, ActuatorMode::Auto] {
            assert_eq!(ActuatorMode::from_code(f64::from(mode.code())), Some(mode));
        }
    }
}
