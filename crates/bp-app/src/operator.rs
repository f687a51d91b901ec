//! Operator commands: the HMI menu without the terminal.

use std::fmt;
use std::time::Duration;

use bp_core::{Actuator, ActuatorMode, CoreResult, Tag, TagStore, Thresholds};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AppResult;

/// Rejected operator input. The caller re-prompts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OperatorError {
    #[error("Only integer values between 1 and 6 are acceptable (got {choice})")]
    InvalidChoice { choice: i64 },

    #[error("Negative numbers are not acceptable (got {value})")]
    NegativeSetpoint { value: f64 },

    #[error("Set point must be a finite number (got {value})")]
    NonFiniteSetpoint { value: f64 },

    #[error("Only 1, 2, and 3 are acceptable for command (got {value})")]
    InvalidModeCode { value: f64 },

    #[error("Empty level of tank ({min}) must not exceed its full level ({max})")]
    InvertedTankBand { min: f64, max: f64 },
}

/// Menu shown by interactive front-ends.
pub const MENU: &str = "\
1) To change the empty level of tank press 1
2) To change the full level of tank press 2
3) To change the full level of bottle press 3
4) To change the status of tank input valve press 4
5) To change the status of tank output valve press 5
6) To change the status of conveyor belt engine press 6
Commands for 4-6: 1) manually off  2) manually on  3) auto operation";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperatorCommand {
    SetThreshold { tag: Tag, value: f64 },
    SetMode { actuator: Actuator, mode: ActuatorMode },
}

impl OperatorCommand {
    /// Validate one menu selection.
    pub fn from_choice(choice: i64, value: f64) -> Result<Self, OperatorError> {
        let threshold = |tag| {
            if !value.is_finite() {
                Err(OperatorError::NonFiniteSetpoint { value })
            } else if value < 0.0 {
                Err(OperatorError::NegativeSetpoint { value })
            } else {
                Ok(OperatorCommand::SetThreshold { tag, value })
            }
        };
        let mode = |actuator| {
            ActuatorMode::from_code(value)
                .map(|mode| OperatorCommand::SetMode { actuator, mode })
                .ok_or(OperatorError::InvalidModeCode { value })
        };
        match choice {
            1 => threshold(Tag::TankLevelMin),
            2 => threshold(Tag::TankLevelMax),
            3 => threshold(Tag::BottleLevelMax),
            4 => mode(Actuator::TankInputValve),
            5 => mode(Actuator::TankOutputValve),
            6 => mode(Actuator::ConveyorEngine),
            _ => Err(OperatorError::InvalidChoice { choice }),
        }
    }

    pub fn tag(&self) -> Tag {
        match self {
            OperatorCommand::SetThreshold { tag, .. } => *tag,
            OperatorCommand::SetMode { actuator, .. } => actuator.mode_tag(),
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            OperatorCommand::SetThreshold { value, .. } => *value,
            OperatorCommand::SetMode { mode, .. } => f64::from(mode.code()),
        }
    }

    /// Check a setpoint against the tank band currently in force.
    pub fn validate_against(&self, thresholds: &Thresholds) -> Result<(), OperatorError> {
        let (min, max) = match *self {
            OperatorCommand::SetThreshold {
                tag: Tag::TankLevelMin,
                value,
            } => (value, thresholds.tank_level_max),
            OperatorCommand::SetThreshold {
                tag: Tag::TankLevelMax,
                value,
            } => (thresholds.tank_level_min, value),
            _ => return Ok(()),
        };
        if min > max {
            return Err(OperatorError::InvertedTankBand { min, max });
        }
        Ok(())
    }

    /// Validate against the stored tank band, then write.
    pub fn submit(&self, store: &dyn TagStore) -> AppResult<()> {
        let thresholds = Thresholds {
            tank_level_min: store.get(Tag::TankLevelMin)?,
            tank_level_max: store.get(Tag::TankLevelMax)?,
            bottle_level_max: store.get(Tag::BottleLevelMax)?,
        };
        self.validate_against(&thresholds)?;
        Ok(self.apply(store)?)
    }

    /// Write the tag unchecked.
    pub fn apply(&self, store: &dyn TagStore) -> CoreResult<()> {
        store.set(self.tag(), self.value())?;
        info!(tag = %self.tag(), value = self.value(), "{self}");
        Ok(())
    }
}

fn setting_name(tag: Tag) -> &'static str {
    match tag {
        Tag::TankLevelMin => "empty level of tank",
        Tag::TankLevelMax => "full level of tank",
        Tag::BottleLevelMax => "full level of bottle",
        _ => "setting",
    }
}

impl fmt::Display for OperatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorCommand::SetThreshold { tag, value } => {
                write!(f, "Set {} to {value:.2}", setting_name(*tag))
            }
            OperatorCommand::SetMode { actuator, mode } => {
                write!(f, "Changed status of {actuator} to mode {}", mode.code())
            }
        }
    }
}

/// Range an unattended operator draws one setpoint from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetpointRange {
    pub tag: Tag,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoOperatorConfig {
    pub seed: u64,
    pub ranges: Vec<SetpointRange>,
    pub pause_min_s: u64,
    pub pause_max_s: u64,
}

impl Default for AutoOperatorConfig {
    fn default() -> Self {
        Self {
            seed: 4,
            ranges: vec![
                SetpointRange {
                    tag: Tag::TankLevelMin,
                    min: 0.1,
                    max: 0.45,
                },
                SetpointRange {
                    tag: Tag::TankLevelMax,
                    min: 0.55,
                    max: 0.9,
                },
                SetpointRange {
                    tag: Tag::BottleLevelMax,
                    min: 0.5,
                    max: 0.95,
                },
            ],
            pause_min_s: 5,
            pause_max_s: 20,
        }
    }
}

impl AutoOperatorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.ranges.is_empty() {
            return Err("auto_operator.ranges must not be empty".to_string());
        }
        for range in &self.ranges {
            if !matches!(
                range.tag,
                Tag::TankLevelMin | Tag::TankLevelMax | Tag::BottleLevelMax
            ) {
                return Err(format!("auto_operator cannot manipulate {}", range.tag));
            }
            if !(range.min.is_finite() && range.max.is_finite() && 0.0 <= range.min && range.min <= range.max) {
                return Err(format!(
                    "auto_operator range for {} must satisfy 0 <= min <= max",
                    range.tag
                ));
            }
        }
        if self.pause_min_s > self.pause_max_s {
            return Err("auto_operator.pause_min_s exceeds pause_max_s".to_string());
        }
        Ok(())
    }
}

/// Seeded random threshold manipulation.
#[derive(Debug, Clone)]
pub struct AutoManipulator {
    config: AutoOperatorConfig,
    rng: ChaCha8Rng,
}

impl AutoManipulator {
    pub fn new(config: AutoOperatorConfig) -> Result<Self, String> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self { config, rng })
    }

    /// Pick a setpoint uniformly, then a value from its range.
    pub fn next_command(&mut self) -> OperatorCommand {
        let index = self.rng.gen_range(0..self.config.ranges.len());
        let range = self.config.ranges[index];
        let value = self.rng.gen_range(range.min..=range.max);
        debug!(tag = %range.tag, value, "generated random choice");
        OperatorCommand::SetThreshold {
            tag: range.tag,
            value,
        }
    }

    pub fn next_pause(&mut self) -> Duration {
        let secs = self
            .rng
            .gen_range(self.config.pause_min_s..=self.config.pause_max_s);
        Duration::from_secs(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use bp_core::{MemoryTagStore, ProcessState};
    use proptest::prelude::*;

    #[test]
    fn menu_choices_map_to_tags() {
        let cmd = OperatorCommand::from_choice(2, 0.8).unwrap();
        assert_eq!(cmd.tag(), Tag::TankLevelMax);
        assert_eq!(cmd.value(), 0.8);

        let cmd = OperatorCommand::from_choice(6, 1.0).unwrap();
        assert_eq!(
            cmd,
            OperatorCommand::SetMode {
                actuator: Actuator::ConveyorEngine,
                mode: ActuatorMode::ManualOff
            }
        );
        assert_eq!(cmd.tag(), Tag::ConveyorEngineMode);
    }

    #[test]
    fn invalid_input_is_reported() {
        assert_eq!(
            OperatorCommand::from_choice(7, 1.0),
            Err(OperatorError::InvalidChoice { choice: 7 })
        );
        assert_eq!(
            OperatorCommand::from_choice(0, 1.0),
            Err(OperatorError::InvalidChoice { choice: 0 })
        );
        assert_eq!(
            OperatorCommand::from_choice(1, -0.1),
            Err(OperatorError::NegativeSetpoint { value: -0.1 })
        );
        assert_eq!(
            OperatorCommand::from_choice(4, 4.0),
            Err(OperatorError::InvalidModeCode { value: 4.0 })
        );
        assert!(OperatorCommand::from_choice(5, 2.5).is_err());
    }

    #[test]
    fn zero_setpoint_is_allowed() {
        assert!(OperatorCommand::from_choice(3, 0.0).is_ok());
    }

    #[test]
    fn apply_writes_the_tag() {
        let store = MemoryTagStore::new();
        OperatorCommand::from_choice(4, 2.0)
            .unwrap()
            .apply(&store)
            .unwrap();
        assert_eq!(store.get(Tag::TankInputValveMode).unwrap(), 2.0);
    }

    #[test]
    fn inverted_tank_band_is_rejected_at_entry() {
        let store = MemoryTagStore::with_state(&ProcessState::default());
        let before = store.get(Tag::TankLevelMin).unwrap();
        let max = store.get(Tag::TankLevelMax).unwrap();

        let err = OperatorCommand::from_choice(1, max + 0.1)
            .unwrap()
            .submit(&store)
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Operator(OperatorError::InvertedTankBand { .. })
        ));
        assert_eq!(store.get(Tag::TankLevelMin).unwrap(), before);

        let err = OperatorCommand::from_choice(2, before - 0.1)
            .unwrap()
            .submit(&store)
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Operator(OperatorError::InvertedTankBand { .. })
        ));
        assert_eq!(store.get(Tag::TankLevelMax).unwrap(), max);
    }

    #[test]
    fn band_checks_leave_other_commands_alone() {
        let thresholds = Thresholds {
            tank_level_min: 0.3,
            tank_level_max: 0.7,
            bottle_level_max: 0.9,
        };
        for (choice, value) in [(1, 0.7), (2, 0.3), (3, 0.1), (6, 1.0)] {
            let cmd = OperatorCommand::from_choice(choice, value).unwrap();
            assert_eq!(cmd.validate_against(&thresholds), Ok(()));
        }
        let store = MemoryTagStore::with_state(&ProcessState::default());
        OperatorCommand::from_choice(3, 0.5)
            .unwrap()
            .submit(&store)
            .unwrap();
        assert_eq!(store.get(Tag::BottleLevelMax).unwrap(), 0.5);
    }

    #[test]
    fn manipulator_stays_inside_ranges() {
        let config = AutoOperatorConfig::default();
        let mut auto = AutoManipulator::new(config.clone()).unwrap();
        for _ in 0..100 {
            let cmd = auto.next_command();
            let range = config
                .ranges
                .iter()
                .find(|r| r.tag == cmd.tag())
                .unwrap();
            assert!(cmd.value() >= range.min && cmd.value() <= range.max);
            let pause = auto.next_pause();
            assert!(pause >= Duration::from_secs(5) && pause <= Duration::from_secs(20));
        }
    }

    #[test]
    fn manipulator_rejects_mode_tags() {
        let config = AutoOperatorConfig {
            ranges: vec![SetpointRange {
                tag: Tag::ConveyorEngineMode,
                min: 1.0,
                max: 3.0,
            }],
            ..AutoOperatorConfig::default()
        };
        assert!(AutoManipulator::new(config).is_err());
    }

    proptest! {
        #[test]
        fn choices_outside_menu_never_parse(choice in any::<i64>(), value in 0.0f64..10.0) {
            let parsed = OperatorCommand::from_choice(choice, value);
            if (1..=6).contains(&choice) {
                prop_assert!(parsed.is_ok() || choice >= 4);
            } else {
                prop_assert_eq!(parsed, Err(OperatorError::InvalidChoice { choice }));
            }
        }

        #[test]
        fn setpoints_are_taken_verbatim(choice in 1i64..=3, value in 0.0f64..1e6) {
            let cmd = OperatorCommand::from_choice(choice, value).unwrap();
            prop_assert_eq!(cmd.value(), value);
        }
    }
}
