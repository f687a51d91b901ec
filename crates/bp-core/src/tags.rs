//! The fixed tag namespace.
//!
//! Every point of shared process state is addressed by a [`Tag`]. Values on
//! the wire are plain `f64`: booleans are 0/1 and actuator modes use the
//! operator command codes (1 = manual off, 2 = manual on, 3 = auto).

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    TankLevel,
    TankLevelMin,
    TankLevelMax,
    TankInputValveStatus,
    TankInputValveMode,
    TankOutputValveStatus,
    TankOutputValveMode,
    TankOutputFlow,
    BottleLevel,
    BottleLevelMax,
    BottleDistanceToFiller,
    ConveyorEngineStatus,
    ConveyorEngineMode,
}

impl Tag {
    pub const ALL: [Tag; 13] = [
        Tag::TankLevel,
        Tag::TankLevelMin,
        Tag::TankLevelMax,
        Tag::TankInputValveStatus,
        Tag::TankInputValveMode,
        Tag::TankOutputValveStatus,
        Tag::TankOutputValveMode,
        Tag::TankOutputFlow,
        Tag::BottleLevel,
        Tag::BottleLevelMax,
        Tag::BottleDistanceToFiller,
        Tag::ConveyorEngineStatus,
        Tag::ConveyorEngineMode,
    ];

    /// Stable key used by stores and config files.
    pub fn key(self) -> &'static str {
        match self {
            Tag::TankLevel => "tank_level",
            Tag::TankLevelMin => "tank_level_min",
            Tag::TankLevelMax => "tank_level_max",
            Tag::TankInputValveStatus => "tank_input_valve_status",
            Tag::TankInputValveMode => "tank_input_valve_mode",
            Tag::TankOutputValveStatus => "tank_output_valve_status",
            Tag::TankOutputValveMode => "tank_output_valve_mode",
            Tag::TankOutputFlow => "tank_output_flow",
            Tag::BottleLevel => "bottle_level",
            Tag::BottleLevelMax => "bottle_level_max",
            Tag::BottleDistanceToFiller => "bottle_distance_to_filler",
            Tag::ConveyorEngineStatus => "conveyor_engine_status",
            Tag::ConveyorEngineMode => "conveyor_engine_mode",
        }
    }

    pub fn from_key(key: &str) -> CoreResult<Self> {
        Tag::ALL
            .into_iter()
            .find(|tag| tag.key() == key)
            .ok_or_else(|| CoreError::UnknownTag {
                key: key.to_string(),
            })
    }

    /// Value written when a store is first initialized.
    pub fn default_value(self) -> f64 {
        match self {
            Tag::TankLevel => 0.58,
            Tag::TankLevelMin => 0.3,
            Tag::TankLevelMax => 0.7,
            Tag::TankInputValveStatus => 1.0,
            Tag::TankInputValveMode => 3.0,
            Tag::TankOutputValveStatus => 0.0,
            Tag::TankOutputValveMode => 3.0,
            Tag::TankOutputFlow => 0.0,
            Tag::BottleLevel => 0.0,
            Tag::BottleLevelMax => 0.9,
            Tag::BottleDistanceToFiller => 0.0,
            Tag::ConveyorEngineStatus => 0.0,
            Tag::ConveyorEngineMode => 3.0,
        }
    }

    /// Tags whose value is owned by the physical process.
    pub fn is_physical(self) -> bool {
        matches!(
            self,
            Tag::TankLevel | Tag::TankOutputFlow | Tag::BottleLevel | Tag::BottleDistanceToFiller
        )
    }

    /// Tags only an operator is expected to write.
    pub fn is_operator_setting(self) -> bool {
        matches!(
            self,
            Tag::TankLevelMin
                | Tag::TankLevelMax
                | Tag::BottleLevelMax
                | Tag::TankInputValveMode
                | Tag::TankOutputValveMode
                | Tag::ConveyorEngineMode
        )
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
