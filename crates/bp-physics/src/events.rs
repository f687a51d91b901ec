//! Observable process events.

use bp_core::Severity;
use serde::{Deserialize, Serialize};

/// Something noteworthy that happened during one process step.
///
/// Events never stop the process; the caller decides how loudly to report them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ProcessEvent {
    /// Tank level saturated at its maximum.
    TankOverflow { level: f64 },
    /// Tank level bottomed out at zero.
    TankEmpty,
    /// Water flowed while no bottle was under the filler.
    WaterWasted { flow: f64 },
    /// Bottle level saturated at its maximum.
    BottleOverflow { level: f64 },
    /// A level reading was NaN and could not be clamped.
    TankLevelInvalid,
    BottleLevelInvalid,
    /// The conveyor carried the bottle past the end of the track and a new,
    /// empty bottle entered.
    BottleReplaced { filled_level: f64 },
}

impl ProcessEvent {
    pub fn severity(&self) -> Severity {
        match self {
            ProcessEvent::BottleReplaced { .. } => Severity::Info,
            _ => Severity::Warning,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ProcessEvent::TankOverflow { .. } => "Tank water overflowed".to_string(),
            ProcessEvent::TankEmpty => "Tank water is empty".to_string(),
            ProcessEvent::WaterWasted { .. } => "Water is wasting".to_string(),
            ProcessEvent::BottleOverflow { .. } => "Bottle water overflowed".to_string(),
            ProcessEvent::TankLevelInvalid => "Tank level is not a number".to_string(),
            ProcessEvent::BottleLevelInvalid => "Bottle level is not a number".to_string(),
            ProcessEvent::BottleReplaced { filled_level } => {
                format!("Bottle left the line at level {filled_level:.2}")
            }
        }
    }

    /// Free-text detail for the log sink.
    pub fn context(&self) -> Option<String> {
        match self {
            ProcessEvent::TankOverflow { level } | ProcessEvent::BottleOverflow { level } => {
                Some(format!("level={level:.3}"))
            }
            ProcessEvent::WaterWasted { flow } => Some(format!("flow={flow:.3}")),
            ProcessEvent::TankEmpty
            | ProcessEvent::TankLevelInvalid
            | ProcessEvent::BottleLevelInvalid
            | ProcessEvent::BottleReplaced { .. } => None,
        }
    }
}
