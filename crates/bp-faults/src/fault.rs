//! Fault specifications.

use bp_core::{Actuator, Severity, Tag};
use serde::{Deserialize, Serialize};

use crate::error::{FaultError, FaultResult};

/// State a sticking fault pins its actuators to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StickState {
    Off,
    On,
    /// One coin flip per application, shared by every listed actuator.
    Random,
}

/// One entry of a fault list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FaultKind {
    /// Adds uniform noise in `[-amplitude, amplitude]` to a level reading.
    SensorDrift { target: Tag, amplitude: f64 },
    /// Removes a uniform amount in `[min, max]` from a level, floored at 0.
    Leak { target: Tag, min: f64, max: f64 },
    /// Pins actuators until the next fault step.
    Sticking {
        actuators: Vec<Actuator>,
        state: StickState,
    },
    /// Overwrites a physical reading with an integer in `[min, max]`.
    Corruption { target: Tag, min: u32, max: u32 },
    /// Stalls the issuing tick for a uniform duration in `[min_s, max_s]`.
    Delay { min_s: f64, max_s: f64 },
}

impl FaultKind {
    pub fn name(&self) -> &'static str {
        match self {
            FaultKind::SensorDrift { .. } => "sensor drift",
            FaultKind::Leak { .. } => "leak",
            FaultKind::Sticking { .. } => "sticking",
            FaultKind::Corruption { .. } => "memory corruption",
            FaultKind::Delay { .. } => "overheating delay",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            FaultKind::SensorDrift { .. } | FaultKind::Leak { .. } => Severity::Warning,
            FaultKind::Sticking { .. } => Severity::Error,
            FaultKind::Corruption { .. } | FaultKind::Delay { .. } => Severity::Critical,
        }
    }

    pub(crate) fn validate(&self, index: usize) -> FaultResult<()> {
        let invalid = |what| Err(FaultError::InvalidFault { index, what });
        match self {
            FaultKind::SensorDrift { target, amplitude } => {
                if !is_level(*target) {
                    return invalid("sensor drift must target tank_level or bottle_level");
                }
                if !(amplitude.is_finite() && *amplitude >= 0.0) {
                    return invalid("drift amplitude must be finite and non-negative");
                }
            }
            FaultKind::Leak { target, min, max } => {
                if !is_level(*target) {
                    return invalid("leak must target tank_level or bottle_level");
                }
                if !(min.is_finite() && max.is_finite() && 0.0 <= *min && min <= max) {
                    return invalid("leak range must satisfy 0 <= min <= max");
                }
            }
            FaultKind::Sticking { actuators, .. } => {
                if actuators.is_empty() {
                    return invalid("sticking needs at least one actuator");
                }
            }
            FaultKind::Corruption { target, min, max } => {
                if !target.is_physical() {
                    return invalid("corruption must target a physical tag");
                }
                if min > max {
                    return invalid("corruption range must satisfy min <= max");
                }
            }
            FaultKind::Delay { min_s, max_s } => {
                if !(min_s.is_finite() && max_s.is_finite() && 0.0 <= *min_s && min_s <= max_s) {
                    return invalid("delay range must satisfy 0 <= min_s <= max_s");
                }
            }
        }
        Ok(())
    }
}

fn is_level(tag: Tag) -> bool {
    matches!(tag, Tag::TankLevel | Tag::BottleLevel)
}

/// Built-in fault lists of the plant roles.
pub mod presets {
    use super::*;

    /// Process owner: walks every fault class once.
    pub fn process() -> Vec<FaultKind> {
        vec![
            FaultKind::SensorDrift {
                target: Tag::TankLevel,
                amplitude: 0.05,
            },
            FaultKind::Leak {
                target: Tag::TankLevel,
                min: 0.01,
                max: 0.02,
            },
            FaultKind::Sticking {
                actuators: vec![Actuator::ConveyorEngine],
                state: StickState::Off,
            },
            FaultKind::Sticking {
                actuators: vec![Actuator::TankInputValve, Actuator::TankOutputValve],
                state: StickState::Random,
            },
            FaultKind::Corruption {
                target: Tag::TankOutputFlow,
                min: 0,
                max: 100,
            },
            FaultKind::Delay {
                min_s: 2.0,
                max_s: 2.0,
            },
        ]
    }

    /// Controller A: tank-side faults.
    pub fn controller_a() -> Vec<FaultKind> {
        vec![
            FaultKind::SensorDrift {
                target: Tag::TankLevel,
                amplitude: 0.05,
            },
            FaultKind::Leak {
                target: Tag::TankLevel,
                min: 0.01,
                max: 0.05,
            },
            FaultKind::Delay {
                min_s: 1.0,
                max_s: 3.0,
            },
            FaultKind::Sticking {
                actuators: vec![Actuator::TankInputValve, Actuator::TankOutputValve],
                state: StickState::Random,
            },
        ]
    }

    /// Controller B: bottle and conveyor faults.
    pub fn controller_b() -> Vec<FaultKind> {
        vec![
            FaultKind::SensorDrift {
                target: Tag::BottleLevel,
                amplitude: 0.05,
            },
            FaultKind::Sticking {
                actuators: vec![Actuator::ConveyorEngine],
                state: StickState::Off,
            },
            FaultKind::Corruption {
                target: Tag::TankOutputFlow,
                min: 0,
                max: 100,
            },
            FaultKind::Delay {
                min_s: 2.0,
                max_s: 2.0,
            },
        ]
    }
}
