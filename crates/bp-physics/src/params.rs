//! Plant constants.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Physical constants of the tank, bottle and conveyor.
///
/// Volumes are in plant units, rates in units per second, distances in
/// track units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    /// Tank volume at level 1.0.
    pub tank_capacity: f64,
    /// Highest tank level before overflow.
    pub tank_max_level: f64,
    /// Inflow while the input valve is open.
    pub tank_input_flow_rate: f64,
    /// Outflow while the output valve is open and the tank is not empty.
    pub tank_output_flow_rate: f64,
    /// Bottle volume at level 1.0.
    pub bottle_capacity: f64,
    /// Highest bottle level before overflow.
    pub bottle_max_level: f64,
    /// Conveyor loop length; distances wrap modulo this value.
    pub track_length: f64,
    /// Belt speed while the engine runs.
    pub conveyor_speed: f64,
    /// A bottle is under the filler while its distance is at most this.
    pub filler_reach: f64,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            tank_capacity: 10.0,
            tank_max_level: 1.0,
            tank_input_flow_rate: 1.0,
            tank_output_flow_rate: 0.5,
            bottle_capacity: 2.0,
            bottle_max_level: 1.0,
            track_length: 5.0,
            conveyor_speed: 0.5,
            filler_reach: 1.0,
        }
    }
}

impl PhysicsParams {
    pub fn validate(&self) -> SimResult<()> {
        let positive = [
            (self.tank_capacity, "tank_capacity must be positive"),
            (self.tank_max_level, "tank_max_level must be positive"),
            (self.bottle_capacity, "bottle_capacity must be positive"),
            (self.bottle_max_level, "bottle_max_level must be positive"),
            (self.track_length, "track_length must be positive"),
        ];
        for (value, what) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::NonPhysical { what });
            }
        }

        let non_negative = [
            (self.tank_input_flow_rate, "tank_input_flow_rate must be non-negative"),
            (self.tank_output_flow_rate, "tank_output_flow_rate must be non-negative"),
            (self.conveyor_speed, "conveyor_speed must be non-negative"),
            (self.filler_reach, "filler_reach must be non-negative"),
        ];
        for (value, what) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SimError::NonPhysical { what });
            }
        }

        if self.filler_reach >= self.track_length {
            return Err(SimError::NonPhysical {
                what: "filler_reach must be shorter than the track",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        PhysicsParams::default().validate().unwrap();
    }

    #[test]
    fn zero_capacity_rejected() {
        let params = PhysicsParams {
            tank_capacity: 0.0,
            ..PhysicsParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(SimError::NonPhysical { .. })
        ));
    }

    #[test]
    fn nan_rate_rejected() {
        let params = PhysicsParams {
            conveyor_speed: f64::NAN,
            ..PhysicsParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn filler_must_fit_on_track() {
        let params = PhysicsParams {
            filler_reach: 6.0,
            ..PhysicsParams::default()
        };
        assert!(params.validate().is_err());
    }
}
