//! One step of the tank / bottle / conveyor process.

use bp_core::numeric::{Breach, saturate};
use bp_core::{ProcessState, ensure_finite};

use crate::error::{SimError, SimResult};
use crate::events::ProcessEvent;
use crate::params::PhysicsParams;

/// Result of advancing the process once.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub state: ProcessState,
    pub events: Vec<ProcessEvent>,
}

/// Advance the physical process by `elapsed_s` seconds.
///
/// Pure: the result depends only on the arguments. Only the physical tags
/// (`tank_level`, `tank_output_flow`, `bottle_level`,
/// `bottle_distance_to_filler`) are changed; actuators, modes and thresholds
/// are copied through.
///
/// Levels leave the step clamped into `[0, max_level]`, whatever they were on
/// the way in. The bottle fill uses the output flow reported on entry, so a
/// corrupted flow reading reaches the bottle.
///
/// # Errors
///
/// `ClockRegression` for negative `elapsed_s`, `InvalidArg` for a non-finite one.
pub fn advance(params: &PhysicsParams, state: &ProcessState, elapsed_s: f64) -> SimResult<Step> {
    ensure_finite(elapsed_s, "elapsed_s").map_err(|_| SimError::InvalidArg {
        what: "elapsed_s must be finite",
    })?;
    if elapsed_s < 0.0 {
        return Err(SimError::ClockRegression { elapsed_s });
    }
    params.validate()?;

    let mut next = state.clone();
    let mut events = Vec::new();
    if elapsed_s == 0.0 {
        return Ok(Step {
            state: next,
            events,
        });
    }

    // Tank
    let mut tank_delta = 0.0;
    if state.tank_input_valve_status {
        tank_delta += params.tank_input_flow_rate * elapsed_s;
    }
    if state.tank_output_valve_status {
        tank_delta -= params.tank_output_flow_rate * elapsed_s;
    }
    let tank_level_raw = state.tank_level + tank_delta / params.tank_capacity;
    let (tank_level, breach) = saturate(tank_level_raw, 0.0, params.tank_max_level);
    match breach {
        Breach::Above => events.push(ProcessEvent::TankOverflow { level: tank_level }),
        Breach::Below => events.push(ProcessEvent::TankEmpty),
        Breach::NotANumber => events.push(ProcessEvent::TankLevelInvalid),
        Breach::None => {}
    }
    next.tank_level = tank_level;

    next.tank_output_flow = if state.tank_output_valve_status && tank_level_raw > 0.0 {
        params.tank_output_flow_rate
    } else {
        0.0
    };

    // Bottle
    let mut bottle_level_raw = state.bottle_level;
    if state.bottle_distance_to_filler > params.filler_reach {
        if state.tank_output_flow != 0.0 {
            events.push(ProcessEvent::WaterWasted {
                flow: state.tank_output_flow,
            });
        }
    } else {
        bottle_level_raw += state.tank_output_flow * elapsed_s / params.bottle_capacity;
    }
    // Underflow is clamped silently; only the tank reports running dry.
    let (bottle_level, breach) = saturate(bottle_level_raw, 0.0, params.bottle_max_level);
    match breach {
        Breach::Above => events.push(ProcessEvent::BottleOverflow {
            level: bottle_level,
        }),
        Breach::NotANumber => events.push(ProcessEvent::BottleLevelInvalid),
        Breach::Below | Breach::None => {}
    }
    next.bottle_level = bottle_level;

    // Conveyor
    if state.conveyor_engine_status {
        let travelled = state.bottle_distance_to_filler - params.conveyor_speed * elapsed_s;
        let wrapped = travelled.rem_euclid(params.track_length);
        // rem_euclid of a tiny negative rounds up to the modulus itself.
        next.bottle_distance_to_filler = if wrapped >= params.track_length {
            0.0
        } else {
            wrapped
        };
        if travelled < 0.0 {
            events.push(ProcessEvent::BottleReplaced {
                filled_level: next.bottle_level,
            });
            next.bottle_level = 0.0;
        }
    }

    Ok(Step {
        state: next,
        events,
    })
}
