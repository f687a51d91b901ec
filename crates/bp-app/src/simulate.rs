//! Offline closed-loop run of the whole plant.

use std::sync::Arc;
use std::time::Duration;

use bp_controls::ControllerId;
use bp_core::{MemoryTagStore, ProcessState, Tag, TagStore, read_state};
use bp_coord::{MemoryTurnStore, Owner, TurnStore};
use bp_physics::ProcessEvent;
use tracing::warn;

use crate::config::PlantConfig;
use crate::error::{AppError, AppResult};
use crate::mode::SimulationMode;
use crate::roles::{ControllerRole, ProcessRole, TickContext, TickReport, TickRole};

/// Options for simulation runs.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Fixed tick length (seconds)
    pub dt: f64,
    /// Final simulation time (seconds)
    pub t_end: f64,
    /// Maximum number of ticks (safety limit)
    pub max_steps: usize,
    /// Record every N-th tick (decimation)
    pub record_every: usize,
    pub mode: SimulationMode,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: 0.1,
            t_end: 60.0,
            max_steps: 100_000,
            record_every: 1,
            mode: SimulationMode::Normal,
        }
    }
}

/// Record of simulation results.
#[derive(Clone, Debug, Default)]
pub struct SimRecord {
    /// Time points (seconds)
    pub t: Vec<f64>,
    /// State snapshots
    pub x: Vec<ProcessState>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimCounters {
    pub steps: usize,
    /// Bottles that left the filler at or above `bottle_level_max`.
    pub bottles_filled: usize,
    /// Every bottle that left the line.
    pub bottles_shipped: usize,
    pub process_events: usize,
    pub actuator_commands: usize,
    pub faults_applied: usize,
    /// Sum of the stalls delay faults asked for. Not slept.
    pub injected_delay: Duration,
    pub failed_ticks: usize,
}

#[derive(Clone, Debug)]
pub struct SimOutcome {
    pub record: SimRecord,
    pub counters: SimCounters,
}

/// Run process, Controller A and Controller B in lock-step on shared
/// in-memory stores.
///
/// Each tick runs the process first, then A, then B, so the coordination
/// gate never has to wait.
pub fn simulate(config: &PlantConfig, opts: &SimOptions) -> AppResult<SimOutcome> {
    if !(opts.dt.is_finite() && opts.dt > 0.0) {
        return Err(AppError::InvalidInput("dt must be positive".to_string()));
    }
    if !(opts.t_end.is_finite() && opts.t_end >= 0.0) {
        return Err(AppError::InvalidInput(
            "t_end must be non-negative".to_string(),
        ));
    }
    if opts.max_steps == 0 || opts.record_every == 0 {
        return Err(AppError::InvalidInput(
            "max_steps and record_every must be positive".to_string(),
        ));
    }
    config.validate()?;

    let store = Arc::new(MemoryTagStore::new());
    store.initialize(&config.initial_values())?;
    let turns: Arc<dyn TurnStore> =
        Arc::new(MemoryTurnStore::new(config.coordination.initial_record()));
    let tags: Arc<dyn TagStore> = store.clone();

    let mut sim_config = config.clone();
    sim_config.coordination.timeout_ms = Some(0);
    let gated = |turns: &Arc<dyn TurnStore>| {
        sim_config.coordination.enabled.then(|| Arc::clone(turns))
    };

    let mut process = ProcessRole::from_config(&sim_config, tags.clone())?;
    let mut controller_a =
        ControllerRole::from_config(&sim_config, ControllerId::A, tags.clone(), gated(&turns))?;
    let mut controller_b =
        ControllerRole::from_config(&sim_config, ControllerId::B, tags.clone(), gated(&turns))?;

    // The first turn may belong to B.
    let mut order: [&mut dyn TickRole; 3] = match config.coordination.first {
        Owner::A => [&mut process, &mut controller_a, &mut controller_b],
        Owner::B => [&mut process, &mut controller_b, &mut controller_a],
    };

    let mut counters = SimCounters::default();
    let mut t = 0.0;
    let mut record = SimRecord {
        t: vec![t],
        x: vec![read_state(&*store)?],
    };

    let mut step = 0;
    while t < opts.t_end && step < opts.max_steps {
        let ctx = TickContext {
            tick: step as u64,
            elapsed_s: opts.dt,
            mode: opts.mode,
        };
        for role in order.iter_mut() {
            match role.tick(&ctx) {
                Ok(out) => tally(&mut counters, &out, &*store)?,
                Err(e) => {
                    warn!(role = role.name(), tick = step, error = %e, "tick failed");
                    counters.failed_ticks += 1;
                }
            }
        }
        t += opts.dt;
        step += 1;

        if step % opts.record_every == 0 {
            record.t.push(t);
            record.x.push(read_state(&*store)?);
        }
    }

    // Always record final state
    if step % opts.record_every != 0 {
        record.t.push(t);
        record.x.push(read_state(&*store)?);
    }
    counters.steps = step;

    Ok(SimOutcome { record, counters })
}

fn tally(counters: &mut SimCounters, out: &TickReport, store: &MemoryTagStore) -> AppResult<()> {
    counters.process_events += out.events.len();
    counters.actuator_commands += out.commands.len();
    if let Some(fault) = &out.fault {
        counters.faults_applied += 1;
        counters.injected_delay += fault.delay.unwrap_or_default();
    }
    for event in &out.events {
        if let ProcessEvent::BottleReplaced { filled_level } = event {
            counters.bottles_shipped += 1;
            let full = store.get(Tag::BottleLevelMax)?;
            if *filled_level >= full {
                counters.bottles_filled += 1;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_options_defaults() {
        let opts = SimOptions::default();
        assert_eq!(opts.dt, 0.1);
        assert_eq!(opts.record_every, 1);
        assert_eq!(opts.mode, SimulationMode::Normal);
    }

    #[test]
    fn sim_options_invalid() {
        let config = PlantConfig::default();
        for opts in [
            SimOptions {
                dt: 0.0,
                ..SimOptions::default()
            },
            SimOptions {
                t_end: -1.0,
                ..SimOptions::default()
            },
            SimOptions {
                record_every: 0,
                ..SimOptions::default()
            },
        ] {
            assert!(matches!(
                simulate(&config, &opts),
                Err(AppError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn decimated_record_keeps_final_state() {
        let opts = SimOptions {
            dt: 0.1,
            t_end: 1.05,
            record_every: 4,
            ..SimOptions::default()
        };
        let outcome = simulate(&PlantConfig::default(), &opts).unwrap();
        assert_eq!(outcome.counters.steps, 11);
        assert_eq!(outcome.record.t.len(), 1 + 2 + 1);
        assert_eq!(outcome.record.t.len(), outcome.record.x.len());
    }
}
