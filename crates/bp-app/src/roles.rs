//! Per-tick work of the plant processes.

use std::sync::Arc;
use std::time::Duration;

use bp_controls::{
    ActuatorCommand, Controller, ControllerId, ConveyorController, TankValveController,
};
use bp_core::{ProcessState, Severity, Tag, TagStore, read_state, report, write_changes};
use bp_coord::{CoordinationGate, Owner, TurnStore};
use bp_faults::{AppliedFault, FaultSequencer};
use bp_physics::{PhysicsParams, ProcessEvent, advance};
use tracing::info;

use crate::config::{FaultPlacement, PlantConfig};
use crate::error::AppResult;
use crate::mode::SimulationMode;

/// Inputs of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub tick: u64,
    /// Wall time since the previous tick started; 0 on the first tick.
    pub elapsed_s: f64,
    pub mode: SimulationMode,
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Tags written back to the store.
    pub changed: Vec<(Tag, f64)>,
    pub events: Vec<ProcessEvent>,
    /// Actuator commands that changed an actuator.
    pub commands: Vec<ActuatorCommand>,
    pub fault: Option<AppliedFault>,
    /// Time spent waiting for the coordination turn.
    pub waited: Option<Duration>,
}

impl TickReport {
    /// Stall requested by an injected delay fault.
    pub fn delay(&self) -> Option<Duration> {
        self.fault.as_ref().and_then(|f| f.delay)
    }
}

/// One periodic participant of the plant.
pub trait TickRole: Send {
    fn name(&self) -> &str;

    fn tick(&mut self, ctx: &TickContext) -> AppResult<TickReport>;
}

/// Which steps run this tick.
fn plan(mode: SimulationMode, placement: FaultPlacement) -> (bool, bool, bool) {
    if !mode.is_faults() {
        return (false, true, false);
    }
    match placement {
        FaultPlacement::Replace => (false, false, true),
        FaultPlacement::BeforeDecision => (true, true, false),
        FaultPlacement::AfterDecision => (false, true, true),
    }
}

fn apply_fault(
    faults: &mut FaultSequencer,
    state: &mut ProcessState,
    report: &mut TickReport,
) -> AppResult<()> {
    if let Some(applied) = faults.apply_next(state)?.applied {
        report.fault = Some(applied);
    }
    Ok(())
}

/// Owns the physical process: advances it, or perturbs it in fault mode.
pub struct ProcessRole {
    params: PhysicsParams,
    store: Arc<dyn TagStore>,
    faults: FaultSequencer,
    placement: FaultPlacement,
}

impl ProcessRole {
    pub fn new(
        params: PhysicsParams,
        store: Arc<dyn TagStore>,
        faults: FaultSequencer,
        placement: FaultPlacement,
    ) -> AppResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            store,
            faults,
            placement,
        })
    }

    pub fn from_config(config: &PlantConfig, store: Arc<dyn TagStore>) -> AppResult<Self> {
        Self::new(
            config.physics.clone(),
            store,
            config.process_faults.sequencer()?,
            config.process_faults.placement,
        )
    }
}

impl TickRole for ProcessRole {
    fn name(&self) -> &str {
        "factory"
    }

    fn tick(&mut self, ctx: &TickContext) -> AppResult<TickReport> {
        let before = read_state(&*self.store)?;
        let mut state = before.clone();
        let mut out = TickReport::default();
        let (fault_first, physics, fault_after) = plan(ctx.mode, self.placement);

        if fault_first {
            apply_fault(&mut self.faults, &mut state, &mut out)?;
        }
        if physics {
            let step = advance(&self.params, &state, ctx.elapsed_s)?;
            state = step.state;
            out.events = step.events;
        }
        if fault_after {
            apply_fault(&mut self.faults, &mut state, &mut out)?;
        }

        for event in &out.events {
            let severity = event.severity().escalated(ctx.mode.is_faults());
            report(severity, &event.message(), event.context().as_deref());
        }
        out.changed = write_changes(&*self.store, &before, &state)?;
        Ok(out)
    }
}

pub fn owner_of(id: ControllerId) -> Owner {
    match id {
        ControllerId::A => Owner::A,
        ControllerId::B => Owner::B,
    }
}

/// One controller: gated read, decide, write, hand over the turn.
pub struct ControllerRole {
    name: String,
    controller: Box<dyn Controller>,
    store: Arc<dyn TagStore>,
    gate: Option<CoordinationGate>,
    faults: FaultSequencer,
    placement: FaultPlacement,
}

impl ControllerRole {
    pub fn new(
        controller: Box<dyn Controller>,
        store: Arc<dyn TagStore>,
        gate: Option<CoordinationGate>,
        faults: FaultSequencer,
        placement: FaultPlacement,
    ) -> Self {
        Self {
            name: controller.id().to_string(),
            controller,
            store,
            gate,
            faults,
            placement,
        }
    }

    /// Build Controller A or B from `config`. `turns` is `None` to run ungated.
    pub fn from_config(
        config: &PlantConfig,
        id: ControllerId,
        store: Arc<dyn TagStore>,
        turns: Option<Arc<dyn TurnStore>>,
    ) -> AppResult<Self> {
        let reach = config.physics.filler_reach;
        let (controller, plan): (Box<dyn Controller>, _) = match id {
            ControllerId::A => (
                Box::new(TankValveController::new(reach)?),
                &config.controller_a_faults,
            ),
            ControllerId::B => (
                Box::new(ConveyorController::new(reach, config.conveyor)?),
                &config.controller_b_faults,
            ),
        };
        let gate = turns.map(|store| CoordinationGate::new(store, config.coordination.gate_policy()));
        Ok(Self::new(
            controller,
            store,
            gate,
            plan.sequencer()?,
            plan.placement,
        ))
    }

    pub fn gate(&self) -> Option<&CoordinationGate> {
        self.gate.as_ref()
    }

    fn decide_and_write(&mut self, ctx: &TickContext) -> AppResult<TickReport> {
        let before = read_state(&*self.store)?;
        let mut state = before.clone();
        let mut out = TickReport::default();
        let (fault_first, decide, fault_after) = plan(ctx.mode, self.placement);

        if fault_first {
            apply_fault(&mut self.faults, &mut state, &mut out)?;
        }
        if decide {
            let decision = self.controller.decide(&state)?;
            out.commands = decision.apply(&mut state);
            for command in &out.commands {
                info!(controller = %self.name, actuator = %command.actuator, on = command.on, "{command}");
            }
        }
        if fault_after {
            apply_fault(&mut self.faults, &mut state, &mut out)?;
        }
        if ctx.mode.is_faults() {
            self.faults.enforce_overrides(&mut state);
        }

        out.changed = write_changes(&*self.store, &before, &state)?;
        Ok(out)
    }
}

impl TickRole for ControllerRole {
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&mut self, ctx: &TickContext) -> AppResult<TickReport> {
        let owner = owner_of(self.controller.id());
        let waited = match self.gate.as_mut() {
            Some(gate) => Some(gate.wait_for_turn(owner)?),
            None => None,
        };

        // The turn is handed over even when the tick fails, so the other
        // controller never waits on a skipped tick.
        let outcome = self.decide_and_write(ctx);
        if let Some(gate) = self.gate.as_mut() {
            gate.signal_done(owner)?;
        }
        let mut out = outcome?;
        out.waited = waited;
        Ok(out)
    }
}

/// Log a finished tick at a level matching what happened in it.
pub(crate) fn log_report(role: &str, out: &TickReport) {
    if let Some(fault) = &out.fault {
        tracing::debug!(role, fault = fault.name, index = fault.index, "fault step done");
    }
    if !out.changed.is_empty() {
        tracing::debug!(role, changed = out.changed.len(), "tags written");
    }
    if let Some(waited) = out.waited
        && waited > Duration::from_secs(1)
    {
        report(
            Severity::Warning,
            "long wait for coordination turn",
            Some(&format!("{role} waited {:.2} s", waited.as_secs_f64())),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bp_core::{Actuator, ActuatorMode, MemoryTagStore};
    use bp_coord::MemoryTurnStore;
    use bp_faults::{CursorPolicy, FaultKind, StickState};

    fn ctx(mode: SimulationMode, elapsed_s: f64) -> TickContext {
        TickContext {
            tick: 1,
            elapsed_s,
            mode,
        }
    }

    fn store_with(state: &ProcessState) -> Arc<MemoryTagStore> {
        Arc::new(MemoryTagStore::with_state(state))
    }

    #[test]
    fn process_tick_advances_physics_in_normal_mode() {
        let mut state = ProcessState::default();
        state.tank_level = 0.5;
        state.tank_input_valve_status = true;
        state.tank_output_valve_status = false;
        state.conveyor_engine_status = false;
        let store = store_with(&state);
        let config = PlantConfig::default();
        let mut role = ProcessRole::from_config(&config, store.clone()).unwrap();

        let out = role.tick(&ctx(SimulationMode::Normal, 1.0)).unwrap();

        assert!((store.get(Tag::TankLevel).unwrap() - 0.6).abs() < 1e-12);
        assert!(out.fault.is_none());
        assert!(out.changed.iter().all(|(tag, _)| tag.is_physical()));
    }

    #[test]
    fn process_tick_replaces_physics_with_fault() {
        let state = ProcessState::default();
        let store = store_with(&state);
        let sticking = FaultSequencer::seeded(
            vec![FaultKind::Sticking {
                actuators: vec![Actuator::ConveyorEngine],
                state: StickState::On,
            }],
            CursorPolicy::OneShot,
            0,
        )
        .unwrap();
        let mut role = ProcessRole::new(
            PhysicsParams::default(),
            store.clone(),
            sticking,
            FaultPlacement::Replace,
        )
        .unwrap();

        let out = role.tick(&ctx(SimulationMode::Faults, 10.0)).unwrap();
        assert_eq!(out.changed, vec![(Tag::ConveyorEngineStatus, 1.0)]);
        assert_eq!(store.get(Tag::TankLevel).unwrap(), state.tank_level);

        // Exhausted one-shot list: nothing at all happens.
        let out = role.tick(&ctx(SimulationMode::Faults, 10.0)).unwrap();
        assert!(out.changed.is_empty());
    }

    #[test]
    fn controller_writes_only_changed_actuators() {
        let mut state = ProcessState::default();
        state.tank_level = 0.1;
        state.tank_input_valve_status = false;
        let store = store_with(&state);
        let mut role = ControllerRole::from_config(
            &PlantConfig::default(),
            ControllerId::A,
            store.clone(),
            None,
        )
        .unwrap();

        let out = role.tick(&ctx(SimulationMode::Normal, 0.1)).unwrap();
        assert!(out
            .changed
            .iter()
            .any(|&(tag, value)| tag == Tag::TankInputValveStatus && value == 1.0));
        assert!(out.changed.iter().all(|(tag, _)| !tag.is_physical()));
    }

    #[test]
    fn sticking_override_beats_decision_logic() {
        let mut state = ProcessState::default();
        state.bottle_distance_to_filler = 3.0;
        state.conveyor_engine_status = false;
        state.conveyor_engine_mode = ActuatorMode::Auto;
        let store = store_with(&state);
        let stuck = FaultSequencer::seeded(
            vec![FaultKind::Sticking {
                actuators: vec![Actuator::ConveyorEngine],
                state: StickState::Off,
            }],
            CursorPolicy::Cyclic,
            0,
        )
        .unwrap();
        let mut role = ControllerRole::new(
            Box::new(ConveyorController::default()),
            store.clone(),
            None,
            stuck,
            FaultPlacement::BeforeDecision,
        );

        role.tick(&ctx(SimulationMode::Faults, 0.1)).unwrap();
        assert_eq!(store.get(Tag::ConveyorEngineStatus).unwrap(), 0.0);

        role.tick(&ctx(SimulationMode::Normal, 0.1)).unwrap();
        assert_eq!(store.get(Tag::ConveyorEngineStatus).unwrap(), 1.0);
    }

    #[test]
    fn gated_controller_hands_turn_over_even_on_failure() {
        let mut state = ProcessState::default();
        state.thresholds.tank_level_min = 0.9;
        state.thresholds.tank_level_max = 0.1;
        let store = store_with(&state);
        let turns = MemoryTurnStore::default();
        let mut role = ControllerRole::from_config(
            &PlantConfig::default(),
            ControllerId::A,
            store,
            Some(Arc::new(turns.clone())),
        )
        .unwrap();

        assert!(role.tick(&ctx(SimulationMode::Normal, 0.1)).is_err());
        assert_eq!(turns.read().unwrap().turn(), Owner::B);
    }
}
