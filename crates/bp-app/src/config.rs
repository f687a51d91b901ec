//! Plant configuration (YAML).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bp_controls::{ConveyorPolicy, SampleConfig};
use bp_core::{CoreError, ProcessState, Tag};
use bp_coord::{CoordinationRecord, GatePolicy, Owner};
use bp_faults::{CursorPolicy, FaultKind, FaultSequencer, presets};
use bp_physics::PhysicsParams;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::mode::ModePolicy;
use crate::operator::AutoOperatorConfig;

/// How a role combines its fault step with its normal work in fault mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultPlacement {
    /// The fault step runs instead of physics / decision logic.
    Replace,
    BeforeDecision,
    #[default]
    AfterDecision,
}

/// Fault list and cursor settings of one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultPlan {
    pub faults: Vec<FaultKind>,
    #[serde(default)]
    pub policy: CursorPolicy,
    #[serde(default)]
    pub placement: FaultPlacement,
    #[serde(default)]
    pub seed: u64,
}

impl FaultPlan {
    pub fn sequencer(&self) -> AppResult<FaultSequencer> {
        Ok(FaultSequencer::seeded(
            self.faults.clone(),
            self.policy,
            self.seed,
        )?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeConfig {
    pub file: PathBuf,
    pub policy: ModePolicy,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("mode.conf"),
            policy: ModePolicy::ReadOnce,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinationConfig {
    pub file: PathBuf,
    /// Owner holding the first turn.
    pub first: Owner,
    /// Gate controller writes. Off lets each controller run free.
    pub enabled: bool,
    pub poll_interval_ms: u64,
    pub timeout_ms: Option<u64>,
    pub stall_warn_polls: u32,
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("fault_state.json"),
            first: Owner::A,
            enabled: true,
            poll_interval_ms: 100,
            timeout_ms: None,
            stall_warn_polls: 50,
        }
    }
}

impl CoordinationConfig {
    pub fn initial_record(&self) -> CoordinationRecord {
        CoordinationRecord::initial(self.first)
    }

    pub fn gate_policy(&self) -> GatePolicy {
        GatePolicy {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            timeout: self.timeout_ms.map(Duration::from_millis),
            stall_warn_polls: self.stall_warn_polls,
        }
    }
}

/// Everything the plant processes need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    pub physics: PhysicsParams,
    /// Overrides of the built-in tag defaults.
    pub initial_tags: BTreeMap<Tag, f64>,
    pub tick_period_ms: u64,
    pub tag_store: PathBuf,
    pub mode: ModeConfig,
    pub coordination: CoordinationConfig,
    pub conveyor: ConveyorPolicy,
    pub process_faults: FaultPlan,
    pub controller_a_faults: FaultPlan,
    pub controller_b_faults: FaultPlan,
    pub auto_operator: AutoOperatorConfig,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsParams::default(),
            initial_tags: BTreeMap::new(),
            tick_period_ms: 100,
            tag_store: PathBuf::from("plant_tags.json"),
            mode: ModeConfig::default(),
            coordination: CoordinationConfig::default(),
            conveyor: ConveyorPolicy::default(),
            process_faults: FaultPlan {
                faults: presets::process(),
                policy: CursorPolicy::OneShot,
                placement: FaultPlacement::Replace,
                seed: 1,
            },
            controller_a_faults: FaultPlan {
                faults: presets::controller_a(),
                policy: CursorPolicy::Cyclic,
                placement: FaultPlacement::AfterDecision,
                seed: 2,
            },
            controller_b_faults: FaultPlan {
                faults: presets::controller_b(),
                policy: CursorPolicy::Cyclic,
                placement: FaultPlacement::AfterDecision,
                seed: 3,
            },
            auto_operator: AutoOperatorConfig::default(),
        }
    }
}

impl PlantConfig {
    /// Load from a YAML file.
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AppError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: PlantConfig = serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else the built-in plant.
    pub fn load_or_default(path: Option<&Path>) -> AppResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| AppError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| AppError::ConfigWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn validate(&self) -> AppResult<()> {
        self.physics
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self.tick_period_ms == 0 {
            return Err(AppError::Validation(
                "tick_period_ms must be positive".to_string(),
            ));
        }
        if self.coordination.poll_interval_ms == 0 {
            return Err(AppError::Validation(
                "coordination.poll_interval_ms must be positive".to_string(),
            ));
        }

        let state = self.initial_state()?;
        let t = &state.thresholds;
        if t.tank_level_min > t.tank_level_max {
            return Err(AppError::Validation(format!(
                "tank_level_min {} exceeds tank_level_max {}",
                t.tank_level_min, t.tank_level_max
            )));
        }
        for (tag, value) in &self.initial_tags {
            if !value.is_finite() {
                return Err(AppError::Validation(format!(
                    "initial value of {tag} is not finite"
                )));
            }
        }

        for (name, plan) in [
            ("process_faults", &self.process_faults),
            ("controller_a_faults", &self.controller_a_faults),
            ("controller_b_faults", &self.controller_b_faults),
        ] {
            plan.sequencer()
                .map_err(|e| AppError::Validation(format!("{name}: {e}")))?;
        }

        self.auto_operator
            .validate()
            .map_err(AppError::Validation)?;
        Ok(())
    }

    /// Tag values written by `init`: defaults with the configured overrides.
    pub fn initial_values(&self) -> Vec<(Tag, f64)> {
        Tag::ALL
            .into_iter()
            .map(|tag| {
                let value = self
                    .initial_tags
                    .get(&tag)
                    .copied()
                    .unwrap_or_else(|| tag.default_value());
                (tag, value)
            })
            .collect()
    }

    pub fn initial_state(&self) -> AppResult<ProcessState> {
        let values: BTreeMap<Tag, f64> = self.initial_values().into_iter().collect();
        Ok(ProcessState::from_tags(|tag| {
            values
                .get(&tag)
                .copied()
                .ok_or(CoreError::MissingTag { tag })
        })?)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Sample period for the live tick loops.
    pub fn sample_config(&self) -> AppResult<SampleConfig> {
        Ok(SampleConfig::new(self.tick_period().as_secs_f64())?)
    }
}
