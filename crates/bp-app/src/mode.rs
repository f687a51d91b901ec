//! Simulation mode file (`mode=<normal|faults>`).

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    #[default]
    Normal,
    Faults,
}

impl SimulationMode {
    pub fn is_faults(self) -> bool {
        self == SimulationMode::Faults
    }

    fn from_value(value: &str) -> Option<Self> {
        match value.trim() {
            "normal" => Some(SimulationMode::Normal),
            "faults" => Some(SimulationMode::Faults),
            _ => None,
        }
    }
}

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationMode::Normal => f.write_str("normal"),
            SimulationMode::Faults => f.write_str("faults"),
        }
    }
}

/// When the mode file is consulted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModePolicy {
    #[default]
    ReadOnce,
    PollEachTick,
}

/// Mode from file content. The first `mode=` line decides; anything
/// unrecognised is `None`.
pub fn parse_mode(content: &str) -> Option<SimulationMode> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("mode="))
        .and_then(SimulationMode::from_value)
}

/// Read the mode file, falling back to `Normal` when it is missing or malformed.
pub fn read_mode_file(path: &Path) -> SimulationMode {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_mode(&content).unwrap_or_else(|| {
            warn!(path = %path.display(), "mode file has no valid mode= line, using normal");
            SimulationMode::Normal
        }),
        Err(e) => {
            error!(path = %path.display(), error = %e, "Error reading simulation mode, using normal");
            SimulationMode::Normal
        }
    }
}

pub fn write_mode_file(path: &Path, mode: SimulationMode) -> AppResult<()> {
    std::fs::write(path, format!("mode={mode}\n")).map_err(|source| AppError::ConfigWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Mode lookups for a tick loop.
#[derive(Debug, Clone)]
pub struct ModeSource {
    path: Option<PathBuf>,
    policy: ModePolicy,
    cached: Option<SimulationMode>,
}

impl ModeSource {
    pub fn from_file(path: impl Into<PathBuf>, policy: ModePolicy) -> Self {
        Self {
            path: Some(path.into()),
            policy,
            cached: None,
        }
    }

    /// Always `mode`, no file involved.
    pub fn fixed(mode: SimulationMode) -> Self {
        Self {
            path: None,
            policy: ModePolicy::ReadOnce,
            cached: Some(mode),
        }
    }

    pub fn current(&mut self) -> SimulationMode {
        let Some(path) = &self.path else {
            return self.cached.unwrap_or_default();
        };
        match (self.policy, self.cached) {
            (ModePolicy::ReadOnce, Some(mode)) => mode,
            _ => {
                let mode = read_mode_file(path);
                if self.cached != Some(mode) {
                    info!(%mode, "simulation mode");
                }
                self.cached = Some(mode);
                mode
            }
        }
    }
}
