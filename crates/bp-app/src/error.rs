//! Error types for the bp-app service layer.

use std::path::PathBuf;

use crate::operator::OperatorError;

/// Application error wrapping the backend crates' errors for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write config file: {path}")]
    ConfigWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Config validation failed: {0}")]
    Validation(String),

    #[error("Tag store error: {0}")]
    Core(#[from] bp_core::CoreError),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Control error: {0}")]
    Control(String),

    #[error("Fault injection error: {0}")]
    Fault(String),

    #[error("Coordination error: {0}")]
    Coordination(#[from] bp_coord::CoordError),

    #[error("Operator error: {0}")]
    Operator(#[from] OperatorError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bp-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<bp_physics::SimError> for AppError {
    fn from(err: bp_physics::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<bp_controls::ControlError> for AppError {
    fn from(err: bp_controls::ControlError) -> Self {
        AppError::Control(err.to_string())
    }
}

impl From<bp_faults::FaultError> for AppError {
    fn from(err: bp_faults::FaultError) -> Self {
        AppError::Fault(err.to_string())
    }
}
