//! Error types for process model operations.

use thiserror::Error;

/// Errors encountered while advancing the physical process.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Clock regression: elapsed time {elapsed_s} s is negative")]
    ClockRegression { elapsed_s: f64 },

    #[error("Non-physical parameter: {what}")]
    NonPhysical { what: &'static str },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<bp_core::CoreError> for SimError {
    fn from(e: bp_core::CoreError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}
