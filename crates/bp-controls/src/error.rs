//! Error types for control decisions.

use thiserror::Error;

/// Result type for control operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur while deciding actuator commands.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Operator setpoints cannot be used as given.
    #[error("Invalid thresholds: {what}")]
    InvalidThresholds { what: String },
}
