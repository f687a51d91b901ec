use bp_core::CoreError;
use thiserror::Error;

pub type FaultResult<T> = Result<T, FaultError>;

#[derive(Error, Debug)]
pub enum FaultError {
    #[error("Invalid fault #{index}: {what}")]
    InvalidFault { index: usize, what: &'static str },

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}
