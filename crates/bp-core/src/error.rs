use std::path::PathBuf;

use thiserror::Error;

use crate::tags::Tag;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Unknown tag key: {key}")]
    UnknownTag { key: String },

    #[error("Tag {tag} has no value in the store")]
    MissingTag { tag: Tag },

    #[error("Tag {tag} holds out-of-domain value {value}")]
    InvalidTagValue { tag: Tag, value: f64 },

    #[error("Lock poisoned: {what}")]
    Poisoned { what: &'static str },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}
