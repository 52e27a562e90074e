//! Error types for unit evaluation.

use rf_core::error::RfError;
use rf_stream::StreamError;
use thiserror::Error;

/// Errors that can occur while configuring or evaluating a unit model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    #[error("Invalid configuration: {what}")]
    InvalidConfig { what: String },

    #[error("Unknown parameter '{name}' for {kind}")]
    UnknownParameter { kind: &'static str, name: String },

    #[error("{kind} expects {expected} {side} streams, got {actual}")]
    Arity {
        kind: &'static str,
        side: &'static str,
        expected: String,
        actual: usize,
    },

    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),
}

pub type UnitResult<T> = Result<T, UnitError>;

impl From<UnitError> for RfError {
    fn from(e: UnitError) -> Self {
        match e {
            UnitError::NonPhysical { what } => RfError::InvalidArg { what },
            other => RfError::Invariant {
                what: other.to_string(),
            },
        }
    }
}
