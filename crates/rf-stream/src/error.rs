//! Stream and chemical registry errors.

use rf_core::RfError;
use thiserror::Error;

/// Result type for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// Errors raised when building or mutating stream values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StreamError {
    /// Non-physical values (negative flow, non-positive temperature, etc.).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Invalid argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Chemical name not present in the registry.
    #[error("Unknown chemical: {name}")]
    UnknownChemical { name: String },

    /// Chemical registered twice.
    #[error("Duplicate chemical: {name}")]
    DuplicateChemical { name: String },

    /// Flow vector does not match the chemical registry.
    #[error("Flow vector has {actual} entries, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

impl From<StreamError> for RfError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::InvalidArg { what } => RfError::InvalidArg { what },
            other => RfError::Invariant {
                what: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StreamError::UnknownChemical {
            name: "Glucose".into(),
        };
        assert!(err.to_string().contains("Glucose"));

        let err = StreamError::LengthMismatch {
            expected: 3,
            actual: 2,
        };
        assert!(err.to_string().contains("expected 3"));
    }

    #[test]
    fn error_to_rf_error() {
        let rf: RfError = StreamError::NonPhysical { what: "flow" }.into();
        assert!(matches!(rf, RfError::Invariant { .. }));
        let rf: RfError = StreamError::InvalidArg { what: "x" }.into();
        assert!(matches!(rf, RfError::InvalidArg { .. }));
    }
}
