//! Flowsheet assembly and runtime errors.

use rf_core::{Id, RfError};
use rf_stream::StreamError;
use rf_units::UnitError;

/// Result type for flowsheet operations.
pub type FlowsheetResult<T> = Result<T, FlowsheetError>;

/// Flowsheet construction, validation and access errors.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowsheetError {
    /// Two entities of the same kind share a name.
    DuplicateName { what: &'static str, name: String },

    /// A name lookup failed.
    UnknownName { what: &'static str, name: String },

    /// An id does not refer to an entity of the flowsheet.
    UnknownId { what: &'static str, id: Id },

    /// A unit's stream counts do not match its model.
    Arity { unit: String, source: UnitError },

    /// A stream is produced by more than one unit outlet.
    MultipleProducers { stream: String },

    /// A stream is consumed by more than one unit inlet.
    MultipleConsumers { stream: String },

    /// Nested systems form a cycle.
    NestingCycle { system: String },

    /// A unit appears twice within one system's flattened path.
    DuplicateUnitInPath { system: String, unit: String },

    /// A recycle edge is inconsistent with the wiring or path order.
    InvalidRecycle { system: String, reason: String },

    /// A stream runs against path order without any loop to close it.
    UnclosedBackEdge {
        stream: String,
        producer: String,
        consumer: String,
    },

    /// A specification refers to something it cannot drive or measure.
    InvalidSpecification { unit: String, reason: String },

    /// Convergence options are unusable.
    InvalidOptions { system: String, reason: &'static str },

    /// Units cannot be ordered because they form a cycle.
    CyclicPath { unit: String },

    /// A unit model failed during evaluation.
    Evaluation { unit: String, source: UnitError },

    /// A unit parameter could not be read or written.
    Parameter { unit: String, source: UnitError },

    /// A stream value operation failed.
    Stream(StreamError),
}

impl std::fmt::Display for FlowsheetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowsheetError::DuplicateName { what, name } => {
                write!(f, "Duplicate {} name '{}'", what, name)
            }
            FlowsheetError::UnknownName { what, name } => {
                write!(f, "Unknown {} '{}'", what, name)
            }
            FlowsheetError::UnknownId { what, id } => {
                write!(f, "No {} with id {}", what, id)
            }
            FlowsheetError::Arity { unit, source } => {
                write!(f, "Unit '{}': {}", unit, source)
            }
            FlowsheetError::MultipleProducers { stream } => {
                write!(f, "Stream '{}' is produced by more than one unit", stream)
            }
            FlowsheetError::MultipleConsumers { stream } => {
                write!(
                    f,
                    "Stream '{}' is consumed by more than one unit (use a splitter)",
                    stream
                )
            }
            FlowsheetError::NestingCycle { system } => {
                write!(f, "System '{}' contains itself through nesting", system)
            }
            FlowsheetError::DuplicateUnitInPath { system, unit } => {
                write!(f, "Unit '{}' appears more than once in system '{}'", unit, system)
            }
            FlowsheetError::InvalidRecycle { system, reason } => {
                write!(f, "Invalid recycle in system '{}': {}", system, reason)
            }
            FlowsheetError::UnclosedBackEdge {
                stream,
                producer,
                consumer,
            } => {
                write!(
                    f,
                    "Stream '{}' from '{}' to '{}' runs against path order outside any recycle loop",
                    stream, producer, consumer
                )
            }
            FlowsheetError::InvalidSpecification { unit, reason } => {
                write!(f, "Invalid specification on unit '{}': {}", unit, reason)
            }
            FlowsheetError::InvalidOptions { system, reason } => {
                write!(f, "Invalid convergence options for system '{}': {}", system, reason)
            }
            FlowsheetError::CyclicPath { unit } => {
                write!(f, "Units form a cycle through '{}'", unit)
            }
            FlowsheetError::Evaluation { unit, source } => {
                write!(f, "Unit '{}' failed: {}", unit, source)
            }
            FlowsheetError::Parameter { unit, source } => {
                write!(f, "Unit '{}' parameter error: {}", unit, source)
            }
            FlowsheetError::Stream(e) => write!(f, "Stream error: {}", e),
        }
    }
}

impl std::error::Error for FlowsheetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FlowsheetError::Arity { source, .. }
            | FlowsheetError::Evaluation { source, .. }
            | FlowsheetError::Parameter { source, .. } => Some(source),
            FlowsheetError::Stream(e) => Some(e),
            _ => None,
        }
    }
}

impl FlowsheetError {
    /// Whether a control variable refused a value outside its domain, as
    /// opposed to a wiring or lookup problem.
    pub fn rejects_value(&self) -> bool {
        fn stream(e: &StreamError) -> bool {
            matches!(
                e,
                StreamError::NonPhysical { .. } | StreamError::InvalidArg { .. }
            )
        }
        match self {
            FlowsheetError::Parameter { source, .. } => match source {
                UnitError::NonPhysical { .. } | UnitError::InvalidConfig { .. } => true,
                UnitError::Stream(e) => stream(e),
                _ => false,
            },
            FlowsheetError::Stream(e) => stream(e),
            _ => false,
        }
    }
}

impl From<StreamError> for FlowsheetError {
    fn from(err: StreamError) -> Self {
        FlowsheetError::Stream(err)
    }
}

impl From<FlowsheetError> for RfError {
    fn from(err: FlowsheetError) -> Self {
        RfError::Invariant {
            what: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_entities() {
        let e = FlowsheetError::UnclosedBackEdge {
            stream: "s3".into(),
            producer: "U2".into(),
            consumer: "U1".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("s3") && msg.contains("U2") && msg.contains("U1"));
    }

    #[test]
    fn rejected_values_are_told_apart_from_lookups() {
        let rejected = FlowsheetError::Parameter {
            unit: "F1".into(),
            source: UnitError::NonPhysical {
                what: "vapor fraction",
            },
        };
        assert!(rejected.rejects_value());
        assert!(FlowsheetError::Stream(StreamError::NonPhysical { what: "flow" }).rejects_value());

        let unknown = FlowsheetError::Parameter {
            unit: "F1".into(),
            source: UnitError::UnknownParameter {
                kind: "Flash",
                name: "reflux".into(),
            },
        };
        assert!(!unknown.rejects_value());
    }

    #[test]
    fn evaluation_error_has_source() {
        use std::error::Error;
        let e = FlowsheetError::Evaluation {
            unit: "R1".into(),
            source: UnitError::NonPhysical { what: "flow" },
        };
        assert!(e.source().is_some());
        let rf: RfError = e.into();
        assert!(matches!(rf, RfError::Invariant { .. }));
    }
}
