//! Error types for simulation.

use rf_core::Real;
use rf_flowsheet::FlowsheetError;
use rf_stream::StreamError;
use rf_units::UnitError;
use thiserror::Error;

use crate::root::RootFindingError;

/// Errors that abort a simulation.
///
/// A failed search that falls back to its last value is not an error; it is
/// recorded in the [`crate::SimulationReport`] instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// `deviation` is the largest relative flow change among chemicals over
    /// the molar tolerance; `temperature` the largest tear temperature change.
    #[error(
        "System '{system}' did not converge after {iterations} iterations \
         (deviation {deviation:.3e}, temperature change {temperature:.3e} K)"
    )]
    ConvergenceFailure {
        system: String,
        iterations: usize,
        deviation: Real,
        temperature: Real,
    },

    #[error("Unit '{unit}' failed: {source}")]
    Evaluation { unit: String, source: UnitError },

    #[error("Specification on unit '{unit}' failed: {source}")]
    RootFinding {
        unit: String,
        source: RootFindingError,
    },

    #[error("Problem setup error: {what}")]
    Setup { what: String },

    #[error("Flowsheet error: {0}")]
    Flowsheet(FlowsheetError),

    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<FlowsheetError> for SolverError {
    fn from(e: FlowsheetError) -> Self {
        match e {
            FlowsheetError::Evaluation { unit, source }
            | FlowsheetError::Parameter { unit, source } => {
                SolverError::Evaluation { unit, source }
            }
            FlowsheetError::Stream(s) => SolverError::Stream(s),
            other => SolverError::Flowsheet(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_errors_become_evaluation_errors() {
        let fe = FlowsheetError::Evaluation {
            unit: "R1".into(),
            source: UnitError::NonPhysical { what: "flow" },
        };
        assert!(matches!(
            SolverError::from(fe),
            SolverError::Evaluation { unit, .. } if unit == "R1"
        ));

        let other = FlowsheetError::UnknownName {
            what: "system",
            name: "x".into(),
        };
        assert!(matches!(SolverError::from(other), SolverError::Flowsheet(_)));
    }

    #[test]
    fn convergence_failure_message() {
        let e = SolverError::ConvergenceFailure {
            system: "loop".into(),
            iterations: 10,
            deviation: 0.25,
            temperature: 1.5,
        };
        let msg = e.to_string();
        assert!(msg.contains("loop") && msg.contains("10"));
        assert!(msg.contains("1.500e0 K"));
    }
}
