//! Error types for the rf-app service layer.

use std::path::PathBuf;

use rf_flowsheet::FlowsheetError;
use rf_project::ProjectError;
use rf_solver::SolverError;

/// Application error type shared by the services and the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Failed to read project file: {path}")]
    ProjectFileRead {
        path: PathBuf,
        source: ProjectError,
    },

    #[error("Failed to write project file: {path}")]
    ProjectFileWrite {
        path: PathBuf,
        source: ProjectError,
    },

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("System not found: {0}")]
    SystemNotFound(String),

    #[error("Runtime compilation failed: {0}")]
    Compile(String),

    #[error("Flowsheet error: {0}")]
    Flowsheet(#[from] FlowsheetError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for rf-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<ProjectError> for AppError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Project(other.to_string()),
        }
    }
}
