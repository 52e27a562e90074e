//! Shared application service layer for recycleflow.
//!
//! Compiles project files into flowsheets and runs them. The CLI is a thin
//! frontend over these services.

pub mod compile;
pub mod error;
pub mod project_service;
pub mod run_service;

pub use compile::{CompiledFlowsheet, compile_project};
pub use error::{AppError, AppResult};
pub use project_service::{
    SystemSummary, get_system, list_systems, load_project, save_project, validate_project,
};
pub use run_service::{
    RunOptions, RunResponse, StreamSummary, SweepPoint, SweepRequest, run_system, sweep,
};
