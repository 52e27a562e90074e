//! Recycle convergence engine for sequential-modular flowsheets.
//!
//! Systems are evaluated by running their path in declared order. Systems with
//! recycle edges repeat the path until the recycle (tear) streams stop changing,
//! converging nested systems to completion first. Process specifications run
//! before their unit and may search a control variable by simulating a
//! subsystem for every trial value.

pub mod accelerate;
pub mod driver;
pub mod error;
pub mod report;
pub mod root;
pub mod specification;

pub use accelerate::Accelerator;
pub use driver::{SolveSettings, simulate};
pub use error::{SolverError, SolverResult};
pub use report::{SimulationReport, SpecificationOutcome, SystemRecord};
pub use root::{RootFindingError, RootSolution, RootStatus};
