//! Project loading, saving, validation, and introspection.

use std::path::Path;

use rf_flowsheet::accounting::system_units;
use rf_flowsheet::{Element, Flowsheet};
use rf_project::schema::{Project, SystemDef};

use crate::compile::compile_project;
use crate::error::{AppError, AppResult};

/// Summary of a system for listing.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSummary {
    pub id: String,
    /// Units run by the system, nested systems and facilities included.
    pub unit_count: usize,
    pub subsystems: Vec<String>,
    /// Streams closed by the system's loop, facility recycle last.
    pub recycles: Vec<String>,
    pub facility_count: usize,
}

impl SystemSummary {
    pub fn is_looping(&self) -> bool {
        !self.recycles.is_empty()
    }
}

/// Load a project from YAML or JSON (by extension).
pub fn load_project(path: &Path) -> AppResult<Project> {
    rf_project::load(path).map_err(|source| match source {
        rf_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
        source => AppError::ProjectFileRead {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Save a project as YAML or JSON (by extension).
pub fn save_project(path: &Path, project: &Project) -> AppResult<()> {
    rf_project::save(path, project).map_err(|source| AppError::ProjectFileWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Validate references and values, then assemble the flowsheet to check topology.
pub fn validate_project(project: &Project) -> AppResult<()> {
    if project.systems.is_empty() {
        return Err(AppError::Validation(
            "Project must have at least one system".to_string(),
        ));
    }
    compile_project(project).map(|_| ())
}

/// List all systems of a compiled flowsheet.
pub fn list_systems(fs: &Flowsheet) -> AppResult<Vec<SystemSummary>> {
    fs.systems()
        .iter()
        .map(|system| {
            let subsystems = system
                .elements()
                .filter_map(|e| match e {
                    Element::System(id) => Some(fs.system_name(*id).to_string()),
                    Element::Unit(_) => None,
                })
                .collect();
            let recycles = system
                .recycles
                .iter()
                .chain(&system.facility_recycle)
                .map(|edge| fs.recycle_stream(edge).map(|s| fs.stream_name(s).to_string()))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(SystemSummary {
                id: system.name.clone(),
                unit_count: system_units(fs, system.id)?.len(),
                subsystems,
                recycles,
                facility_count: system.facilities.len(),
            })
        })
        .collect()
}

/// Get a specific system definition by ID.
pub fn get_system<'a>(project: &'a Project, system_id: &str) -> AppResult<&'a SystemDef> {
    project
        .system(system_id)
        .ok_or_else(|| AppError::SystemNotFound(system_id.to_string()))
}
