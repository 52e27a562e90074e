//! rf-project: project file format and validation.
//!
//! A project describes chemicals, streams, units, systems and solve settings
//! by string id. It is independent of the engine crates; `rf-app` compiles a
//! validated project into a flowsheet.

use std::fs;
use std::path::Path;

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{ValidationError, validate_project};

/// Schema version written by this crate.
pub const LATEST_VERSION: u32 = 1;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk encoding of a project file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// `.json` is JSON; anything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

/// Decode and validate a project.
pub fn parse(content: &str, format: Format) -> ProjectResult<Project> {
    let project: Project = match format {
        Format::Yaml => serde_yaml::from_str(content)?,
        Format::Json => serde_json::from_str(content)?,
    };
    validate_project(&project)?;
    Ok(project)
}

/// Validate, then encode a project. Invalid projects are never written out.
pub fn render(project: &Project, format: Format) -> ProjectResult<String> {
    validate_project(project)?;
    Ok(match format {
        Format::Yaml => serde_yaml::to_string(project)?,
        Format::Json => serde_json::to_string_pretty(project)?,
    })
}

pub fn from_yaml_str(content: &str) -> ProjectResult<Project> {
    parse(content, Format::Yaml)
}

pub fn load(path: &Path) -> ProjectResult<Project> {
    let content = fs::read_to_string(path)?;
    parse(&content, Format::from_path(path))
}

pub fn save(path: &Path, project: &Project) -> ProjectResult<()> {
    let content = render(project, Format::from_path(path))?;
    fs::write(path, content)?;
    Ok(())
}
