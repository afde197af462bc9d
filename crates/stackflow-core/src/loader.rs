//! Project loader
//!
//! Reads the serialized form of an already-resolved project. Extension bags are
//! flattened into their parent objects, so any key that is not part of the model
//! lands there; only `x-*` keys are accepted.

use crate::error::{CoreError, Result};
use crate::model::{Extensions, Project};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Serialized representation of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Yaml,
    Json,
}

impl ModelFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Some(Self::Yaml),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }
}

/// Load a project from a YAML or JSON file.
///
/// A project without a name takes the name of the directory holding the file.
#[instrument(fields(path = %path.display()))]
pub fn load_project(path: &Path) -> Result<Project> {
    let format = ModelFormat::from_path(path)
        .ok_or_else(|| CoreError::UnsupportedFileFormat(path.to_path_buf()))?;
    let content = std::fs::read_to_string(path).map_err(|e| CoreError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let fallback_name = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed");

    let project = parse_project(&content, format, fallback_name)?;
    info!(
        project = %project.name,
        services = project.services.len(),
        "Project loaded"
    );
    Ok(project)
}

/// Parse a project from a string.
pub fn parse_project(content: &str, format: ModelFormat, fallback_name: &str) -> Result<Project> {
    let mut project: Project = match format {
        ModelFormat::Yaml => serde_yaml::from_str(content)?,
        ModelFormat::Json => serde_json::from_str(content)?,
    };

    if project.name.is_empty() {
        debug!("Project has no name, using '{}'", fallback_name);
        project.name = fallback_name.to_string();
    }
    project.resolve_names();
    check_extension_keys(&project)?;

    Ok(project)
}

fn check_extension_keys(project: &Project) -> Result<()> {
    check_keys(&project.extensions, "project")?;
    for service in project.services.values() {
        check_keys(&service.extensions, &format!("service '{}'", service.name))?;
        if let Some(ext) = service.deploy_extensions() {
            check_keys(ext, &format!("deploy section of service '{}'", service.name))?;
        }
    }
    Ok(())
}

fn check_keys(extensions: &Extensions, scope: &str) -> Result<()> {
    match extensions.keys().find(|k| !k.starts_with("x-")) {
        Some(key) => Err(CoreError::InvalidProject(format!(
            "unknown field '{}' in {}",
            key, scope
        ))),
        None => Ok(()),
    }
}
