//! StackFlow core
//!
//! The fully-resolved compose project model that every other StackFlow crate consumes.
//! Descriptor parsing (interpolation, profiles, merging of multiple files) happens
//! upstream; this crate only owns the typed result and a loader for its serialized form.

pub mod error;
pub mod loader;
pub mod model;

pub use error::{CoreError, Result};
pub use loader::{ModelFormat, load_project, parse_project};
pub use model::*;

/// Label carrying the compose project name on every tagged resource.
pub const PROJECT_LABEL: &str = "com.docker.compose.project";

/// Label carrying the compose service name on service-scoped resources.
pub const SERVICE_LABEL: &str = "com.docker.compose.service";
