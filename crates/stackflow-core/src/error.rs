use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {path}\nreason: {message}")]
    Io { path: PathBuf, message: String },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported project file format: {0}")]
    UnsupportedFileFormat(PathBuf),

    #[error("invalid project: {0}")]
    InvalidProject(String),

    #[error("invalid {key}: {message}")]
    ExtensionDecode { key: String, message: String },

    #[error("invalid cpus value '{0}'")]
    InvalidCpus(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
