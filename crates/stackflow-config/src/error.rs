use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config directory not found")]
    ConfigDirNotFound,

    #[error(
        "project file not found. Looked in:\n\
        - current directory: stackflow.local.yaml, stackflow.yaml, stackflow.json\n\
        - ./.stackflow/ directory\n\
        or point STACKFLOW_FILE at it directly"
    )]
    ProjectFileNotFound,

    #[error("invalid settings file {path}: {source}")]
    InvalidSettings {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
