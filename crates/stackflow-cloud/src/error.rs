//! Deployment error types

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum CloudError {
    /// A remote call was rejected; the remote error is kept as source.
    #[error("{operation} failed: {source}")]
    Remote {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("remote response is missing {0}")]
    MissingField(&'static str),

    #[error("change set deletion failed: {0}")]
    ChangeSetDeleteFailed(String),

    #[error("change set failed: {0}")]
    ChangeSetFailed(String),

    #[error("change set {0} did not finish computing in time")]
    ChangeSetTimeout(String),

    #[error("template staging failed: {0}")]
    Staging(String),

    #[error("{operation} is not implemented by the ECS backend")]
    NotImplemented { operation: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl CloudError {
    pub fn remote(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Remote {
            operation,
            source: source.into(),
        }
    }

    pub fn not_implemented(operation: impl Into<String>) -> Self {
        Self::NotImplemented {
            operation: operation.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
