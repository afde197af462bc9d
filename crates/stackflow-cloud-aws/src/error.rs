//! ECS backend error types

use stackflow_cloud::CloudError;
use stackflow_template::TemplateError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Cloud(#[from] CloudError),
}

impl BackendError {
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::Cloud(CloudError::NotImplemented { .. }))
    }
}

pub type Result<T> = std::result::Result<T, BackendError>;
