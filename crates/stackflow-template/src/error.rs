//! Template synthesis error types

use stackflow_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("configs are not supported: {0}")]
    ConfigsNotSupported(String),

    #[error("only external networks are supported: {0}")]
    ExternalNetworksOnly(String),

    #[error("only external secrets are supported: {0}")]
    ExternalSecretsOnly(String),

    #[error("volumes are not supported: {0}")]
    VolumesNotSupported(String),

    #[error("missing required {0}")]
    MissingContext(&'static str),

    #[error(
        "the resources requested are not supported by ECS/Fargate (cpu units: {cpu}, memory bytes: {memory})"
    )]
    UnsupportedResources { cpu: u64, memory: u64 },

    #[error("service '{service}': x-aws-autoscaling {message}")]
    Autoscaling { service: String, message: String },

    #[error("service '{service}' references undeclared secret '{secret}'")]
    UnknownSecret { service: String, secret: String },

    #[error("service '{service}' depends on undeclared service '{dependency}'")]
    UnknownDependency { service: String, dependency: String },

    #[error("logical id '{0}' is produced by more than one resource; rename a service or network")]
    LogicalIdCollision(String),

    #[error("format {0:?} is not supported")]
    UnsupportedFormat(String),

    #[error("cannot apply x-aws-cloudformation overlay: {0}")]
    Overlay(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TemplateError>;
