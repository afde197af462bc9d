//! StackFlow template synthesis
//!
//! Turns a resolved compose [`Project`] into an ECS/Fargate CloudFormation
//! template and renders it, optionally merged with a user supplied overlay.
//!
//! ```text
//! Project ──check_compatibility──▶ synthesize(context) ──▶ Template ──render──▶ bytes ──overlay──▶ bytes
//! ```

pub mod autoscaling;
pub mod compat;
pub mod context;
pub mod error;
pub mod naming;
pub mod render;
pub mod resources;
pub mod sizing;
pub mod synthesize;
pub mod template;

pub use compat::check_compatibility;
pub use context::DeploymentContext;
pub use error::{Result, TemplateError};
pub use render::{OutputFormat, overlay, render};
pub use sizing::{TaskSize, fit};
pub use synthesize::{convert, synthesize};
pub use template::Template;

use stackflow_core::Project;

pub const X_AWS_AUTOSCALING: &str = "x-aws-autoscaling";
pub const X_AWS_CLOUDFORMATION: &str = "x-aws-cloudformation";
pub const X_AWS_CLUSTER: &str = "x-aws-cluster";
pub const X_AWS_LOADBALANCER: &str = "x-aws-loadbalancer";
pub const X_AWS_PULL_CREDENTIALS: &str = "x-aws-pull_credentials";
pub const X_AWS_ROLE: &str = "x-aws-role";
pub const X_AWS_SECURITY_GROUPS: &str = "x-aws-security-groups";
pub const X_AWS_SUBNETS: &str = "x-aws-subnets";
pub const X_AWS_VPC: &str = "x-aws-vpc";

/// Convert and render `project`, applying its `x-aws-cloudformation` overlay if any.
pub fn config(project: &Project, format: OutputFormat) -> Result<Vec<u8>> {
    let template = convert(project)?;
    let rendered = render(&template, format)?;
    match project.extensions.raw(X_AWS_CLOUDFORMATION) {
        Some(document) => overlay(&rendered, document, format),
        None => Ok(rendered),
    }
}
