//! AWS backend for StackFlow
//!
//! Implements the deployer's remote API on top of the CloudFormation and S3
//! SDK clients, and exposes the [`EcsBackend`] facade the CLI drives.
//!
//! # Example
//!
//! ```ignore
//! use stackflow_cloud_aws::EcsBackend;
//! use tokio_util::sync::CancellationToken;
//!
//! let backend = EcsBackend::from_env(None, Some("eu-west-1")).await?;
//! let outcome = backend.up(&project, &CancellationToken::new()).await?;
//! ```

pub mod backend;
pub mod error;
pub mod sdk;

pub use backend::{EcsBackend, Operation};
pub use error::{BackendError, Result};
pub use sdk::AwsSdk;
