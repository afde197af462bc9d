//! StackFlow deployment orchestration
//!
//! Drives a rendered template into a remote stack: existence check, inline or
//! staged submission, then stack creation or a change set. The remote side is
//! reached only through [`StackApi`] and [`ObjectStore`].
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                stackflow CLI                 │
//! │                (stackflow up)                │
//! └──────────────────────┬───────────────────────┘
//!                        │ template bytes
//! ┌──────────────────────▼───────────────────────┐
//! │               stackflow-cloud                │
//! │  ┌──────────────┐  ┌──────────────────────┐  │
//! │  │   Deployer   │──│ Staging (S3 bucket)  │  │
//! │  └──────┬───────┘  └──────────┬───────────┘  │
//! │   trait StackApi       trait ObjectStore     │
//! └─────────┬──────────────────────┬─────────────┘
//!           │                      │
//! ┌─────────▼──────────────────────▼─────────────┐
//! │             stackflow-cloud-aws              │
//! └──────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod deploy;
pub mod error;
pub mod stack;
pub mod staging;

#[cfg(test)]
mod fake;

// Re-exports
pub use api::{
    CAPABILITY_IAM, ChangeSetDescription, CreateChangeSetRequest, CreateStackRequest,
    ObjectStore, PutObjectRequest, StackApi, StackSummary, StoredObject, TemplateSource,
};
pub use deploy::{DeployOptions, DeployOutcome, Deployer};
pub use error::{CloudError, Result};
pub use stack::{ChangeSetOutcome, StackPresence, change_set_name, is_no_changes_reason};
pub use staging::{INLINE_TEMPLATE_LIMIT, PROJECT_TAG, StagedTemplate, stage};

use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Run `future` unless `cancel` fires first.
pub(crate) async fn cancellable<T>(
    cancel: &CancellationToken,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CloudError::Cancelled),
        result = future => result,
    }
}
