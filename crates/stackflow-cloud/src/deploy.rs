//! Stack deployment state machine
//!
//! ```text
//! describe ─▶ absent  ─▶ stage ─▶ create stack ─────────────────────────▶ Created
//!          └▶ present ─▶ stage ─▶ create change set ─▶ describe ─┬─ no changes ─▶ Unchanged
//!                                                                 └─ changes ─▶ execute ─▶ Updated
//! ```

use crate::api::*;
use crate::cancellable;
use crate::error::{CloudError, Result};
use crate::stack::{ChangeSetOutcome, StackPresence, change_set_name};
use crate::staging::{PROJECT_TAG, stage};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Change set polling parameters.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_polls: 150,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    Created { stack_id: String },
    Updated { change_set_id: String },
    /// The deployed stack already matches the template
    Unchanged,
}

pub struct Deployer {
    stacks: Arc<dyn StackApi>,
    objects: Arc<dyn ObjectStore>,
    options: DeployOptions,
}

impl Deployer {
    pub fn new(stacks: Arc<dyn StackApi>, objects: Arc<dyn ObjectStore>) -> Self {
        Self {
            stacks,
            objects,
            options: DeployOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DeployOptions) -> Self {
        self.options = options;
        self
    }

    /// Create the project's stack, or update it through a change set.
    #[instrument(skip(self, template, cancel), fields(bytes = template.len()))]
    pub async fn deploy(
        &self,
        project: &str,
        region: &str,
        template: &[u8],
        cancel: &CancellationToken,
    ) -> Result<DeployOutcome> {
        match self.presence(project, cancel).await? {
            StackPresence::Absent => self.create(project, region, template, cancel).await,
            StackPresence::Present { stack_id } => {
                debug!(%stack_id, "stack exists, updating");
                self.update(project, region, template, cancel).await
            }
        }
    }

    pub async fn presence(&self, project: &str, cancel: &CancellationToken) -> Result<StackPresence> {
        let summary = cancellable(cancel, self.stacks.describe_stack(project)).await?;
        Ok(StackPresence::from(summary))
    }

    async fn create(
        &self,
        project: &str,
        region: &str,
        template: &[u8],
        cancel: &CancellationToken,
    ) -> Result<DeployOutcome> {
        let staged = stage(&self.objects, project, region, template, cancel).await?;
        let request = CreateStackRequest {
            stack_name: project.to_string(),
            template: staged.source.clone(),
            delete_on_failure: true,
            capabilities: vec![CAPABILITY_IAM.to_string()],
            tags: vec![(PROJECT_TAG.to_string(), project.to_string())],
        };
        let result = cancellable(cancel, self.stacks.create_stack(request)).await;
        staged.release().await;

        let stack_id = result?;
        info!(%stack_id, "stack creation started");
        Ok(DeployOutcome::Created { stack_id })
    }

    async fn update(
        &self,
        project: &str,
        region: &str,
        template: &[u8],
        cancel: &CancellationToken,
    ) -> Result<DeployOutcome> {
        let staged = stage(&self.objects, project, region, template, cancel).await?;
        let request = CreateChangeSetRequest {
            stack_name: project.to_string(),
            change_set_name: change_set_name(Utc::now()),
            template: staged.source.clone(),
            capabilities: vec![CAPABILITY_IAM.to_string()],
        };
        let result = cancellable(cancel, self.stacks.create_change_set(request)).await;
        staged.release().await;

        let change_set_id = result?;
        debug!(%change_set_id, "change set created");

        match self.settle(&change_set_id, project, cancel).await? {
            ChangeSetOutcome::NoChanges => {
                info!("stack is up to date");
                Ok(DeployOutcome::Unchanged)
            }
            ChangeSetOutcome::HasChanges => {
                cancellable(
                    cancel,
                    self.stacks.execute_change_set(&change_set_id, project),
                )
                .await?;
                info!(%change_set_id, "change set executed");
                Ok(DeployOutcome::Updated { change_set_id })
            }
            ChangeSetOutcome::DeleteFailed(reason) => Err(CloudError::ChangeSetDeleteFailed(reason)),
            ChangeSetOutcome::Failed(reason) => Err(CloudError::ChangeSetFailed(reason)),
            ChangeSetOutcome::Pending => Err(CloudError::ChangeSetTimeout(change_set_id)),
        }
    }

    /// Describe the change set until it leaves the pending states.
    async fn settle(
        &self,
        change_set_id: &str,
        project: &str,
        cancel: &CancellationToken,
    ) -> Result<ChangeSetOutcome> {
        let mut outcome = ChangeSetOutcome::Pending;
        for attempt in 0..self.options.max_polls.max(1) {
            if attempt > 0 {
                cancellable(cancel, async {
                    tokio::time::sleep(self.options.poll_interval).await;
                    Ok(())
                })
                .await?;
            }
            let description = cancellable(
                cancel,
                self.stacks.describe_change_set(change_set_id, project),
            )
            .await?;
            outcome = ChangeSetOutcome::from(&description);
            if outcome != ChangeSetOutcome::Pending {
                break;
            }
            debug!(attempt, status = %description.status, "change set still computing");
        }
        Ok(outcome)
    }
}
