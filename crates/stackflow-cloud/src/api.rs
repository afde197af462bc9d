//! Remote API surface consumed by the deployer
//!
//! Implementations translate these calls to a concrete SDK; the deployer only
//! sees the traits, which keeps it testable against in-memory fakes.

use crate::error::Result;
use async_trait::async_trait;

/// Capability every stack operation acknowledges, since templates create IAM roles.
pub const CAPABILITY_IAM: &str = "CAPABILITY_IAM";

/// How the template reaches the stack API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Inline template body
    Body(String),
    /// Location of a staged template object
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSummary {
    pub stack_id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStackRequest {
    pub stack_name: String,
    pub template: TemplateSource,
    /// Roll the stack back entirely when creation fails
    pub delete_on_failure: bool,
    pub capabilities: Vec<String>,
    pub tags: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateChangeSetRequest {
    pub stack_name: String,
    pub change_set_name: String,
    pub template: TemplateSource,
    pub capabilities: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSetDescription {
    pub status: String,
    pub status_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
    /// URL-encoded `key=value` tag set
    pub tagging: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Address the stack API can fetch the object from
    pub url: String,
    pub version_id: Option<String>,
}

/// Stack and change set operations.
#[async_trait]
pub trait StackApi: Send + Sync {
    /// `Ok(None)` when the stack does not exist.
    async fn describe_stack(&self, stack_name: &str) -> Result<Option<StackSummary>>;

    /// Returns the new stack id.
    async fn create_stack(&self, request: CreateStackRequest) -> Result<String>;

    /// Returns the change set id.
    async fn create_change_set(&self, request: CreateChangeSetRequest) -> Result<String>;

    async fn describe_change_set(
        &self,
        change_set: &str,
        stack_name: &str,
    ) -> Result<ChangeSetDescription>;

    async fn execute_change_set(&self, change_set: &str, stack_name: &str) -> Result<()>;
}

/// Object storage used to stage templates too large to submit inline.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// `location_constraint` is `None` in the provider's default region.
    async fn create_bucket(&self, bucket: &str, location_constraint: Option<&str>) -> Result<()>;

    async fn put_object(&self, request: PutObjectRequest) -> Result<StoredObject>;

    async fn delete_object(&self, bucket: &str, key: &str, version_id: Option<&str>) -> Result<()>;

    async fn delete_bucket(&self, bucket: &str) -> Result<()>;
}
