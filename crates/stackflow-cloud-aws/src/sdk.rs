//! CloudFormation and S3 clients behind the deployer's remote API traits

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_cloudformation::error::ProvideErrorMetadata;
use aws_sdk_cloudformation::types::{Capability, ChangeSetType, OnFailure, Tag};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use stackflow_cloud::{
    ChangeSetDescription, CloudError, CreateChangeSetRequest, CreateStackRequest, ObjectStore,
    PutObjectRequest, Result, StackApi, StackSummary, StoredObject, TemplateSource,
};
use tracing::{debug, info};

/// Thin wrapper around the SDK clients sharing one configuration.
#[derive(Debug, Clone)]
pub struct AwsSdk {
    cloudformation: aws_sdk_cloudformation::Client,
    s3: aws_sdk_s3::Client,
    region: Option<String>,
}

impl AwsSdk {
    /// Load credentials and region from the environment, optionally pinning a
    /// named profile and region.
    pub async fn load(profile: Option<&str>, region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let config = loader.load().await;
        Self::from_config(&config)
    }

    pub fn from_config(config: &SdkConfig) -> Self {
        Self {
            cloudformation: aws_sdk_cloudformation::Client::new(config),
            s3: aws_sdk_s3::Client::new(config),
            region: config.region().map(|r| r.to_string()),
        }
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}

fn object_url(region: Option<&str>, bucket: &str, key: &str) -> String {
    match region {
        Some(region) => format!("https://s3.{region}.amazonaws.com/{bucket}/{key}"),
        None => format!("https://s3.amazonaws.com/{bucket}/{key}"),
    }
}

/// CloudFormation reports a missing stack as a validation error.
fn is_missing_stack(err: &impl ProvideErrorMetadata) -> bool {
    err.code() == Some("ValidationError")
        && err.message().is_some_and(|m| m.contains("does not exist"))
}

fn capabilities(names: &[String]) -> Vec<Capability> {
    names.iter().map(|c| Capability::from(c.as_str())).collect()
}

#[async_trait]
impl StackApi for AwsSdk {
    async fn describe_stack(&self, stack_name: &str) -> Result<Option<StackSummary>> {
        let output = match self
            .cloudformation
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) if is_missing_stack(&err) => {
                debug!(stack = %stack_name, "stack does not exist");
                return Ok(None);
            }
            Err(err) => return Err(CloudError::remote("DescribeStacks", err)),
        };

        Ok(output.stacks().first().map(|stack| StackSummary {
            stack_id: stack.stack_id().unwrap_or_default().to_string(),
            status: stack
                .stack_status()
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
        }))
    }

    async fn create_stack(&self, request: CreateStackRequest) -> Result<String> {
        let tags = request
            .tags
            .iter()
            .map(|(key, value)| Tag::builder().key(key).value(value).build())
            .collect::<Vec<_>>();

        let mut call = self
            .cloudformation
            .create_stack()
            .stack_name(&request.stack_name)
            .set_capabilities(Some(capabilities(&request.capabilities)))
            .set_tags(Some(tags));
        if request.delete_on_failure {
            call = call.on_failure(OnFailure::Delete);
        }
        call = match request.template {
            TemplateSource::Body(body) => call.template_body(body),
            TemplateSource::Url(url) => call.template_url(url),
        };

        let output = call
            .send()
            .await
            .map_err(|e| CloudError::remote("CreateStack", e))?;
        info!(stack = %request.stack_name, "CreateStack accepted");
        output
            .stack_id()
            .map(String::from)
            .ok_or(CloudError::MissingField("StackId"))
    }

    async fn create_change_set(&self, request: CreateChangeSetRequest) -> Result<String> {
        let mut call = self
            .cloudformation
            .create_change_set()
            .stack_name(&request.stack_name)
            .change_set_name(&request.change_set_name)
            .change_set_type(ChangeSetType::Update)
            .set_capabilities(Some(capabilities(&request.capabilities)));
        call = match request.template {
            TemplateSource::Body(body) => call.template_body(body),
            TemplateSource::Url(url) => call.template_url(url),
        };

        let output = call
            .send()
            .await
            .map_err(|e| CloudError::remote("CreateChangeSet", e))?;
        info!(change_set = %request.change_set_name, "CreateChangeSet accepted");
        output
            .id()
            .map(String::from)
            .ok_or(CloudError::MissingField("Id"))
    }

    async fn describe_change_set(
        &self,
        change_set: &str,
        stack_name: &str,
    ) -> Result<ChangeSetDescription> {
        let output = self
            .cloudformation
            .describe_change_set()
            .change_set_name(change_set)
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| CloudError::remote("DescribeChangeSet", e))?;

        Ok(ChangeSetDescription {
            status: output
                .status()
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            status_reason: output.status_reason().map(String::from),
        })
    }

    async fn execute_change_set(&self, change_set: &str, stack_name: &str) -> Result<()> {
        self.cloudformation
            .execute_change_set()
            .change_set_name(change_set)
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| CloudError::remote("ExecuteChangeSet", e))?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for AwsSdk {
    async fn create_bucket(&self, bucket: &str, location_constraint: Option<&str>) -> Result<()> {
        let mut call = self.s3.create_bucket().bucket(bucket);
        if let Some(location) = location_constraint {
            call = call.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(location))
                    .build(),
            );
        }
        call.send()
            .await
            .map_err(|e| CloudError::remote("CreateBucket", e))?;
        Ok(())
    }

    async fn put_object(&self, request: PutObjectRequest) -> Result<StoredObject> {
        let url = object_url(self.region(), &request.bucket, &request.key);
        let output = self
            .s3
            .put_object()
            .bucket(request.bucket)
            .key(request.key)
            .body(ByteStream::from(request.body))
            .content_type(request.content_type)
            .tagging(request.tagging)
            .send()
            .await
            .map_err(|e| CloudError::remote("PutObject", e))?;

        Ok(StoredObject {
            url,
            version_id: output.version_id().map(String::from),
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str, version_id: Option<&str>) -> Result<()> {
        self.s3
            .delete_object()
            .bucket(bucket)
            .key(key)
            .set_version_id(version_id.map(String::from))
            .send()
            .await
            .map_err(|e| CloudError::remote("DeleteObject", e))?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.s3
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| CloudError::remote("DeleteBucket", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_cloudformation::error::ErrorMetadata;

    #[test]
    fn test_missing_stack_detection() {
        let missing = ErrorMetadata::builder()
            .code("ValidationError")
            .message("Stack with id demo does not exist")
            .build();
        assert!(is_missing_stack(&missing));

        let throttled = ErrorMetadata::builder()
            .code("Throttling")
            .message("Rate exceeded")
            .build();
        assert!(!is_missing_stack(&throttled));

        let other_validation = ErrorMetadata::builder()
            .code("ValidationError")
            .message("Template format error")
            .build();
        assert!(!is_missing_stack(&other_validation));
    }

    #[test]
    fn test_object_url_uses_region() {
        assert_eq!(
            object_url(Some("eu-west-1"), "com.docker.compose.x", "template.yaml"),
            "https://s3.eu-west-1.amazonaws.com/com.docker.compose.x/template.yaml"
        );
        assert_eq!(object_url(None, "b", "k"), "https://s3.amazonaws.com/b/k");
    }

    #[test]
    fn test_capabilities() {
        assert_eq!(
            capabilities(&["CAPABILITY_IAM".to_string()]),
            vec![Capability::CapabilityIam]
        );
    }
}
