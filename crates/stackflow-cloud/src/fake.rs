//! In-memory stack API and object store recording every call

use crate::api::*;
use crate::error::{CloudError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    DescribeStack(String),
    CreateStack(CreateStackRequest),
    CreateChangeSet(CreateChangeSetRequest),
    DescribeChangeSet(String),
    ExecuteChangeSet(String),
    CreateBucket {
        bucket: String,
        location: Option<String>,
    },
    PutObject(PutObjectRequest),
    DeleteObject {
        bucket: String,
        key: String,
        version_id: Option<String>,
    },
    DeleteBucket(String),
}

#[derive(Default)]
pub struct FakeCloud {
    pub calls: Mutex<Vec<Call>>,
    pub stack: Option<StackSummary>,
    /// Successive change set descriptions; the last one repeats
    pub change_sets: Mutex<VecDeque<ChangeSetDescription>>,
    pub fail_describe_stack: bool,
    pub fail_create_stack: bool,
    pub fail_create_change_set: bool,
    pub fail_create_bucket: bool,
    pub fail_put_object: bool,
    pub fail_delete_bucket: bool,
}

impl FakeCloud {
    pub fn with_stack() -> Self {
        Self {
            stack: Some(StackSummary {
                stack_id: "arn:aws:cloudformation:stack/demo".to_string(),
                status: "CREATE_COMPLETE".to_string(),
            }),
            ..Default::default()
        }
    }

    pub fn change_set(self, status: &str, reason: Option<&str>) -> Self {
        self.change_sets.lock().unwrap().push_back(ChangeSetDescription {
            status: status.to_string(),
            status_reason: reason.map(String::from),
        });
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn fail<T>(&self, fail: bool, operation: &'static str, value: T) -> Result<T> {
        if fail {
            Err(CloudError::remote(operation, "injected failure"))
        } else {
            Ok(value)
        }
    }
}

#[async_trait]
impl StackApi for FakeCloud {
    async fn describe_stack(&self, stack_name: &str) -> Result<Option<StackSummary>> {
        self.record(Call::DescribeStack(stack_name.to_string()));
        self.fail(self.fail_describe_stack, "DescribeStacks", self.stack.clone())
    }

    async fn create_stack(&self, request: CreateStackRequest) -> Result<String> {
        self.record(Call::CreateStack(request));
        self.fail(self.fail_create_stack, "CreateStack", "arn:aws:cloudformation:stack/demo".to_string())
    }

    async fn create_change_set(&self, request: CreateChangeSetRequest) -> Result<String> {
        let id = format!("arn:aws:cloudformation:changeSet/{}", request.change_set_name);
        self.record(Call::CreateChangeSet(request));
        self.fail(self.fail_create_change_set, "CreateChangeSet", id)
    }

    async fn describe_change_set(&self, change_set: &str, _stack_name: &str) -> Result<ChangeSetDescription> {
        self.record(Call::DescribeChangeSet(change_set.to_string()));
        let mut queue = self.change_sets.lock().unwrap();
        let description = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(description.unwrap_or(ChangeSetDescription {
            status: "CREATE_COMPLETE".to_string(),
            status_reason: None,
        }))
    }

    async fn execute_change_set(&self, change_set: &str, _stack_name: &str) -> Result<()> {
        self.record(Call::ExecuteChangeSet(change_set.to_string()));
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FakeCloud {
    async fn create_bucket(&self, bucket: &str, location_constraint: Option<&str>) -> Result<()> {
        self.record(Call::CreateBucket {
            bucket: bucket.to_string(),
            location: location_constraint.map(String::from),
        });
        self.fail(self.fail_create_bucket, "CreateBucket", ())
    }

    async fn put_object(&self, request: PutObjectRequest) -> Result<StoredObject> {
        let url = format!("https://{}.s3.amazonaws.com/{}", request.bucket, request.key);
        self.record(Call::PutObject(request));
        self.fail(
            self.fail_put_object,
            "PutObject",
            StoredObject {
                url,
                version_id: Some("v1".to_string()),
            },
        )
    }

    async fn delete_object(&self, bucket: &str, key: &str, version_id: Option<&str>) -> Result<()> {
        self.record(Call::DeleteObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            version_id: version_id.map(String::from),
        });
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.record(Call::DeleteBucket(bucket.to_string()));
        self.fail(self.fail_delete_bucket, "DeleteBucket", ())
    }
}
