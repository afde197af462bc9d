//! ECS backend facade
//!
//! `config` and `up` are the only operations backed by CloudFormation. Every
//! other compose operation fails loudly with `NotImplemented`.

use crate::error::Result;
use crate::sdk::AwsSdk;
use stackflow_cloud::{
    CloudError, DeployOptions, DeployOutcome, Deployer, ObjectStore, StackApi,
};
use stackflow_core::Project;
use stackflow_template::OutputFormat;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Compose operations the ECS backend does not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Build,
    Push,
    Pull,
    Create,
    Start,
    Restart,
    Stop,
    Kill,
    Run,
    Remove,
    Attach,
    Copy,
    Port,
    Publish,
    Watch,
    Viz,
    Wait,
    Scale,
    Logs,
    Exec,
    Ps,
}

impl Operation {
    pub const ALL: [Operation; 21] = [
        Self::Build,
        Self::Push,
        Self::Pull,
        Self::Create,
        Self::Start,
        Self::Restart,
        Self::Stop,
        Self::Kill,
        Self::Run,
        Self::Remove,
        Self::Attach,
        Self::Copy,
        Self::Port,
        Self::Publish,
        Self::Watch,
        Self::Viz,
        Self::Wait,
        Self::Scale,
        Self::Logs,
        Self::Exec,
        Self::Ps,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Push => "push",
            Self::Pull => "pull",
            Self::Create => "create",
            Self::Start => "start",
            Self::Restart => "restart",
            Self::Stop => "stop",
            Self::Kill => "kill",
            Self::Run => "run",
            Self::Remove => "rm",
            Self::Attach => "attach",
            Self::Copy => "cp",
            Self::Port => "port",
            Self::Publish => "publish",
            Self::Watch => "watch",
            Self::Viz => "viz",
            Self::Wait => "wait",
            Self::Scale => "scale",
            Self::Logs => "logs",
            Self::Exec => "exec",
            Self::Ps => "ps",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = CloudError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| CloudError::InvalidConfig(format!("unknown operation: {s}")))
    }
}

pub struct EcsBackend {
    stacks: Arc<dyn StackApi>,
    objects: Arc<dyn ObjectStore>,
    region: String,
    options: DeployOptions,
}

impl EcsBackend {
    pub fn new(stacks: Arc<dyn StackApi>, objects: Arc<dyn ObjectStore>, region: impl Into<String>) -> Self {
        Self {
            stacks,
            objects,
            region: region.into(),
            options: DeployOptions::default(),
        }
    }

    /// Backend talking to AWS with credentials from the environment.
    pub async fn from_env(profile: Option<&str>, region: Option<&str>) -> Result<Self> {
        let sdk = Arc::new(AwsSdk::load(profile, region).await);
        let region = sdk
            .region()
            .map(String::from)
            .ok_or_else(|| CloudError::InvalidConfig("no AWS region configured".to_string()))?;
        Ok(Self::new(sdk.clone(), sdk, region))
    }

    pub fn with_options(mut self, options: DeployOptions) -> Self {
        self.options = options;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Render the project's CloudFormation template.
    pub fn config(&self, project: &Project, format: OutputFormat) -> Result<Vec<u8>> {
        Ok(stackflow_template::config(project, format)?)
    }

    /// Synthesize the project and deploy it as a stack named after the project.
    #[instrument(skip_all, fields(project = %project.name, region = %self.region))]
    pub async fn up(&self, project: &Project, cancel: &CancellationToken) -> Result<DeployOutcome> {
        let template = self.config(project, OutputFormat::Yaml)?;
        info!(bytes = template.len(), "template rendered");

        let deployer = Deployer::new(self.stacks.clone(), self.objects.clone())
            .with_options(self.options.clone());
        Ok(deployer
            .deploy(&project.name, &self.region, &template, cancel)
            .await?)
    }

    /// Rejected before any AWS session is built.
    pub fn down(project_name: &str) -> Result<()> {
        debug!(project = %project_name, "rejecting down");
        Err(CloudError::not_implemented("down").into())
    }

    /// Needs no AWS session; the operation is rejected before any call.
    pub fn unsupported(operation: Operation) -> Result<()> {
        Err(CloudError::not_implemented(operation.as_str()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use stackflow_cloud::{
        ChangeSetDescription, CreateChangeSetRequest, CreateStackRequest, PutObjectRequest,
        StackSummary, StoredObject, TemplateSource,
    };
    use stackflow_core::{Port, Service};
    use std::sync::Mutex;

    /// Reports no stack and keeps the submitted template.
    #[derive(Default)]
    struct Recorder {
        created: Mutex<Option<CreateStackRequest>>,
    }

    #[async_trait]
    impl StackApi for Recorder {
        async fn describe_stack(&self, _: &str) -> stackflow_cloud::Result<Option<StackSummary>> {
            Ok(None)
        }

        async fn create_stack(&self, request: CreateStackRequest) -> stackflow_cloud::Result<String> {
            *self.created.lock().unwrap() = Some(request);
            Ok("arn:stack/demo".to_string())
        }

        async fn create_change_set(&self, _: CreateChangeSetRequest) -> stackflow_cloud::Result<String> {
            unreachable!("stack is absent")
        }

        async fn describe_change_set(&self, _: &str, _: &str) -> stackflow_cloud::Result<ChangeSetDescription> {
            unreachable!("stack is absent")
        }

        async fn execute_change_set(&self, _: &str, _: &str) -> stackflow_cloud::Result<()> {
            unreachable!("stack is absent")
        }
    }

    #[async_trait]
    impl ObjectStore for Recorder {
        async fn create_bucket(&self, _: &str, _: Option<&str>) -> stackflow_cloud::Result<()> {
            unreachable!("template is small")
        }

        async fn put_object(&self, _: PutObjectRequest) -> stackflow_cloud::Result<StoredObject> {
            unreachable!("template is small")
        }

        async fn delete_object(&self, _: &str, _: &str, _: Option<&str>) -> stackflow_cloud::Result<()> {
            Ok(())
        }

        async fn delete_bucket(&self, _: &str) -> stackflow_cloud::Result<()> {
            Ok(())
        }
    }

    fn project() -> Project {
        let mut web = Service::new("web", "nginx");
        web.ports.push(Port::tcp(80));
        Project::new("demo")
            .with_service(web)
            .with_extension("x-aws-loadbalancer", json!("arn:lb"))
            .with_extension("x-aws-vpc", json!("vpc-1"))
            .with_extension("x-aws-subnets", json!(["subnet-a"]))
    }

    fn backend(recorder: &Arc<Recorder>) -> EcsBackend {
        EcsBackend::new(recorder.clone(), recorder.clone(), "eu-west-1")
    }

    #[test]
    fn test_operation_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
        assert!("deploy".parse::<Operation>().is_err());
    }

    #[test]
    fn test_every_unsupported_operation_fails() {
        for op in Operation::ALL {
            let err = EcsBackend::unsupported(op).unwrap_err();
            assert!(err.is_not_implemented());
            assert!(err.to_string().contains(op.as_str()));
        }
    }

    #[test]
    fn test_down_is_not_implemented() {
        let err = EcsBackend::down("demo").unwrap_err();
        assert!(err.is_not_implemented());
        assert!(err.to_string().contains("down"));
    }

    #[test]
    fn test_config_renders_yaml() {
        let backend = backend(&Arc::new(Recorder::default()));
        let yaml = String::from_utf8(backend.config(&project(), OutputFormat::Yaml).unwrap()).unwrap();
        assert!(yaml.contains("WebService"));
        assert!(yaml.contains("AWS::ECS::Cluster"));
    }

    #[test]
    fn test_config_reports_template_errors() {
        let backend = backend(&Arc::new(Recorder::default()));
        let err = backend.config(&Project::new("demo"), OutputFormat::Yaml).unwrap_err();
        assert!(matches!(err, crate::BackendError::Template(_)));
    }

    #[tokio::test]
    async fn test_up_creates_stack_with_inline_template() {
        let recorder = Arc::new(Recorder::default());

        let outcome = backend(&recorder)
            .up(&project(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            DeployOutcome::Created {
                stack_id: "arn:stack/demo".to_string()
            }
        );

        let request = recorder.created.lock().unwrap().clone().unwrap();
        assert_eq!(request.stack_name, "demo");
        let TemplateSource::Body(body) = request.template else {
            panic!("expected inline template");
        };
        assert!(body.contains("AWSTemplateFormatVersion"));
    }
}
