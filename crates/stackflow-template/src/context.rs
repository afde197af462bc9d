//! Infrastructure references the synthesizer attaches to but never creates

use crate::error::{Result, TemplateError};
use crate::{X_AWS_LOADBALANCER, X_AWS_SECURITY_GROUPS, X_AWS_SUBNETS, X_AWS_VPC};
use stackflow_core::Project;
use std::collections::BTreeMap;

/// Load balancer, VPC, subnets and per-network security groups for one synthesis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentContext {
    pub load_balancer: String,
    pub vpc: String,
    pub subnets: Vec<String>,
    /// Project network name → security group id
    pub security_groups: BTreeMap<String, String>,
}

impl DeploymentContext {
    pub fn new(
        load_balancer: impl Into<String>,
        vpc: impl Into<String>,
        subnets: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            load_balancer: load_balancer.into(),
            vpc: vpc.into(),
            subnets: subnets.into_iter().map(Into::into).collect(),
            security_groups: BTreeMap::new(),
        }
    }

    pub fn with_security_group(
        mut self,
        network: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        self.security_groups.insert(network.into(), group.into());
        self
    }

    /// Build the context from the project's `x-aws-*` extensions.
    ///
    /// External networks contribute their resolved name as security group;
    /// `x-aws-security-groups` entries take precedence.
    pub fn from_project(project: &Project) -> Result<Self> {
        let extensions = &project.extensions;

        let load_balancer = extensions
            .get::<String>(X_AWS_LOADBALANCER)?
            .ok_or(TemplateError::MissingContext(X_AWS_LOADBALANCER))?;
        let vpc = extensions
            .get::<String>(X_AWS_VPC)?
            .ok_or(TemplateError::MissingContext(X_AWS_VPC))?;
        let subnets = extensions
            .get::<Vec<String>>(X_AWS_SUBNETS)?
            .ok_or(TemplateError::MissingContext(X_AWS_SUBNETS))?;

        let mut security_groups: BTreeMap<String, String> = project
            .networks
            .iter()
            .filter(|(_, network)| network.external && !network.name.is_empty())
            .map(|(key, network)| (key.clone(), network.name.clone()))
            .collect();
        if let Some(overrides) = extensions.get::<BTreeMap<String, String>>(X_AWS_SECURITY_GROUPS)? {
            security_groups.extend(overrides);
        }

        let context = Self {
            load_balancer,
            vpc,
            subnets,
            security_groups,
        };
        context.validate()?;
        Ok(context)
    }

    /// Every field but the security group map is mandatory.
    pub fn validate(&self) -> Result<()> {
        if self.load_balancer.is_empty() {
            return Err(TemplateError::MissingContext(X_AWS_LOADBALANCER));
        }
        if self.vpc.is_empty() {
            return Err(TemplateError::MissingContext(X_AWS_VPC));
        }
        if self.subnets.is_empty() {
            return Err(TemplateError::MissingContext(X_AWS_SUBNETS));
        }
        Ok(())
    }

    pub fn security_group(&self, network: &str) -> Option<&str> {
        self.security_groups.get(network).map(String::as_str)
    }
}
