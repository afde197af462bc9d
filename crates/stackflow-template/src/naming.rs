//! Logical resource identifiers and resource tags
//!
//! Identifiers are derived from service, network and port identity only, so
//! synthesizing the same project twice yields the same keys. Names are
//! normalized by dropping everything outside `[A-Za-z0-9]` and title-casing the
//! rest; distinct names may normalize to the same identifier, which the template
//! rejects on insertion.

use crate::resources::Tag;
use stackflow_core::{PROJECT_LABEL, Port, Project, SERVICE_LABEL, Service};

pub const CLOUD_MAP: &str = "CloudMap";
pub const CLUSTER: &str = "Cluster";
pub const LOG_GROUP: &str = "LogGroup";

/// Strip non-alphanumerics and title-case the remainder. Total over any input.
pub fn normalize(name: &str) -> String {
    let mut chars = name.chars().filter(char::is_ascii_alphanumeric);
    match chars.next() {
        Some(first) => std::iter::once(first.to_ascii_uppercase())
            .chain(chars.map(|c| c.to_ascii_lowercase()))
            .collect(),
        None => String::new(),
    }
}

/// Concatenate the normalized scope names followed by a fixed kind suffix.
pub fn logical_id(kind: &str, scopes: &[&str]) -> String {
    let mut id: String = scopes.iter().map(|s| normalize(s)).collect();
    id.push_str(kind);
    id
}

pub fn service_id(name: &str) -> String {
    logical_id("Service", &[name])
}

pub fn discovery_entry_id(service: &Service) -> String {
    logical_id("ServiceDiscoveryEntry", &[&service.name])
}

pub fn task_definition_id(service: &Service) -> String {
    logical_id("TaskDefinition", &[&service.name])
}

pub fn task_execution_role_id(service: &Service) -> String {
    logical_id("TaskExecutionRole", &[&service.name])
}

pub fn task_role_id(service: &Service) -> String {
    logical_id("TaskRole", &[&service.name])
}

pub fn task_role_policy_name(service: &Service) -> String {
    logical_id("Policy", &[&service.name])
}

pub fn listener_id(service: &Service, port: &Port) -> String {
    format!(
        "{}{}{}Listener",
        normalize(&service.name),
        port.protocol.as_upper(),
        port.target
    )
}

pub fn target_group_id(service: &Service, port: &Port) -> String {
    format!(
        "{}{}{}TargetGroup",
        normalize(&service.name),
        port.protocol.as_upper(),
        port.target
    )
}

pub fn ingress_id(network: &str, port: &Port) -> String {
    format!(
        "{}{}{}Ingress",
        normalize(network),
        port.protocol.as_upper(),
        port.target
    )
}

pub fn autoscaling_role_id(service: &Service) -> String {
    logical_id("AutoScalingRole", &[&service.name])
}

pub fn scalable_target_id(service: &Service) -> String {
    logical_id("ScalableTarget", &[&service.name])
}

pub fn scaling_policy_id(service: &Service) -> String {
    logical_id("ScalingPolicy", &[&service.name])
}

/// Tags carried by every project-scoped resource.
pub fn project_tags(project: &Project) -> Vec<Tag> {
    vec![Tag::new(PROJECT_LABEL, &project.name)]
}

/// Project tags plus the service tag, appended.
pub fn service_tags(project: &Project, service: &Service) -> Vec<Tag> {
    let mut tags = project_tags(project);
    tags.push(Tag::new(SERVICE_LABEL, &service.name));
    tags
}
