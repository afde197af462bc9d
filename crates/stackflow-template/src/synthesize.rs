//! Project → CloudFormation resource graph

use crate::autoscaling;
use crate::compat::check_compatibility;
use crate::context::DeploymentContext;
use crate::error::{Result, TemplateError};
use crate::naming::{self, CLOUD_MAP, CLUSTER, LOG_GROUP, normalize};
use crate::resources::*;
use crate::sizing::{self, TaskSize};
use crate::template::Template;
use crate::{X_AWS_CLUSTER, X_AWS_PULL_CREDENTIALS, X_AWS_ROLE};
use stackflow_core::{Port, Project, Service};
use tracing::{debug, info, instrument};

const ECS_TASKS_PRINCIPAL: &str = "ecs-tasks.amazonaws.com";
const EXECUTION_ROLE_POLICY: &str =
    "arn:aws:iam::aws:policy/service-role/AmazonECSTaskExecutionRolePolicy";
const SECRET_READ_ACTIONS: &[&str] = &[
    "secretsmanager:GetSecretValue",
    "ssm:GetParameters",
    "kms:Decrypt",
];

/// Build the context from the project's own extensions, then synthesize.
pub fn convert(project: &Project) -> Result<Template> {
    check_compatibility(project)?;
    let context = DeploymentContext::from_project(project)?;
    synthesize(project, &context)
}

/// Synthesize the full resource graph for `project`.
///
/// Any failure aborts the whole synthesis; no partial template is returned.
#[instrument(skip_all, fields(project = %project.name))]
pub fn synthesize(project: &Project, context: &DeploymentContext) -> Result<Template> {
    check_compatibility(project)?;
    context.validate()?;

    let mut template = Template::new();
    if let Some(cluster) = project.extensions.raw(X_AWS_CLUSTER) {
        template
            .metadata
            .insert("Cluster".to_string(), cluster.clone());
    }

    add_shared_resources(project, context, &mut template)?;

    for service in project.services.values() {
        debug!(service = %service.name, "synthesizing service");
        add_service(project, context, service, &mut template)?;
    }

    info!(resources = template.len(), "template synthesized");
    Ok(template)
}

fn add_shared_resources(
    project: &Project,
    context: &DeploymentContext,
    template: &mut Template,
) -> Result<()> {
    template.insert(
        CLOUD_MAP,
        Resource::new(PrivateDnsNamespace {
            description: format!("Service Map for Docker Compose project {}", project.name),
            name: format!("{}.local", project.name),
            tags: naming::project_tags(project),
            vpc: context.vpc.clone(),
        }),
    )?;
    template.insert(
        CLUSTER,
        Resource::new(Cluster {
            cluster_name: project.name.clone(),
            tags: naming::project_tags(project),
        }),
    )?;
    template.insert(
        LOG_GROUP,
        Resource::new(LogGroup {
            log_group_name: format!("/docker-compose/{}", project.name),
        }),
    )
}

fn add_service(
    project: &Project,
    context: &DeploymentContext,
    service: &Service,
    template: &mut Template,
) -> Result<()> {
    let (memory, cpu) = service.resource_request()?;
    let size = sizing::fit(memory, cpu)?;
    debug!(service = %service.name, %size, "task size");

    template.insert(
        naming::discovery_entry_id(service),
        discovery_entry(service),
    )?;
    template.insert(
        naming::task_execution_role_id(service),
        execution_role(project, service)?,
    )?;
    template.insert(naming::task_role_id(service), task_role(project, service)?)?;
    template.insert(
        naming::task_definition_id(service),
        task_definition(project, service, size)?,
    )?;

    for port in &service.ports {
        for network in service.networks.keys() {
            let Some(group) = context.security_group(network) else {
                debug!(service = %service.name, %network, "no security group, skipping ingress");
                continue;
            };
            template.insert_shared(
                naming::ingress_id(network, port),
                ingress_rule(network, group, port),
            )?;
        }

        template.insert(
            naming::listener_id(service, port),
            listener(context, service, port),
        )?;
        template.insert(
            naming::target_group_id(service, port),
            target_group(project, context, service, port),
        )?;
    }

    template.insert(
        naming::service_id(&service.name),
        ecs_service(project, context, service)?,
    )?;

    autoscaling::add_autoscaling(project, service, template)
}

fn discovery_entry(service: &Service) -> Resource {
    Resource::new(DiscoveryService {
        description: format!("{:?} service discovery entry in Cloud Map", service.name),
        dns_config: DnsConfig {
            dns_records: vec![DnsRecord {
                ttl: 60,
                kind: "A".to_string(),
            }],
            routing_policy: "MULTIVALUE".to_string(),
        },
        health_check_custom_config: HealthCheckCustomConfig {
            failure_threshold: 1,
        },
        name: service.name.clone(),
        namespace_id: Expr::reference(CLOUD_MAP),
    })
}

/// Secret identities the task needs at launch: pull credentials first, then
/// declared secrets in declaration order.
fn secret_arns(project: &Project, service: &Service) -> Result<Vec<String>> {
    let mut arns = Vec::new();
    if let Some(credentials) = service.extensions.get::<String>(X_AWS_PULL_CREDENTIALS)? {
        arns.push(credentials);
    }
    for secret in &service.secrets {
        arns.push(secret_arn(project, service, &secret.source)?);
    }
    Ok(arns)
}

fn secret_arn(project: &Project, service: &Service, source: &str) -> Result<String> {
    project
        .secrets
        .get(source)
        .map(|s| s.name.clone())
        .ok_or_else(|| TemplateError::UnknownSecret {
            service: service.name.clone(),
            secret: source.to_string(),
        })
}

fn execution_role(project: &Project, service: &Service) -> Result<Resource> {
    let arns = secret_arns(project, service)?;
    let policies = if arns.is_empty() {
        Vec::new()
    } else {
        vec![RolePolicy {
            policy_document: PolicyBody::Document(PolicyDocument::new(vec![
                PolicyStatement::allow(
                    SECRET_READ_ACTIONS,
                    arns.into_iter().map(Expr::Literal).collect(),
                ),
            ])),
            policy_name: format!("{}GrantAccessToSecrets", normalize(&service.name)),
        }]
    };

    Ok(Resource::new(Role {
        assume_role_policy_document: PolicyDocument::assume_role(ECS_TASKS_PRINCIPAL),
        managed_policy_arns: vec![EXECUTION_ROLE_POLICY.to_string()],
        path: None,
        policies,
        tags: naming::service_tags(project, service),
    }))
}

fn task_role(project: &Project, service: &Service) -> Result<Resource> {
    let policies = match service
        .extensions
        .get::<serde_json::Map<String, serde_json::Value>>(X_AWS_ROLE)?
    {
        Some(document) => vec![RolePolicy {
            policy_document: PolicyBody::Raw(serde_json::Value::Object(document)),
            policy_name: naming::task_role_policy_name(service),
        }],
        None => Vec::new(),
    };

    Ok(Resource::new(Role {
        assume_role_policy_document: PolicyDocument::assume_role(ECS_TASKS_PRINCIPAL),
        managed_policy_arns: Vec::new(),
        path: None,
        policies,
        tags: naming::service_tags(project, service),
    }))
}

fn task_definition(project: &Project, service: &Service, size: TaskSize) -> Result<Resource> {
    let secrets = service
        .secrets
        .iter()
        .map(|secret| {
            Ok(ContainerSecret {
                name: secret.target_name().to_string(),
                value_from: secret_arn(project, service, &secret.source)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let repository_credentials = service
        .extensions
        .get::<String>(X_AWS_PULL_CREDENTIALS)?
        .map(|credentials_parameter| RepositoryCredentials {
            credentials_parameter,
        });

    let container = ContainerDefinition {
        name: service.name.clone(),
        image: service.image.clone(),
        command: service.command.clone(),
        entry_point: service.entrypoint.clone(),
        // unset variables have no value to pass
        environment: service
            .environment
            .iter()
            .filter_map(|(name, value)| {
                value.as_ref().map(|value| KeyValuePair {
                    name: name.clone(),
                    value: value.clone(),
                })
            })
            .collect(),
        essential: true,
        health_check: health_check(service),
        user: service.user.clone(),
        working_directory: service.working_dir.clone(),
        hostname: service.hostname.clone(),
        log_configuration: LogConfiguration {
            log_driver: "awslogs".to_string(),
            options: [
                ("awslogs-group", Expr::reference(LOG_GROUP)),
                ("awslogs-region", Expr::reference("AWS::Region")),
                ("awslogs-stream-prefix", Expr::literal(&project.name)),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        },
        port_mappings: service
            .ports
            .iter()
            .map(|port| PortMapping {
                container_port: port.target,
                protocol: port.protocol.as_str().to_string(),
            })
            .collect(),
        secrets,
        repository_credentials,
        docker_labels: service.labels.clone(),
        dns_servers: service.dns.clone(),
        dns_search_domains: service.dns_search.clone(),
        docker_security_options: service.security_opt.clone(),
        privileged: service.privileged,
        pseudo_terminal: service.tty,
        readonly_root_filesystem: service.read_only,
        stop_timeout: service.stop_grace_period,
        ulimits: service
            .ulimits
            .iter()
            .map(|(name, limit)| ContainerUlimit {
                name: name.clone(),
                soft_limit: limit.soft,
                hard_limit: limit.hard,
            })
            .collect(),
    };

    Ok(Resource::new(TaskDefinition {
        container_definitions: vec![container],
        cpu: size.cpu_string(),
        execution_role_arn: Expr::reference(naming::task_execution_role_id(service)),
        family: format!("{}-{}", project.name, service.name),
        memory: size.memory_string(),
        network_mode: "awsvpc".to_string(),
        requires_compatibilities: vec!["FARGATE".to_string()],
        task_role_arn: Expr::reference(naming::task_role_id(service)),
    }))
}

fn health_check(service: &Service) -> Option<ContainerHealthCheck> {
    let check = service.healthcheck.as_ref()?;
    if check.disable || check.test.is_empty() {
        return None;
    }
    Some(ContainerHealthCheck {
        command: check.test.clone(),
        interval: check.interval,
        timeout: check.timeout,
        retries: check.retries,
        start_period: check.start_period,
    })
}

fn ingress_rule(network: &str, group: &str, port: &Port) -> Resource {
    Resource::new(SecurityGroupIngress {
        cidr_ip: "0.0.0.0/0".to_string(),
        description: format!(
            "{}/{} on {} network",
            port.target,
            port.protocol.as_str(),
            network
        ),
        from_port: port.target,
        group_id: group.to_string(),
        ip_protocol: port.protocol.as_str().to_string(),
        to_port: port.target,
    })
}

fn listener(context: &DeploymentContext, service: &Service, port: &Port) -> Resource {
    Resource::new(Listener {
        default_actions: vec![ListenerAction::forward(Expr::reference(
            naming::target_group_id(service, port),
        ))],
        load_balancer_arn: context.load_balancer.clone(),
        port: port.target,
        protocol: port.protocol.as_upper().to_string(),
    })
}

fn target_group(
    project: &Project,
    context: &DeploymentContext,
    service: &Service,
    port: &Port,
) -> Resource {
    Resource::new(TargetGroup {
        port: port.target,
        protocol: port.protocol.as_upper().to_string(),
        tags: naming::service_tags(project, service),
        target_type: "ip".to_string(),
        vpc_id: context.vpc.clone(),
    })
}

fn ecs_service(
    project: &Project,
    context: &DeploymentContext,
    service: &Service,
) -> Result<Resource> {
    let mut depends_on = Vec::new();
    for dependency in &service.depends_on {
        if !project.services.contains_key(dependency) {
            return Err(TemplateError::UnknownDependency {
                service: service.name.clone(),
                dependency: dependency.clone(),
            });
        }
        depends_on.push(naming::service_id(dependency));
    }
    depends_on.extend(
        service
            .ports
            .iter()
            .map(|port| naming::listener_id(service, port)),
    );

    let mut security_groups: Vec<String> = Vec::new();
    for group in service
        .networks
        .keys()
        .filter_map(|network| context.security_group(network))
    {
        if !security_groups.iter().any(|g| g == group) {
            security_groups.push(group.to_string());
        }
    }

    let body = EcsService {
        cluster: Expr::get_att(CLUSTER, "Arn"),
        deployment_configuration: DeploymentConfiguration {
            maximum_percent: 200,
            minimum_healthy_percent: 100,
        },
        deployment_controller: DeploymentController {
            kind: "ECS".to_string(),
        },
        desired_count: service.replicas(),
        launch_type: "FARGATE".to_string(),
        load_balancers: service
            .ports
            .iter()
            .map(|port| LoadBalancerBinding {
                container_name: service.name.clone(),
                container_port: port.target,
                target_group_arn: Expr::reference(naming::target_group_id(service, port)),
            })
            .collect(),
        network_configuration: NetworkConfiguration {
            awsvpc_configuration: AwsVpcConfiguration {
                assign_public_ip: "ENABLED".to_string(),
                security_groups,
                subnets: context.subnets.clone(),
            },
        },
        platform_version: "LATEST".to_string(),
        propagate_tags: "SERVICE".to_string(),
        scheduling_strategy: "REPLICA".to_string(),
        service_registries: vec![ServiceRegistry {
            registry_arn: Expr::get_att(naming::discovery_entry_id(service), "Arn"),
        }],
        tags: naming::service_tags(project, service),
        task_definition: Expr::reference(naming::task_definition_id(service)),
    };

    Ok(Resource::new(body).depends_on(depends_on))
}
