//! Target-tracking autoscaling from `x-aws-autoscaling`

use crate::X_AWS_AUTOSCALING;
use crate::error::{Result, TemplateError};
use crate::naming::{self, CLUSTER};
use crate::resources::*;
use crate::template::Template;
use serde::Deserialize;
use stackflow_core::{Project, Service};
use tracing::debug;

const AUTOSCALING_PRINCIPAL: &str = "application-autoscaling.amazonaws.com";
const COOLDOWN_SECONDS: u32 = 60;

/// `x-aws-autoscaling` as declared under a service's `deploy` section.
///
/// A zero target or bound counts as unset. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AutoscalingConfig {
    #[serde(default)]
    pub memory: Option<f64>,
    #[serde(default)]
    pub cpu: Option<f64>,
    #[serde(default)]
    pub min: Option<u32>,
    #[serde(default)]
    pub max: Option<u32>,
}

/// The utilization metric a policy tracks, with its target percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalingMetric {
    Cpu(f64),
    Memory(f64),
}

impl ScalingMetric {
    pub fn predefined_type(&self) -> &'static str {
        match self {
            Self::Cpu(_) => "ECSServiceAverageCPUUtilization",
            Self::Memory(_) => "ECSServiceAverageMemoryUtilization",
        }
    }

    pub fn target(&self) -> f64 {
        match self {
            Self::Cpu(target) | Self::Memory(target) => *target,
        }
    }
}

impl AutoscalingConfig {
    /// Validated `(metric, min, max)`. Without a target the policy tracks CPU.
    pub fn resolve(&self) -> std::result::Result<(ScalingMetric, u32, u32), String> {
        let set = |v: Option<f64>| v.filter(|t| *t != 0.0);
        let metric = match (set(self.cpu), set(self.memory)) {
            (Some(_), Some(_)) => {
                return Err("can't be set with both cpu and memory targets".to_string());
            }
            (_, Some(memory)) => ScalingMetric::Memory(memory),
            (cpu, None) => ScalingMetric::Cpu(cpu.unwrap_or(0.0)),
        };

        let max = match self.max {
            Some(max) if max > 0 => max,
            _ => return Err("MUST define max replicas".to_string()),
        };
        Ok((metric, self.min.unwrap_or(0), max))
    }
}

/// Emit role, scalable target and policy when the service asks for autoscaling.
pub fn add_autoscaling(project: &Project, service: &Service, template: &mut Template) -> Result<()> {
    let Some(extensions) = service.deploy_extensions() else {
        return Ok(());
    };
    let Some(config) = extensions.get::<AutoscalingConfig>(X_AWS_AUTOSCALING)? else {
        return Ok(());
    };

    let (metric, min, max) = config
        .resolve()
        .map_err(|message| TemplateError::Autoscaling {
            service: service.name.clone(),
            message,
        })?;
    debug!(service = %service.name, ?metric, min, max, "autoscaling");

    let service_id = naming::service_id(&service.name);
    let role_id = naming::autoscaling_role_id(service);
    let target_id = naming::scalable_target_id(service);

    template.insert(
        role_id.clone(),
        Resource::new(Role {
            assume_role_policy_document: PolicyDocument::assume_role(AUTOSCALING_PRINCIPAL),
            managed_policy_arns: Vec::new(),
            path: Some("/".to_string()),
            policies: vec![RolePolicy {
                policy_document: PolicyBody::Document(PolicyDocument::new(vec![
                    PolicyStatement::allow(
                        &[
                            "application-autoscaling:*",
                            "cloudwatch:GetMetricStatistics",
                            "ecs:DescribeServices",
                            "ecs:UpdateService",
                        ],
                        vec![Expr::reference(&service_id)],
                    ),
                ])),
                policy_name: "service-autoscaling".to_string(),
            }],
            tags: naming::service_tags(project, service),
        }),
    )?;

    template.insert(
        target_id.clone(),
        Resource::new(ScalableTarget {
            max_capacity: max,
            min_capacity: min,
            resource_id: Expr::join(
                "",
                vec![
                    Expr::literal("service/"),
                    Expr::reference(CLUSTER),
                    Expr::literal("/"),
                    Expr::get_att(&service_id, "Name"),
                ],
            ),
            role_arn: Expr::get_att(role_id, "Arn"),
            scalable_dimension: "ecs:service:DesiredCount".to_string(),
            service_namespace: "ecs".to_string(),
        })
        .depends_on([service_id]),
    )?;

    let policy_id = naming::scaling_policy_id(service);
    template.insert(
        policy_id.clone(),
        Resource::new(ScalingPolicy {
            policy_name: policy_id,
            policy_type: "TargetTrackingScaling".to_string(),
            scaling_target_id: Expr::reference(target_id),
            target_tracking_scaling_policy_configuration: TargetTrackingConfiguration {
                predefined_metric_specification: PredefinedMetricSpecification {
                    predefined_metric_type: metric.predefined_type().to_string(),
                },
                scale_in_cooldown: COOLDOWN_SECONDS,
                scale_out_cooldown: COOLDOWN_SECONDS,
                target_value: metric.target(),
            },
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(cpu: Option<f64>, memory: Option<f64>, max: Option<u32>) -> AutoscalingConfig {
        AutoscalingConfig {
            cpu,
            memory,
            min: None,
            max,
        }
    }

    #[test]
    fn test_cpu_target() {
        let (metric, min, max) = config(Some(75.0), None, Some(10)).resolve().unwrap();
        assert_eq!(metric, ScalingMetric::Cpu(75.0));
        assert_eq!(metric.predefined_type(), "ECSServiceAverageCPUUtilization");
        assert_eq!((min, max), (0, 10));
    }

    #[test]
    fn test_memory_target() {
        let (metric, _, _) = config(None, Some(60.0), Some(3)).resolve().unwrap();
        assert_eq!(metric, ScalingMetric::Memory(60.0));
    }

    #[test]
    fn test_zero_cpu_is_unset() {
        let (metric, _, _) = config(Some(0.0), Some(60.0), Some(3)).resolve().unwrap();
        assert_eq!(metric.target(), 60.0);
    }

    #[test]
    fn test_both_targets_rejected() {
        let err = config(Some(75.0), Some(60.0), Some(3)).resolve().unwrap_err();
        assert!(err.contains("both cpu and memory"));
    }

    #[test]
    fn test_max_required() {
        assert!(config(Some(75.0), None, None).resolve().is_err());
        assert!(config(Some(75.0), None, Some(0)).resolve().is_err());
    }

    #[test]
    fn test_missing_target_tracks_cpu() {
        let (metric, min, max) = config(None, None, Some(10)).resolve().unwrap();
        assert_eq!(metric, ScalingMetric::Cpu(0.0));
        assert_eq!((min, max), (0, 10));
    }

    #[test]
    fn test_min_passed_through() {
        let cfg = AutoscalingConfig {
            min: Some(5),
            ..config(Some(50.0), None, Some(2))
        };
        assert_eq!(cfg.resolve().unwrap(), (ScalingMetric::Cpu(50.0), 5, 2));
    }

    #[test]
    fn test_unknown_key_ignored() {
        let value = serde_json::json!({"cpu": 50, "max": 2, "maximum": 3});
        let cfg = serde_json::from_value::<AutoscalingConfig>(value).unwrap();
        assert_eq!(cfg, config(Some(50.0), None, Some(2)));
    }
}
