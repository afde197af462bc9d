//! Service definition

use super::extension::Extensions;
use super::port::Port;
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// CPU units per whole CPU, as counted by the container platform.
pub const CPU_UNITS_PER_CPU: u64 = 1024;

/// Service definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Filled from the map key when loading
    #[serde(default)]
    pub name: String,
    pub image: Option<String>,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub entrypoint: Vec<String>,
    /// Environment variables; a `None` value is declared but unset
    #[serde(default)]
    pub environment: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub ports: Vec<Port>,
    pub healthcheck: Option<HealthCheck>,
    pub deploy: Option<Deploy>,
    #[serde(default)]
    pub secrets: Vec<ServiceSecret>,
    #[serde(default)]
    pub depends_on: BTreeSet<String>,
    /// Attached networks, keyed by project network name
    #[serde(default)]
    pub networks: BTreeMap<String, Option<ServiceNetwork>>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    pub user: Option<String>,
    pub working_dir: Option<String>,
    pub hostname: Option<String>,
    #[serde(default)]
    pub dns: Vec<String>,
    #[serde(default)]
    pub dns_search: Vec<String>,
    #[serde(default)]
    pub security_opt: Vec<String>,
    #[serde(default)]
    pub privileged: bool,
    #[serde(default)]
    pub tty: bool,
    #[serde(default)]
    pub read_only: bool,
    /// Seconds
    pub stop_grace_period: Option<u64>,
    #[serde(default)]
    pub ulimits: BTreeMap<String, Ulimit>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Service {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: Some(image.into()),
            ..Default::default()
        }
    }

    /// Declared replica count, defaulting to one.
    pub fn replicas(&self) -> u32 {
        self.deploy
            .as_ref()
            .and_then(|d| d.replicas)
            .unwrap_or(1)
    }

    /// Requested `(memory bytes, cpu units)`; limits win over reservations and an
    /// absent section requests nothing.
    pub fn resource_request(&self) -> Result<(u64, u64)> {
        let Some(deploy) = &self.deploy else {
            return Ok((0, 0));
        };
        let spec = deploy
            .resources
            .limits
            .as_ref()
            .or(deploy.resources.reservations.as_ref());
        match spec {
            Some(spec) => Ok((spec.memory.unwrap_or(0), spec.cpu_units()?)),
            None => Ok((0, 0)),
        }
    }

    /// Extensions of the deploy section, if any.
    pub fn deploy_extensions(&self) -> Option<&Extensions> {
        self.deploy.as_ref().map(|d| &d.extensions)
    }
}

/// Health check definition. Durations are in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    #[serde(default)]
    pub test: Vec<String>,
    pub interval: Option<u64>,
    pub timeout: Option<u64>,
    pub retries: Option<u64>,
    pub start_period: Option<u64>,
    #[serde(default)]
    pub disable: bool,
}

/// Secret granted to a service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSecret {
    /// Project-level secret key
    pub source: String,
    /// Name exposed to the container; defaults to `source`
    pub target: Option<String>,
}

impl ServiceSecret {
    pub fn target_name(&self) -> &str {
        self.target.as_deref().unwrap_or(&self.source)
    }
}

/// Per-service network attachment options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceNetwork {
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ulimit {
    pub soft: i64,
    pub hard: i64,
}

/// Deploy section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deploy {
    pub replicas: Option<u32>,
    #[serde(default)]
    pub resources: Resources,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    pub limits: Option<ResourceSpec>,
    pub reservations: Option<ResourceSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Fractional CPU count, e.g. "0.5"
    pub cpus: Option<String>,
    /// Bytes
    pub memory: Option<u64>,
}

impl ResourceSpec {
    /// CPU request expressed in platform CPU units (1024 per CPU).
    pub fn cpu_units(&self) -> Result<u64> {
        let Some(cpus) = self.cpus.as_deref().map(str::trim).filter(|c| !c.is_empty()) else {
            return Ok(0);
        };
        let value: f64 = cpus
            .parse()
            .map_err(|_| CoreError::InvalidCpus(cpus.to_string()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(CoreError::InvalidCpus(cpus.to_string()));
        }
        Ok((value * CPU_UNITS_PER_CPU as f64).round() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_limits(cpus: Option<&str>, memory: Option<u64>) -> Service {
        Service {
            deploy: Some(Deploy {
                resources: Resources {
                    limits: Some(ResourceSpec {
                        cpus: cpus.map(String::from),
                        memory,
                    }),
                    reservations: None,
                },
                ..Default::default()
            }),
            ..Service::new("api", "nginx")
        }
    }

    #[test]
    fn test_replicas_default_to_one() {
        assert_eq!(Service::new("api", "nginx").replicas(), 1);
    }

    #[test]
    fn test_replicas_from_deploy() {
        let service = Service {
            deploy: Some(Deploy {
                replicas: Some(4),
                ..Default::default()
            }),
            ..Service::new("api", "nginx")
        };
        assert_eq!(service.replicas(), 4);
    }

    #[test]
    fn test_cpu_units_conversion() {
        let spec = ResourceSpec {
            cpus: Some("0.5".to_string()),
            memory: None,
        };
        assert_eq!(spec.cpu_units().unwrap(), 512);

        let spec = ResourceSpec {
            cpus: Some("4".to_string()),
            memory: None,
        };
        assert_eq!(spec.cpu_units().unwrap(), 4096);
    }

    #[test]
    fn test_invalid_cpus_rejected() {
        let spec = ResourceSpec {
            cpus: Some("lots".to_string()),
            memory: None,
        };
        assert!(matches!(spec.cpu_units(), Err(CoreError::InvalidCpus(_))));
    }

    #[test]
    fn test_resource_request_prefers_limits() {
        let mut service = with_limits(Some("1"), Some(2048 * 1024 * 1024));
        if let Some(deploy) = service.deploy.as_mut() {
            deploy.resources.reservations = Some(ResourceSpec {
                cpus: Some("0.25".to_string()),
                memory: Some(512),
            });
        }
        assert_eq!(
            service.resource_request().unwrap(),
            (2048 * 1024 * 1024, 1024)
        );
    }

    #[test]
    fn test_resource_request_memory_only() {
        let service = with_limits(None, Some(1024));
        assert_eq!(service.resource_request().unwrap(), (1024, 0));
    }

    #[test]
    fn test_secret_target_defaults_to_source() {
        let secret = ServiceSecret {
            source: "db_password".to_string(),
            target: None,
        };
        assert_eq!(secret.target_name(), "db_password");
    }
}
