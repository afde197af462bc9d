//! Project definition

use super::extension::Extensions;
use super::resource::{Config, Network, Secret, Volume};
use super::service::Service;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A fully-resolved compose project.
///
/// Collections are ordered maps so that anything derived from a project
/// iterates in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub services: BTreeMap<String, Service>,
    #[serde(default)]
    pub networks: BTreeMap<String, Network>,
    #[serde(default)]
    pub secrets: BTreeMap<String, Secret>,
    #[serde(default)]
    pub volumes: BTreeMap<String, Volume>,
    #[serde(default)]
    pub configs: BTreeMap<String, Config>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a service keyed by its own name.
    pub fn with_service(mut self, service: Service) -> Self {
        self.services.insert(service.name.clone(), service);
        self
    }

    pub fn with_network(mut self, key: impl Into<String>, network: Network) -> Self {
        self.networks.insert(key.into(), network);
        self
    }

    pub fn with_secret(mut self, key: impl Into<String>, secret: Secret) -> Self {
        self.secrets.insert(key.into(), secret);
        self
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extensions.insert(key, value);
        self
    }

    /// Fill empty `name` fields from their map keys.
    pub fn resolve_names(&mut self) {
        for (key, service) in &mut self.services {
            if service.name.is_empty() {
                service.name = key.clone();
            }
        }
        for (key, network) in &mut self.networks {
            if network.name.is_empty() {
                network.name = key.clone();
            }
        }
        for (key, secret) in &mut self.secrets {
            if secret.name.is_empty() {
                secret.name = key.clone();
            }
        }
        for (key, volume) in &mut self.volumes {
            if volume.name.is_empty() {
                volume.name = key.clone();
            }
        }
        for (key, config) in &mut self.configs {
            if config.name.is_empty() {
                config.name = key.clone();
            }
        }
    }
}
