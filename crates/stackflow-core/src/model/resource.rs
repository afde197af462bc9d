//! Top-level networks, secrets, volumes and configs

use serde::{Deserialize, Serialize};

/// Network definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    /// Resolved name; for an external network this is the identity of the
    /// pre-existing isolation boundary (a security group)
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub external: bool,
    #[serde(default)]
    pub internal: bool,
}

impl Network {
    pub fn external(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            external: true,
            internal: false,
        }
    }

    /// Whether this is the network compose creates implicitly for every project.
    pub fn is_default(&self, key: &str) -> bool {
        key == "default" || self.name.ends_with("_default")
    }
}

/// Secret definition. External secrets carry the secret identity (ARN) as their name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub external: bool,
}

impl Secret {
    pub fn external(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            external: true,
        }
    }
}

/// Named volume definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub external: bool,
}

/// Config definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub external: bool,
}
