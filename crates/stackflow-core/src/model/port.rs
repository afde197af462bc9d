//! Published port definition

use serde::{Deserialize, Serialize};

/// A port published by a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Port the container listens on
    pub target: u16,
    /// Port exposed to the outside; defaults to `target` when unset
    #[serde(default)]
    pub published: Option<u16>,
    #[serde(default)]
    pub protocol: Protocol,
    /// Publication mode (`ingress` or `host`)
    #[serde(default = "default_mode")]
    pub mode: String,
}

impl Port {
    pub fn tcp(target: u16) -> Self {
        Self {
            target,
            published: Some(target),
            protocol: Protocol::Tcp,
            mode: default_mode(),
        }
    }
}

/// Transport protocol
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }

    /// Upper-case form used by load balancer listeners and target groups
    pub fn as_upper(&self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
        }
    }
}

fn default_mode() -> String {
    "ingress".to_string()
}
