//! Target platform compatibility checks
//!
//! ECS synthesis only attaches to pre-existing networks and secrets and cannot
//! provision storage. The first violation found is reported.

use crate::error::{Result, TemplateError};
use stackflow_core::Project;
use tracing::debug;

/// Reject projects declaring resources the synthesizer cannot honour.
pub fn check_compatibility(project: &Project) -> Result<()> {
    if let Some((key, config)) = project.configs.iter().next() {
        return Err(TemplateError::ConfigsNotSupported(display_name(
            key,
            &config.name,
        )));
    }

    for (key, network) in &project.networks {
        if network.is_default(key) {
            debug!(network = %key, "skipping implicit default network");
            continue;
        }
        if !network.external {
            return Err(TemplateError::ExternalNetworksOnly(display_name(
                key,
                &network.name,
            )));
        }
    }

    if let Some((key, secret)) = project.secrets.iter().find(|(_, s)| !s.external) {
        return Err(TemplateError::ExternalSecretsOnly(display_name(
            key,
            &secret.name,
        )));
    }

    if let Some((key, volume)) = project.volumes.iter().next() {
        return Err(TemplateError::VolumesNotSupported(display_name(
            key,
            &volume.name,
        )));
    }

    Ok(())
}

fn display_name(key: &str, name: &str) -> String {
    if name.is_empty() {
        key.to_string()
    } else {
        name.to_string()
    }
}
