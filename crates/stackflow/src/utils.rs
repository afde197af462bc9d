use colored::Colorize;
use stackflow_config::Settings;
use stackflow_core::Project;
use std::path::Path;

/// Load the project from `file`, or from the discovered project file.
pub fn load_project(file: Option<&Path>) -> anyhow::Result<Project> {
    let path = match file {
        Some(path) => path.to_path_buf(),
        None => stackflow_config::find_project_file()?,
    };
    tracing::debug!(path = %path.display(), "loading project");
    let project = stackflow_core::load_project(&path)?;
    eprintln!("📄 {}", path.display().to_string().cyan());
    Ok(project)
}

/// Where the AWS calls go.
#[derive(Debug, Clone, Default)]
pub struct AwsTarget {
    pub region: Option<String>,
    pub profile: Option<String>,
}

impl AwsTarget {
    /// Flags win over environment, which wins over the settings file.
    pub fn resolve(region: Option<String>, profile: Option<String>) -> anyhow::Result<Self> {
        let settings = Settings::load()?;
        Ok(Self {
            region: region.or(settings.region),
            profile: profile.or(settings.profile),
        })
    }

    pub async fn backend(&self) -> anyhow::Result<stackflow_cloud_aws::EcsBackend> {
        Ok(stackflow_cloud_aws::EcsBackend::from_env(
            self.profile.as_deref(),
            self.region.as_deref(),
        )
        .await?)
    }
}
