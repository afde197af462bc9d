use stackflow_cloud_aws::EcsBackend;
use stackflow_core::Project;

pub fn handle(project: &Project) -> anyhow::Result<()> {
    EcsBackend::down(&project.name)?;
    Ok(())
}
