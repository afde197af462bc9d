use stackflow_cloud_aws::{EcsBackend, Operation};

pub fn handle(op: Operation) -> anyhow::Result<()> {
    tracing::debug!(operation = %op, "rejecting operation");
    EcsBackend::unsupported(op)?;
    Ok(())
}
