use crate::utils::AwsTarget;
use colored::Colorize;
use stackflow_cloud::DeployOutcome;
use stackflow_core::Project;
use tokio_util::sync::CancellationToken;

pub async fn handle(project: &Project, target: &AwsTarget) -> anyhow::Result<()> {
    let backend = target.backend().await?;
    println!(
        "{} {} ({})",
        "Deploying".blue(),
        project.name.cyan(),
        backend.region()
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "interrupted, cleaning up...".yellow());
            on_interrupt.cancel();
        }
    });

    match backend.up(project, &cancel).await? {
        DeployOutcome::Created { stack_id } => {
            println!("{}", "✓ stack created".green().bold());
            println!("  {}", stack_id);
        }
        DeployOutcome::Updated { change_set_id } => {
            println!("{}", "✓ stack update started".green().bold());
            println!("  {}", change_set_id);
        }
        DeployOutcome::Unchanged => {
            println!("{}", "✓ stack is up to date".green());
        }
    }

    Ok(())
}
