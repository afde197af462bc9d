use colored::Colorize;
use stackflow_core::Project;
use stackflow_template::DeploymentContext;

/// Checks compatibility, context and synthesis without touching AWS.
pub fn handle(project: &Project) -> anyhow::Result<()> {
    println!("{}", "Validating project...".blue());

    stackflow_template::check_compatibility(project)?;
    let context = DeploymentContext::from_project(project)?;
    let template = stackflow_template::synthesize(project, &context)?;

    println!("{}", "✓ project can be deployed".green().bold());
    println!();
    println!("Summary:");
    println!("  project: {}", project.name.cyan());
    println!("  services: {}", project.services.len());
    for (name, service) in &project.services {
        let (memory, cpu) = service.resource_request()?;
        let size = stackflow_template::fit(memory, cpu)?;
        println!(
            "    - {} ({}, {} replica(s), {})",
            name.cyan(),
            service.image.as_deref().unwrap_or("(no image)"),
            service.replicas(),
            size
        );
    }
    println!("  resources: {}", template.len());

    Ok(())
}
