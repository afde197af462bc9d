use colored::Colorize;
use stackflow_core::Project;
use stackflow_template::OutputFormat;
use std::io::Write;
use std::path::Path;

pub fn handle(project: &Project, format: &str, output: Option<&Path>) -> anyhow::Result<()> {
    let format: OutputFormat = format.parse()?;
    let rendered = stackflow_template::config(project, format)?;

    match output {
        Some(path) => {
            std::fs::write(path, &rendered)?;
            eprintln!(
                "{} {}",
                "✓ template written to".green(),
                path.display().to_string().cyan()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&rendered)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
