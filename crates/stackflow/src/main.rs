mod commands;
mod utils;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use stackflow_cloud_aws::Operation;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stackflow")]
#[command(about = "Deploy compose projects to Amazon ECS", long_about = None)]
struct Cli {
    /// Project file (defaults to STACKFLOW_FILE, then stackflow[.local].yaml / stackflow.json)
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,
    /// AWS region (overrides AWS_REGION and the settings file)
    #[arg(long, global = true)]
    region: Option<String>,
    /// AWS shared config profile
    #[arg(long, global = true)]
    profile: Option<String>,
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the CloudFormation template for the project
    #[command(visible_alias = "config")]
    Convert {
        /// Output format (yaml, json)
        #[arg(long, default_value = "yaml")]
        format: String,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Create or update the project's stack
    Up,
    /// Delete the project's stack
    Down,
    /// Check that the project can be deployed
    Validate,
    /// Show version information
    Version,
    #[command(flatten)]
    Unsupported(UnsupportedCommand),
}

/// Compose operations the ECS backend rejects.
#[derive(Subcommand)]
enum UnsupportedCommand {
    Build(PassThrough),
    Push(PassThrough),
    Pull(PassThrough),
    Create(PassThrough),
    Start(PassThrough),
    Restart(PassThrough),
    Stop(PassThrough),
    Kill(PassThrough),
    Run(PassThrough),
    Rm(PassThrough),
    Attach(PassThrough),
    Cp(PassThrough),
    Port(PassThrough),
    Publish(PassThrough),
    Watch(PassThrough),
    Viz(PassThrough),
    Wait(PassThrough),
    Scale(PassThrough),
    Logs(PassThrough),
    Exec(PassThrough),
    Ps(PassThrough),
}

/// Arguments of a rejected operation; accepted and ignored.
#[derive(Args)]
struct PassThrough {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    #[allow(dead_code)]
    args: Vec<String>,
}

impl UnsupportedCommand {
    fn operation(&self) -> Operation {
        match self {
            Self::Build(_) => Operation::Build,
            Self::Push(_) => Operation::Push,
            Self::Pull(_) => Operation::Pull,
            Self::Create(_) => Operation::Create,
            Self::Start(_) => Operation::Start,
            Self::Restart(_) => Operation::Restart,
            Self::Stop(_) => Operation::Stop,
            Self::Kill(_) => Operation::Kill,
            Self::Run(_) => Operation::Run,
            Self::Rm(_) => Operation::Remove,
            Self::Attach(_) => Operation::Attach,
            Self::Cp(_) => Operation::Copy,
            Self::Port(_) => Operation::Port,
            Self::Publish(_) => Operation::Publish,
            Self::Watch(_) => Operation::Watch,
            Self::Viz(_) => Operation::Viz,
            Self::Wait(_) => Operation::Wait,
            Self::Scale(_) => Operation::Scale,
            Self::Logs(_) => Operation::Logs,
            Self::Exec(_) => Operation::Exec,
            Self::Ps(_) => Operation::Ps,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Version => {
            println!("stackflow {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Unsupported(command) => commands::unsupported::handle(command.operation()),
        Commands::Convert { format, output } => {
            let project = utils::load_project(cli.file.as_deref())?;
            commands::convert::handle(&project, &format, output.as_deref())
        }
        Commands::Validate => {
            let project = utils::load_project(cli.file.as_deref())?;
            commands::validate::handle(&project)
        }
        Commands::Up => {
            let project = utils::load_project(cli.file.as_deref())?;
            let target = utils::AwsTarget::resolve(cli.region, cli.profile)?;
            commands::up::handle(&project, &target).await
        }
        Commands::Down => {
            let project = utils::load_project(cli.file.as_deref())?;
            commands::down::handle(&project)
        }
    }
}
