use clap::{Parser, Subcommand};
use depack::core::error_help::format_error_with_help;
use depack::core::path::CONFIG_FILE;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "depack")]
#[command(about = "Install the runtime packages each bundled entry needs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Attribute the module graph and install packages for every target
    Pack {
        #[command(flatten)]
        args: GraphArgs,
    },
    /// Print the manifests `pack` would install, without installing
    Plan {
        #[command(flatten)]
        args: GraphArgs,
    },
}

#[derive(clap::Args)]
struct GraphArgs {
    /// Configuration file
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,
    /// Module graph exported by the bundler
    #[arg(short, long)]
    graph: PathBuf,
    /// Do not query or merge peer dependencies
    #[arg(long)]
    skip_peers: bool,
}

impl From<GraphArgs> for cli::GraphOptions {
    fn from(args: GraphArgs) -> Self {
        Self {
            config: args.config,
            graph: args.graph,
            skip_peers: args.skip_peers,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("depack=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Pack { args } => cli::pack::run(args.into()).await,
        Commands::Plan { args } => cli::plan::run(args.into()).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\n{}", format_error_with_help(&e));
            ExitCode::FAILURE
        }
    }
}
