use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use pibx::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for pibx::AppCommand {
    fn from(cmd: Commands) -> pibx::AppCommand {
        match cmd {
            Commands::Table { page, desc } => pibx::AppCommand::Table {
                page,
                descending: desc,
            },
            Commands::Chart => pibx::AppCommand::Chart,
            Commands::Summary => pibx::AppCommand::Summary,
            Commands::Export => pibx::AppCommand::Export,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display GDP by year, eight rows per page
    Table {
        /// Page to display, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Sort by year, newest first
        #[arg(short, long)]
        desc: bool,
    },
    /// Display GDP total and per capita as bar charts
    Chart,
    /// Display series metadata, growth statistics and cached rates
    Summary,
    /// Print the converted series as JSON
    Export,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => pibx::cli::setup::setup(),
        Some(cmd) => pibx::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
