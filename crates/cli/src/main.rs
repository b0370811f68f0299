//! modreg CLI
//!
//! Publish, resolve and list infrastructure modules stored in a blob-store
//! backed registry.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use modreg_registry::{ProjectConfig, build_registry};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

/// modreg: a module registry on top of S3, GCS, Azure Blob or a directory.
#[derive(Parser, Debug)]
#[command(name = "modreg", version, about)]
struct Cli {
    /// Directory containing modreg.toml and the module sources.
    #[arg(
        long,
        env = "MODREG_WORK_DIRECTORY",
        default_value = ".",
        global = true
    )]
    work_directory: PathBuf,

    /// Override a config value, e.g. `module.version=1.2.3`. Repeatable.
    #[arg(long, value_name = "KEY=VALUE", global = true)]
    overwrite_config: Vec<String>,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Archive the work directory and publish it.
    Publish(commands::publish::PublishArgs),
    /// Show where a module version is available.
    Get(commands::get::GetArgs),
    /// Print only the source URL of a module version.
    GetUrl(commands::get_url::GetUrlArgs),
    /// List modules, or the releases of one module.
    List(commands::list::ListArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = ProjectConfig::load(&cli.work_directory, &cli.overwrite_config)?;
    debug!(backend = config.backend.kind(), "using backend");
    let registry = build_registry(&config.backend).await?;

    match cli.command {
        Command::Publish(args) => {
            commands::publish::run(&registry, &config, &cli.work_directory, &args, cli.format)
                .await
        }
        Command::Get(args) => commands::get::run(&registry, &args, cli.format).await,
        Command::GetUrl(args) => commands::get_url::run(&registry, &args).await,
        Command::List(args) => commands::list::run(&registry, &args, cli.format).await,
    }
}
