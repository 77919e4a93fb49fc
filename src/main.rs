use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use statesandbox::config::SandboxConfig;

mod cmd;

#[derive(Parser)]
#[command(name = "statesandbox")]
#[command(version, about = "Turn-based state simulation: one regenerated state document per period")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to statesandbox.toml (defaults to ./statesandbox.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Overrides server.host
        #[arg(long)]
        host: Option<String>,

        /// Overrides server.port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Parse a state document and print it as JSON
    Parse {
        file: PathBuf,

        /// Comma-separated dotted key paths to keep (e.g. economy.economic_metrics,people)
        #[arg(short, long)]
        keys: Option<String>,

        /// Skip composition normalization before parsing
        #[arg(long)]
        raw: bool,

        /// Fail if any schema dimension is missing from the document
        #[arg(long)]
        check: bool,
    },
    /// Rescale every Composition list in a document to 100% and print it
    Normalize { file: PathBuf },
    /// Sample one outcome per category from a weighted event document
    Sample {
        file: PathBuf,

        /// Fixed RNG seed for reproducible draws
        #[arg(long)]
        seed: Option<u64>,

        /// Draw this many times and print observed frequencies
        #[arg(long)]
        draws: Option<usize>,
    },
    /// Show the document schema
    Schema {
        /// Show one dimension's template and seed assumptions
        #[arg(short, long)]
        dimension: Option<String>,

        /// Print the full document template
        #[arg(long, conflicts_with = "dimension")]
        template: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Check the configuration file for problems
    Validate,
    /// Write a default statesandbox.toml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Config commands must work even when the file is broken
    if let Commands::Config { command } = &cli.command {
        return cmd::cmd_config(cli.config.as_deref(), command.clone());
    }

    let config = SandboxConfig::load(cli.config.as_deref())?;
    let _log_guard = statesandbox::logging::init(&config.toml.logging, cli.verbose)?;

    match cli.command {
        Commands::Serve { host, port } => cmd::cmd_serve(config, host, port).await?,
        Commands::Parse {
            file,
            keys,
            raw,
            check,
        } => cmd::cmd_parse(&config, &file, keys.as_deref(), raw, check)?,
        Commands::Normalize { file } => cmd::cmd_normalize(&file)?,
        Commands::Sample { file, seed, draws } => cmd::cmd_sample(&file, seed, draws)?,
        Commands::Schema {
            dimension,
            template,
        } => cmd::cmd_schema(&config, dimension.as_deref(), template)?,
        Commands::Config { .. } => {}
    }

    Ok(())
}
