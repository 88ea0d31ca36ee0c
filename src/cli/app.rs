//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use super::config_cmd::{self, ConfigCommands};
use super::output::{Output, OutputFormat};
use super::submit_cmd::SubmitArgs;
use super::{parse_cmd, stats, submit_cmd};
use crate::storage::Config;

#[derive(Parser)]
#[command(name = "backlog")]
#[command(author, version, about = "Turn markdown backlogs into work item hierarchies")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the configured format, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a backlog file and print its item tree
    Parse {
        /// Markdown backlog file
        file: PathBuf,
    },

    /// Summarize epics, features and totals of a backlog file
    Stats {
        /// Markdown backlog file
        file: PathBuf,
    },

    /// Show one item and its subtree
    Show {
        /// Markdown backlog file
        file: PathBuf,

        /// Item key (`e-1a2b3c4.1`) or 1-based position path (`2.1` is the
        /// first child of the second item)
        item: String,
    },

    /// Create the backlog's work items in a tracker
    Submit {
        /// Markdown backlog file
        file: PathBuf,

        /// Target project in the tracker
        #[arg(long, env = "BACKLOG_PROJECT")]
        project: Option<String>,

        /// Sync plugin name (runs `backlog-sync-{name}`) or path
        #[arg(long)]
        plugin: Option<String>,

        /// Print what would be created without contacting a tracker
        #[arg(long)]
        dry_run: bool,
    },

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Installs the stderr log subscriber; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load()?;
    let format = cli
        .format
        .unwrap_or_else(|| config.default_format().into());
    let output = Output::new(format);

    debug!(project_root = ?config.project_root, "backlog starting");

    match cli.command {
        Commands::Parse { file } => parse_cmd::run(&output, &file)?,
        Commands::Stats { file } => stats::run(&output, &file)?,
        Commands::Show { file, item } => parse_cmd::show(&output, &file, &item)?,
        Commands::Submit {
            file,
            project,
            plugin,
            dry_run,
        } => submit_cmd::run(
            &output,
            &config,
            SubmitArgs {
                file: &file,
                project,
                plugin,
                dry_run,
            },
        )?,
        Commands::Config(cmd) => config_cmd::run(cmd, &output, &config)?,
    }

    debug!("command completed");
    Ok(())
}
