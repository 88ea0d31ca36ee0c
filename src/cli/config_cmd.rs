//! Configuration commands

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use crate::storage::{Config, OutputFormat};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
}

pub fn run(cmd: ConfigCommands, output: &Output, config: &Config) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(output, config),
    }
}

fn show(output: &Output, config: &Config) -> Result<()> {
    let settings = config.effective();
    let plugin_dir = config.plugin_dir();

    if output.is_json() {
        output.data(&serde_json::json!({
            "default_format": settings.default_format.unwrap_or_default(),
            "project": settings.project,
            "plugin": settings.plugin,
            "plugin_dir": plugin_dir,
            "project_root": config.project_root,
            "global_config_dir": Config::global_config_dir(),
        }));
        return Ok(());
    }

    let unset = || "(not set)".to_string();
    let format = match settings.default_format.unwrap_or_default() {
        OutputFormat::Text => "text",
        OutputFormat::Json => "json",
    };

    println!("{:<16} {}", "default_format", format);
    println!("{:<16} {}", "project", settings.project.unwrap_or_else(unset));
    println!("{:<16} {}", "plugin", settings.plugin.unwrap_or_else(unset));
    println!(
        "{:<16} {}",
        "plugin_dir",
        plugin_dir.map(|d| d.display().to_string()).unwrap_or_else(unset)
    );
    println!(
        "{:<16} {}",
        "project_root",
        config
            .project_root
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(unset)
    );

    Ok(())
}
