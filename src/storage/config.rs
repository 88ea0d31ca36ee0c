//! Configuration handling for Backlog CLI
//!
//! Configuration is stored in `.backlog/config.toml` (project) and
//! `~/.config/backlog/config.toml` (global). Project values win over global
//! ones; command-line flags win over both.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the per-project directory
pub const PROJECT_DIR: &str = ".backlog";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Settings shared by both config files
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Default output format (text or json)
    pub default_format: Option<OutputFormat>,

    /// Target project for `backlog submit`
    pub project: Option<String>,

    /// Sync plugin name for `backlog submit`
    pub plugin: Option<String>,

    /// Extra directory searched for sync plugins
    pub plugin_dir: Option<PathBuf>,
}

impl Settings {
    /// Fills unset fields from `fallback`
    fn or(self, fallback: Settings) -> Settings {
        Settings {
            default_format: self.default_format.or(fallback.default_format),
            project: self.project.or(fallback.project),
            plugin: self.plugin.or(fallback.plugin),
            plugin_dir: self.plugin_dir.or(fallback.plugin_dir),
        }
    }
}

/// Combined configuration (global + project)
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: Settings,
    pub project: Settings,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        match Self::find_project_root() {
            Some(root) => Self::for_project(&root),
            None => Ok(Self {
                global: Self::load_global()?,
                ..Self::default()
            }),
        }
    }

    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        Ok(Self {
            global: Self::load_global()?,
            project: Self::load_project_config(project_root)?,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Project settings over global settings
    pub fn effective(&self) -> Settings {
        self.project.clone().or(self.global.clone())
    }

    /// Effective output format
    pub fn default_format(&self) -> OutputFormat {
        self.effective().default_format.unwrap_or_default()
    }

    /// Plugin directory, relative paths resolved against the project root
    pub fn plugin_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.project.plugin_dir {
            return Some(match &self.project_root {
                Some(root) if dir.is_relative() => root.join(dir),
                _ => dir.clone(),
            });
        }
        if let Some(dir) = &self.global.plugin_dir {
            return Some(dir.clone());
        }
        self.project_root
            .as_ref()
            .map(|root| root.join(PROJECT_DIR).join("plugins"))
    }

    /// Directory for sync state, if in a project
    pub fn sync_dir(&self) -> Option<PathBuf> {
        self.project_root
            .as_ref()
            .map(|root| root.join(PROJECT_DIR).join("sync"))
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "backlog", "backlog").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    fn load_global() -> Result<Settings> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(Settings::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        parse_settings(&content).context("Failed to parse global config")
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<Settings> {
        let config_path = project_root.join(PROJECT_DIR).join("config.toml");

        if !config_path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        parse_settings(&content).context("Failed to parse project config")
    }

    /// Finds the project root by looking for a `.backlog/` directory
    pub fn find_project_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_project_root_from(&current)
    }

    /// Searches `start` and its ancestors for a `.backlog/` directory
    pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|dir| dir.join(PROJECT_DIR).is_dir())
            .map(Path::to_path_buf)
    }
}

fn parse_settings(content: &str) -> Result<Settings, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
}
