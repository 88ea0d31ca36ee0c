//! # Storage Layer
//!
//! Configuration and sync state on disk, in git-friendly formats.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Config | TOML | `.backlog/config.toml`, `~/.config/backlog/config.toml` |
//! | Id mappings | JSONL (one JSON per line) | `.backlog/sync/{plugin}.jsonl` |
//!
//! ## Concurrency Safety
//!
//! - [`MappingStore`] uses file locking (`fs2`) for concurrent access
//! - Mapping writes are atomic (temp file + rename)
//!
//! ## Project Structure
//!
//! ```text
//! .backlog/
//! ├── config.toml           # Project configuration
//! ├── plugins/              # Local sync plugins
//! └── sync/                 # Id mappings per plugin
//! ```

mod config;
mod mapping;

pub use config::{Config, ConfigError, OutputFormat, Settings, PROJECT_DIR};
pub use mapping::{IdMapping, MappingStore};
