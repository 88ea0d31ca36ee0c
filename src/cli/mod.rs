//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `parse <FILE>` | Print the item tree |
//! | `stats <FILE>` | Epics, features, stories and totals |
//! | `show <FILE> <POSITION>` | One item and its subtree |
//! | `submit <FILE>` | Create the items in a tracker |
//! | `config show` | Effective configuration |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) to log debug events to stderr; `RUST_LOG`
//! overrides it:
//! ```bash
//! backlog --verbose parse tasks.md
//! RUST_LOG=backlog_cli::parser=debug backlog parse tasks.md
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod config_cmd;
mod output;
mod parse_cmd;
mod stats;
mod submit_cmd;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
