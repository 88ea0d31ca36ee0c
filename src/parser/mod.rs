//! # Backlog Parser
//!
//! Turns a markdown backlog into a [`Document`].
//!
//! ## Recognized Markup
//!
//! ```text
//! # Sample Development Tasks              <- document title
//! Prose up to the first ## header.        <- document description
//!
//! ### Epic: Security Enhancement          <- epic
//! - **Priority**: Critical                <- epic attributes (lookahead)
//! - **Effort**: 21 story points
//! - **Business Value**: High
//!
//! #### Features:                          <- separator, no item
//! 1. **JWT Authentication**               <- feature under the epic
//!    - **Effort**: 8 SP                   <- feature effort
//!    - Implement JWT validation           <- task under the feature
//! ```
//!
//! The parser is best-effort: malformed or unexpected lines degrade to
//! defaults (Medium priority, 0 points, empty text) and never fail the parse.
//! Only a missing or unreadable file is an error.
//!
//! ## Pipeline
//!
//! 1. [`frontmatter`](frontmatter::split) - optional YAML block into metadata
//! 2. [`classify`] - one [`LineKind`] per line
//! 3. [`TreeBuilder`] - single forward pass, using [`ContextScanner`] lookahead

mod build;
mod classify;
mod frontmatter;
mod scan;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::domain::Document;

pub use build::{BuildState, Step, TreeBuilder};
pub use classify::{classify, classify_all, Line, LineKind};
pub use scan::{
    business_value_in_line, effort_in_line, priority_in_line, Absorbed, ContextScanner, LONG_WINDOW,
    SHORT_WINDOW,
};

/// Title used when the text has no `# ` line
pub const DEFAULT_TITLE: &str = "Development Tasks";

/// File extensions accepted by [`can_parse`]
pub const SUPPORTED_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Returns true if the path has a supported backlog extension
pub fn can_parse(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// Reads and parses a backlog file
///
/// The document's source name is the file name.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Document, ParseError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ParseError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(parse_str(&content, &name))
}

/// Parses backlog text held in memory
pub fn parse_str(content: &str, source_name: &str) -> Document {
    let (metadata, body) = frontmatter::split(content);
    let lines = classify_all(body);

    let mut doc = Document::new(source_name, extract_title(&lines), extract_description(&lines));
    doc.set_metadata(metadata);

    TreeBuilder::new(&lines).build(&mut doc);

    info!(
        source = source_name,
        lines = lines.len(),
        items = doc.walk().len(),
        "parsed backlog"
    );

    doc
}

/// Text of the first `# ` line
fn extract_title(lines: &[Line<'_>]) -> String {
    lines
        .iter()
        .find(|l| classify::is_title_header(l.text))
        .map(|l| l.text[2..].trim().to_string())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

/// Non-blank lines between the title and the next `##` header
fn extract_description(lines: &[Line<'_>]) -> String {
    let Some(start) = lines.iter().position(|l| classify::is_title_header(l.text)) else {
        return String::new();
    };

    lines[start + 1..]
        .iter()
        .take_while(|l| !l.text.starts_with("##"))
        .filter(|l| !l.text.is_empty())
        .map(|l| l.text)
        .collect::<Vec<_>>()
        .join(" ")
}
