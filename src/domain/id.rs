//! Identifiers for backlog items
//!
//! Every node carries two identifiers:
//! - [`NodeId`] - arena index inside its [`Document`](super::Document), cheap to copy
//! - [`ItemKey`] - human-readable key shown to users and handed to sync plugins
//!
//! Key format:
//! - Root keys: `{prefix}-{7-char-hash}` where prefix is `e` (epic), `f` (feature)
//!   or `t` (anything else), e.g. `e-7f2b4c1`
//! - Child keys: `{parent-key}.{sequence}` (e.g. `e-7f2b4c1.2` or `e-7f2b4c1.2.1`)
//!
//! The hash is derived from the document's source name, the root title and how
//! many earlier roots share that title, so the same text parsed from the same
//! file always yields the same keys. Sync mappings rely on this.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::task::WorkItemType;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid item key: expected '{{e|f|t}}-{{7-char-hash}}[.seq...]', got '{0}'")]
    InvalidKey(String),

    #[error("Invalid sequence number: {0}")]
    InvalidSequence(String),
}

/// Arena index of a node inside a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the arena index
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Generates a 7-character hash from source, title and occurrence
fn generate_hash(source: &str, title: &str, occurrence: usize) -> String {
    let input = format!("{}\n{}\n{}", source, title, occurrence);
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..7].to_string()
}

/// Hierarchical key of a backlog item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemKey {
    prefix: char,
    hash: String,
    segments: Vec<u32>,
}

impl ItemKey {
    /// Creates a key for a top-level item
    ///
    /// `occurrence` counts earlier roots of the same document with the same
    /// title, keeping duplicate titles apart.
    pub fn root(kind: WorkItemType, source: &str, title: &str, occurrence: usize) -> Self {
        Self {
            prefix: kind.key_prefix(),
            hash: generate_hash(source, title, occurrence),
            segments: vec![],
        }
    }

    /// Creates the key of this item's child at the given 1-based position
    pub fn child(&self, sequence: u32) -> Self {
        let mut segments = self.segments.clone();
        segments.push(sequence);
        Self {
            prefix: self.prefix,
            hash: self.hash.clone(),
            segments,
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.hash)?;
        for seg in &self.segments {
            write!(f, ".{}", seg)?;
        }
        Ok(())
    }
}

impl FromStr for ItemKey {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let prefix = match (chars.next(), chars.next()) {
            (Some(p @ ('e' | 'f' | 't')), Some('-')) => p,
            _ => return Err(IdError::InvalidKey(s.to_string())),
        };

        let mut parts = s[2..].split('.');
        let hash = parts.next().unwrap_or_default();
        if hash.len() != 7 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IdError::InvalidKey(s.to_string()));
        }

        let mut segments = Vec::new();
        for part in parts {
            let seq: u32 = part
                .parse()
                .map_err(|_| IdError::InvalidSequence(part.to_string()))?;
            if seq == 0 {
                return Err(IdError::InvalidSequence(part.to_string()));
            }
            segments.push(seq);
        }

        Ok(Self {
            prefix,
            hash: hash.to_string(),
            segments,
        })
    }
}

impl TryFrom<String> for ItemKey {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ItemKey> for String {
    fn from(key: ItemKey) -> Self {
        key.to_string()
    }
}
