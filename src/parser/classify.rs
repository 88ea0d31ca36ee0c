//! Line classification
//!
//! Each trimmed line gets exactly one [`LineKind`]. The checks run in a fixed
//! order and the first match wins; ambiguous lines (e.g. `## Epic Features:`)
//! are decided by that order alone.

use std::sync::LazyLock;

use regex::Regex;

const BULLET_MARKERS: &[char] = &['-', '*', '+'];

/// Kind of a single backlog line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    /// `## ...Epic...` / `### Epic: ...`
    EpicHeader,
    /// `#### Features:` or any line containing `Features:`
    FeatureSectionMarker,
    /// `1. **Feature name**`
    FeatureItem,
    /// `- **Effort**: ...`, `- **Priority**: ...`, `- **Business Value**: ...`
    PropertyLine,
    /// Any other `-`, `*` or `+` bullet
    BulletItem,
    /// `# Title`
    TitleHeader,
    /// Any other `##`+ header
    SectionHeader,
    Blank,
    Other,
}

impl LineKind {
    /// Lines that end a lookahead window
    pub fn is_boundary(self) -> bool {
        matches!(
            self,
            LineKind::EpicHeader | LineKind::FeatureSectionMarker | LineKind::FeatureItem
        )
    }
}

/// A trimmed line together with its kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub text: &'a str,
    pub kind: LineKind,
}

impl<'a> Line<'a> {
    pub fn new(raw: &'a str) -> Self {
        let text = raw.trim();
        Self {
            text,
            kind: classify(text),
        }
    }
}

/// Splits text into lines and classifies each one
pub fn classify_all(content: &str) -> Vec<Line<'_>> {
    content.lines().map(Line::new).collect()
}

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static FEATURE_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s*\*\*(.*?)\*\*").unwrap());

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static PROPERTY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[-*+]\s*\*\*(effort|priority|business value)\*\*:").unwrap()
});

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static NUMBERED_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.").unwrap());

/// Classifies one line (trimmed internally)
pub fn classify(line: &str) -> LineKind {
    let line = line.trim();

    if is_epic_header(line) {
        LineKind::EpicHeader
    } else if line.contains("Features:") {
        LineKind::FeatureSectionMarker
    } else if FEATURE_ITEM.is_match(line) {
        LineKind::FeatureItem
    } else if PROPERTY_LINE.is_match(line) {
        LineKind::PropertyLine
    } else if is_bullet(line) {
        LineKind::BulletItem
    } else if is_title_header(line) {
        LineKind::TitleHeader
    } else if line.starts_with("##") {
        LineKind::SectionHeader
    } else if line.is_empty() {
        LineKind::Blank
    } else {
        LineKind::Other
    }
}

fn is_epic_header(line: &str) -> bool {
    line.starts_with("##") && line.contains("Epic")
}

/// `# ` followed by text; `## ` and deeper do not count
pub fn is_title_header(line: &str) -> bool {
    line.starts_with("# ")
}

/// A `-`, `*` or `+` marker followed by whitespace
pub fn is_bullet(line: &str) -> bool {
    let mut chars = line.chars();
    matches!(chars.next(), Some('-' | '*' | '+')) && chars.next().is_some_and(char::is_whitespace)
}

/// Starts with a bullet marker, spaced or not (`-`, `**`, `+x`)
pub(crate) fn starts_with_marker(line: &str) -> bool {
    line.starts_with(BULLET_MARKERS)
}

/// Starts with `N.`
pub(crate) fn is_numbered(line: &str) -> bool {
    NUMBERED_LINE.is_match(line)
}

/// Bold title of a `1. **Title**` line
pub fn feature_title(line: &str) -> Option<&str> {
    FEATURE_ITEM
        .captures(line.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

/// Text after the leading bullet marker
pub fn bullet_text(line: &str) -> &str {
    let line = line.trim();
    match line.strip_prefix(BULLET_MARKERS) {
        Some(rest) => rest.trim(),
        None => line,
    }
}
