//! Context scanning
//!
//! Attributes of an epic, feature or task are not on its header line; they are
//! picked up from the lines that follow it. [`ContextScanner`] looks ahead a
//! bounded number of lines from a start index and stops early at the next
//! epic header, feature section marker or feature item.
//!
//! Two window sizes are in use: [`SHORT_WINDOW`] for priority and feature
//! descriptions, [`LONG_WINDOW`] for effort, business value and epic
//! descriptions. Windows count from the start line itself.

use std::sync::LazyLock;

use regex::Regex;

use super::classify::{bullet_text, is_numbered, starts_with_marker, Line, LineKind};
use crate::domain::Priority;

/// Lookahead for priority and feature descriptions
pub const SHORT_WINDOW: usize = 5;

/// Lookahead for effort, business value and epic descriptions
pub const LONG_WINDOW: usize = 10;

/// Effort patterns, tried in order on each line
#[allow(clippy::unwrap_used)] // Compile-time constant regex patterns
static EFFORT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // - **Effort**: 8 SP
        r"(?i)[-*+]\s*\*\*Effort\*\*:\s*(\d+)(?:\s*SP)?",
        // - 8 SP
        r"(?i)[-*+]\s*(\d+)\s*SP\b",
        // - 8 story points
        r"(?i)[-*+]\s*(\d+)\s*story\s*points?",
        // 8 SP
        r"(?i)(\d+)\s*SP\b",
        // 8 story points
        r"(?i)(\d+)\s*story\s*points?",
        // Effort: 8
        r"(?i)Effort.*?(\d+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static BUSINESS_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\*\*|)Business Value(?:\*\*|):\s*(.+)").unwrap()
});

/// Effort of a single line: the value of the first pattern that matches
///
/// Returns `Some(0)` when a pattern matched a literal zero.
pub fn effort_in_line(line: &str) -> Option<u32> {
    EFFORT_PATTERNS.iter().find_map(|re| {
        re.captures(line)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    })
}

/// Priority keyword of a single line, strongest first
pub fn priority_in_line(line: &str) -> Option<Priority> {
    let lower = line.to_lowercase();
    [
        ("critical", Priority::Critical),
        ("high", Priority::High),
        ("medium", Priority::Medium),
        ("low", Priority::Low),
    ]
    .into_iter()
    .find(|(word, _)| lower.contains(word))
    .map(|(_, priority)| priority)
}

/// Business value text of a single line
pub fn business_value_in_line(line: &str) -> Option<String> {
    BUSINESS_VALUE
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Property lines absorbed by a feature item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Absorbed {
    /// Lines to skip after the feature item
    pub lines: usize,
    /// Last non-zero effort found on those lines
    pub effort: Option<u32>,
}

/// Bounded lookahead over classified lines
#[derive(Debug, Clone, Copy)]
pub struct ContextScanner<'a> {
    lines: &'a [Line<'a>],
}

impl<'a> ContextScanner<'a> {
    pub fn new(lines: &'a [Line<'a>]) -> Self {
        Self { lines }
    }

    /// Lines `start..start+len`, cut at the first boundary after `start`
    fn window(&self, start: usize, len: usize) -> impl Iterator<Item = &'a Line<'a>> + 'a {
        let end = (start + len).min(self.lines.len());
        let lines = self.lines.get(start..end).unwrap_or_default();

        lines
            .iter()
            .enumerate()
            .take_while(|(offset, line)| *offset == 0 || !line.kind.is_boundary())
            .map(|(_, line)| line)
    }

    /// First priority keyword within [`SHORT_WINDOW`], Medium if none
    pub fn priority(&self, start: usize) -> Priority {
        self.window(start, SHORT_WINDOW)
            .find_map(|line| priority_in_line(line.text))
            .unwrap_or_default()
    }

    /// First non-zero effort within [`LONG_WINDOW`], 0 if none
    pub fn effort(&self, start: usize) -> u32 {
        self.window(start, LONG_WINDOW)
            .filter_map(|line| effort_in_line(line.text))
            .find(|effort| *effort > 0)
            .unwrap_or(0)
    }

    /// First business value within [`LONG_WINDOW`], empty if none
    pub fn business_value(&self, start: usize) -> String {
        self.window(start, LONG_WINDOW)
            .find_map(|line| business_value_in_line(line.text))
            .unwrap_or_default()
    }

    /// Prose under an epic header, up to the next `#` line
    pub fn epic_description(&self, start: usize) -> String {
        let parts: Vec<&str> = self
            .window(start, LONG_WINDOW)
            .skip(1)
            .take_while(|line| !line.text.starts_with('#'))
            .filter(|line| !line.text.is_empty() && !starts_with_marker(line.text))
            .map(|line| line.text)
            .collect();

        parts.join(" ")
    }

    /// Prose under a feature item, up to its first bullet or numbered line
    pub fn feature_description(&self, start: usize) -> String {
        let parts: Vec<&str> = self
            .window(start, SHORT_WINDOW)
            .skip(1)
            .take_while(|line| {
                !line.text.starts_with("**Effort**:")
                    && !starts_with_marker(line.text)
                    && !is_numbered(line.text)
            })
            .filter(|line| !line.text.is_empty())
            .map(|line| line.text)
            .collect();

        parts.join(" ")
    }

    /// Text after the bullet marker on the task's own line
    pub fn task_description(&self, start: usize) -> String {
        self.lines
            .get(start)
            .map(|line| bullet_text(line.text).to_string())
            .unwrap_or_default()
    }

    /// Blank and property lines directly after a feature item
    ///
    /// Stops at the first line of any other kind or at the end of
    /// [`SHORT_WINDOW`].
    pub fn absorb_feature_properties(&self, start: usize) -> Absorbed {
        let mut absorbed = Absorbed::default();

        for line in self.window(start, SHORT_WINDOW).skip(1) {
            match line.kind {
                LineKind::Blank => absorbed.lines += 1,
                LineKind::PropertyLine => {
                    absorbed.lines += 1;
                    if let Some(effort) = effort_in_line(line.text).filter(|e| *e > 0) {
                        absorbed.effort = Some(effort);
                    }
                }
                _ => break,
            }
        }

        absorbed
    }
}
