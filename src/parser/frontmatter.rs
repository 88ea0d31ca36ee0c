//! Optional YAML frontmatter
//!
//! A backlog may start with a `---` fenced YAML block. Its top-level keys end up
//! in [`Document::metadata`](crate::domain::Document::metadata); the rest of
//! the text is what the line pass sees.
//!
//! A backlog that merely opens with a `---` rule is not frontmatter: the block
//! is only taken when every line in it reads as YAML (`key: value` at column
//! 0, indented continuation, or blank).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::{Mapping, Value};
use tracing::debug;

/// `team: Platform`, `owner:`
#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static KEY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][\w-]*:(?:\s|$)").unwrap());

/// Splits leading frontmatter from the body
///
/// Returns empty metadata and the untouched text when there is no fenced
/// block or the block is not a YAML mapping.
pub fn split(content: &str) -> (BTreeMap<String, String>, &str) {
    let Some((yaml, body)) = fenced_block(content) else {
        return (BTreeMap::new(), content);
    };

    if !looks_like_yaml(yaml) {
        debug!("leading --- block holds backlog lines, parsing it as text");
        return (BTreeMap::new(), content);
    }

    match serde_yaml::from_str::<Mapping>(yaml) {
        Ok(mapping) => {
            let metadata = mapping
                .iter()
                .filter_map(|(k, v)| Some((scalar_to_string(k)?, value_to_string(v))))
                .collect();
            (metadata, body)
        }
        Err(e) => {
            debug!(error = %e, "frontmatter is not a YAML mapping, parsing it as text");
            (BTreeMap::new(), content)
        }
    }
}

/// Headers, bullets and labels with spaces (`Business Value: High`) rule a
/// block out; `#` lines count as headers even though YAML reads them as
/// comments.
fn looks_like_yaml(block: &str) -> bool {
    block.lines().all(|line| {
        let trimmed = line.trim();
        trimmed.is_empty()
            || (!trimmed.starts_with('#')
                && (KEY_LINE.is_match(line) || line.starts_with([' ', '\t'])))
    })
}

/// Finds `---\n<yaml>\n---\n` at the very start of the text
fn fenced_block(content: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    let mut lines = content.split_inclusive('\n');

    let first = lines.next()?;
    if first.trim() != "---" {
        return None;
    }
    offset += first.len();
    let yaml_start = offset;

    for line in lines {
        if line.trim() == "---" {
            let yaml = &content[yaml_start..offset];
            let body = &content[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }

    None
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Sequence(items) => items
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Mapping(_) | Value::Tagged(_) => serde_yaml::to_string(value)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        other => scalar_to_string(other).unwrap_or_default(),
    }
}
