//! Parse and show commands

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use super::output::Output;
use crate::domain::{Document, ItemKey, NodeId, TaskNode};
use crate::parser;

/// Print the parsed tree of a backlog file
pub fn run(output: &Output, file: &Path) -> Result<()> {
    let doc = load(file)?;

    if output.is_json() {
        output.data(&doc);
        return Ok(());
    }

    println!("{}", doc.title());
    if !doc.description().is_empty() {
        println!("{}", doc.description());
    }
    for (key, value) in doc.metadata() {
        println!("  {}: {}", key, value);
    }
    println!();

    if doc.is_empty() {
        println!("No work items found.");
    } else {
        print!("{}", render_tree(&doc, doc.root_ids()));
    }

    Ok(())
}

/// Print one node and its subtree, addressed by key (`e-1a2b3c4.1`) or
/// position (`2.1`)
pub fn show(output: &Output, file: &Path, item: &str) -> Result<()> {
    let doc = load(file)?;

    let node = match item.parse::<ItemKey>() {
        Ok(key) => doc
            .find_by_key(&key)
            .ok_or_else(|| anyhow::anyhow!("No work item with key {}", key))?,
        Err(_) => {
            let path = parse_position(item)?;
            doc.at_position(&path)
                .ok_or_else(|| anyhow::anyhow!("No work item at position {}", item))?
        }
    };

    if output.is_json() {
        output.data(&doc.subtree(node.id()));
        return Ok(());
    }

    println!("{}", node_line(node));
    println!("Key: {}", node.key);
    if !node.description.is_empty() {
        println!("Description: {}", node.description);
    }
    if !node.business_value.is_empty() {
        println!("Business value: {}", node.business_value);
    }
    if let Some(parent) = doc.parent(node.id()) {
        println!("Parent: {}", parent.title);
    }

    if !node.is_leaf() {
        println!();
        print!("{}", render_tree(&doc, node.child_ids()));
    }

    Ok(())
}

pub(super) fn load(file: &Path) -> Result<Document> {
    if !parser::can_parse(file) {
        tracing::warn!(file = %file.display(), "unrecognized extension, parsing as markdown");
    }
    parser::parse_file(file).with_context(|| format!("Failed to parse {}", file.display()))
}

/// `2.1.3` -> `[2, 1, 3]`
fn parse_position(position: &str) -> Result<Vec<usize>> {
    position
        .split('.')
        .map(|part| match part.trim().parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(anyhow::anyhow!(
                "Invalid item '{}': expected a key like e-1a2b3c4.1 or a position like 2.1",
                position
            )),
        })
        .collect()
}

/// One line per node, indented by depth below the first id
fn render_tree(doc: &Document, ids: &[NodeId]) -> String {
    let mut out = String::new();
    for id in ids {
        render_node(doc, *id, 0, &mut out);
    }
    out
}

fn render_node(doc: &Document, id: NodeId, indent: usize, out: &mut String) {
    let node = &doc[id];
    let _ = writeln!(out, "{}{}", "  ".repeat(indent), node_line(node));
    for child in node.child_ids() {
        render_node(doc, *child, indent + 1, out);
    }
}

fn node_line(node: &TaskNode) -> String {
    format!(
        "{}: {} ({} SP, {} priority)",
        node.kind.label().to_uppercase(),
        node.title,
        node.story_points,
        node.priority
    )
}
