//! Parsed backlog document
//!
//! A [`Document`] owns every node of one parse in an arena. Roots and child
//! lists hold [`NodeId`]s; each non-root node points back to its owner with
//! `parent`. The only way to add nodes is through the crate-internal
//! [`Document::add_root`] and [`Document::add_child`], which keep both sides of
//! the link in sync, so outside consumers see a finished, read-only tree.

use std::collections::BTreeMap;
use std::ops::Index;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use super::id::{ItemKey, NodeId};
use super::task::{NodeDraft, TaskNode};

/// Result of parsing one backlog text
#[derive(Debug, Clone)]
pub struct Document {
    source_name: String,
    title: String,
    description: String,
    metadata: BTreeMap<String, String>,
    parsed_at: DateTime<Utc>,
    nodes: Vec<TaskNode>,
    roots: Vec<NodeId>,
}

impl Document {
    /// Creates an empty document stamped with the current time
    pub fn new(
        source_name: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            title: title.into(),
            description: description.into(),
            metadata: BTreeMap::new(),
            parsed_at: Utc::now(),
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Key-value metadata (from frontmatter)
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn parsed_at(&self) -> DateTime<Utc> {
        self.parsed_at
    }

    pub(crate) fn set_metadata(&mut self, metadata: BTreeMap<String, String>) {
        self.metadata = metadata;
    }

    /// Appends a top-level node
    pub(crate) fn add_root(&mut self, draft: NodeDraft) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        let occurrence = self.roots().filter(|r| r.title == draft.title).count();
        let key = ItemKey::root(draft.kind, &self.source_name, &draft.title, occurrence);
        self.nodes.push(TaskNode::from_draft(id, key, None, draft));
        self.roots.push(id);
        id
    }

    /// Appends a node as the last child of `parent`
    pub(crate) fn add_child(&mut self, parent: NodeId, draft: NodeDraft) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        let owner = &self.nodes[parent.index()];
        let key = owner.key.child(owner.children.len() as u32 + 1);
        self.nodes.push(TaskNode::from_draft(id, key, Some(parent), draft));
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut TaskNode {
        &mut self.nodes[id.index()]
    }

    /// Gets a node by id, None if the id belongs to another document
    pub fn get(&self, id: NodeId) -> Option<&TaskNode> {
        self.nodes.get(id.index())
    }

    /// Ids of the top-level items, in document order
    pub fn root_ids(&self) -> &[NodeId] {
        &self.roots
    }

    /// Top-level items, in document order
    pub fn roots(&self) -> impl Iterator<Item = &TaskNode> + '_ {
        self.roots.iter().map(move |id| &self[*id])
    }

    /// Direct children of a node, in order
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &TaskNode> + '_ {
        self[id].children.iter().map(move |child| &self[*child])
    }

    /// Owner of a node, None for roots
    pub fn parent(&self, id: NodeId) -> Option<&TaskNode> {
        self[id].parent.map(|p| &self[p])
    }

    /// Number of ancestors of a node
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self[id].parent;
        while let Some(p) = current {
            depth += 1;
            current = self[p].parent;
        }
        depth
    }

    /// Every reachable node in depth-first pre-order
    pub fn walk(&self) -> Vec<&TaskNode> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            let node = &self[id];
            out.push(node);
            stack.extend(node.children.iter().rev().copied());
        }

        out
    }

    /// Finds a node by its item key
    pub fn find_by_key(&self, key: &ItemKey) -> Option<&TaskNode> {
        self.nodes.iter().find(|n| &n.key == key)
    }

    /// Node at a 1-based position path: `[2, 1]` is the first child of the
    /// second root
    pub fn at_position(&self, path: &[usize]) -> Option<&TaskNode> {
        let (first, rest) = path.split_first()?;
        let root = self.roots.get(first.checked_sub(1)?)?;

        rest.iter().try_fold(&self[*root], |node, pos| {
            let child = node.children.get(pos.checked_sub(1)?)?;
            Some(&self[*child])
        })
    }

    /// Returns true if there are no items
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Checks the parent/child links in both directions
    ///
    /// Returns a description of the first broken link found.
    pub fn check_links(&self) -> Result<(), String> {
        for node in &self.nodes {
            match node.parent {
                None => {
                    let count = self.roots.iter().filter(|r| **r == node.id).count();
                    if count != 1 {
                        return Err(format!("root {} listed {} times", node.key, count));
                    }
                }
                Some(p) => {
                    let owner = self
                        .get(p)
                        .ok_or_else(|| format!("{} has dangling parent {}", node.key, p))?;
                    let count = owner.children.iter().filter(|c| **c == node.id).count();
                    if count != 1 {
                        return Err(format!(
                            "{} appears {} times under {}",
                            node.key, count, owner.key
                        ));
                    }
                }
            }

            for child in &node.children {
                let child_node = self
                    .get(*child)
                    .ok_or_else(|| format!("{} has dangling child {}", node.key, child))?;
                if child_node.parent != Some(node.id) {
                    return Err(format!("{} does not point back to {}", child_node.key, node.key));
                }
            }
        }

        Ok(())
    }

    /// Nested view of a subtree, for serialization
    pub fn subtree(&self, id: NodeId) -> NodeTree<'_> {
        NodeTree {
            node: &self[id],
            children: self.children(id).map(|c| self.subtree(c.id)).collect(),
        }
    }
}

impl Index<NodeId> for Document {
    type Output = TaskNode;

    fn index(&self, id: NodeId) -> &TaskNode {
        &self.nodes[id.index()]
    }
}

/// A node with its children nested, as exported to JSON
#[derive(Debug, Serialize)]
pub struct NodeTree<'a> {
    #[serde(flatten)]
    pub node: &'a TaskNode,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeTree<'a>>,
}

#[derive(Serialize)]
struct DocumentView<'a> {
    source_name: &'a str,
    title: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    metadata: &'a BTreeMap<String, String>,
    parsed_at: DateTime<Utc>,
    items: Vec<NodeTree<'a>>,
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        DocumentView {
            source_name: &self.source_name,
            title: &self.title,
            description: &self.description,
            metadata: &self.metadata,
            parsed_at: self.parsed_at,
            items: self.roots.iter().map(|id| self.subtree(*id)).collect(),
        }
        .serialize(serializer)
    }
}
