//! Work item domain model
//!
//! A [`TaskNode`] is one backlog item (epic, feature, story, task or bug).
//! Nodes live in the arena of a [`Document`](super::Document); `children` and
//! `parent` are arena references, never owning pointers.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::id::{ItemKey, NodeId};

/// Kind of backlog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemType {
    Epic,
    Feature,
    UserStory,
    Task,
    Bug,
}

impl WorkItemType {
    /// Returns a display label for the kind
    pub fn label(&self) -> &'static str {
        match self {
            WorkItemType::Epic => "epic",
            WorkItemType::Feature => "feature",
            WorkItemType::UserStory => "user story",
            WorkItemType::Task => "task",
            WorkItemType::Bug => "bug",
        }
    }

    /// Returns true for the kinds grouped under a feature
    pub fn is_story_or_task(&self) -> bool {
        matches!(self, WorkItemType::UserStory | WorkItemType::Task)
    }

    /// Leading character of a root item key
    pub fn key_prefix(&self) -> char {
        match self {
            WorkItemType::Epic => 'e',
            WorkItemType::Feature => 'f',
            _ => 't',
        }
    }
}

impl fmt::Display for WorkItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Priority of a backlog item
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes of a node before it is placed in a document
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDraft {
    pub kind: WorkItemType,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub story_points: u32,
    pub business_value: String,
}

impl NodeDraft {
    /// Creates a draft with default attributes
    pub fn new(kind: WorkItemType, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            description: String::new(),
            priority: Priority::default(),
            story_points: 0,
            business_value: String::new(),
        }
    }
}

/// A backlog item placed in a document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskNode {
    /// Arena position
    #[serde(skip)]
    pub(crate) id: NodeId,

    /// Unique key, assigned at creation
    pub key: ItemKey,

    /// Human-readable title
    pub title: String,

    /// Free-text description
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Kind of work item
    pub kind: WorkItemType,

    pub priority: Priority,

    pub story_points: u32,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub acceptance_criteria: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub business_value: String,

    /// Owned children, in document order
    #[serde(skip)]
    pub(crate) children: Vec<NodeId>,

    /// Owning node, None for roots
    #[serde(skip)]
    pub(crate) parent: Option<NodeId>,
}

impl TaskNode {
    pub(crate) fn from_draft(id: NodeId, key: ItemKey, parent: Option<NodeId>, draft: NodeDraft) -> Self {
        Self {
            id,
            key,
            title: draft.title,
            description: draft.description,
            kind: draft.kind,
            priority: draft.priority,
            story_points: draft.story_points,
            acceptance_criteria: Vec::new(),
            tags: Vec::new(),
            dependencies: Vec::new(),
            business_value: draft.business_value,
            children: Vec::new(),
            parent,
        }
    }

    /// Arena id of this node
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Ids of the direct children, in order
    pub fn child_ids(&self) -> &[NodeId] {
        &self.children
    }

    /// Id of the owning node, None for roots
    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns true if the node has no children
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_defaults() {
        let draft = NodeDraft::new(WorkItemType::Task, "Add logging");

        assert_eq!(draft.priority, Priority::Medium);
        assert_eq!(draft.story_points, 0);
        assert!(draft.description.is_empty());
        assert!(draft.business_value.is_empty());
    }

    #[test]
    fn node_from_draft_has_empty_lists() {
        let key = ItemKey::root(WorkItemType::Task, "backlog.md", "Add logging", 0);
        let node = TaskNode::from_draft(
            NodeId::new(0),
            key,
            None,
            NodeDraft::new(WorkItemType::Task, "Add logging"),
        );

        assert_eq!(node.parent_id(), None);
        assert!(node.is_leaf());
        assert!(node.acceptance_criteria.is_empty());
        assert!(node.tags.is_empty());
        assert!(node.dependencies.is_empty());
    }

    #[test]
    fn priority_ordering() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn story_or_task_grouping() {
        assert!(WorkItemType::UserStory.is_story_or_task());
        assert!(WorkItemType::Task.is_story_or_task());
        assert!(!WorkItemType::Bug.is_story_or_task());
        assert!(!WorkItemType::Feature.is_story_or_task());
    }

    #[test]
    fn kind_serialization() {
        let json = serde_json::to_string(&WorkItemType::UserStory).unwrap();
        assert_eq!(json, "\"user_story\"");
        assert_eq!(Priority::Critical.to_string(), "critical");
    }
}
