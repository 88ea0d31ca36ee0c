//! Domain models for the backlog
//!
//! Contains the work item tree and its aggregation, without any I/O concerns.

mod document;
mod hierarchy;
mod id;
mod task;

pub use document::{Document, NodeTree};
pub use hierarchy::HierarchyView;
pub use id::{IdError, ItemKey, NodeId};
pub use task::{NodeDraft, Priority, TaskNode, WorkItemType};
