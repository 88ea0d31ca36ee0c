//! Backlog CLI - Turns markdown backlogs into work item hierarchies
//!
//! A backlog file lists epics, numbered features and bullet tasks with
//! effort, priority and business value annotations. Backlog parses it into a
//! tree, summarizes it per level, and creates the items in an external
//! tracker through a sync plugin, parents before children.

pub mod cli;
pub mod domain;
pub mod parser;
pub mod storage;
pub mod submit;

pub use domain::{Document, HierarchyView, ItemKey, NodeId, Priority, TaskNode, WorkItemType};
pub use parser::{can_parse, parse_file, parse_str, ParseError};
