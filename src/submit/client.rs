//! Work item client boundary

use anyhow::Result;
use serde::Serialize;

use crate::domain::{ItemKey, TaskNode, WorkItemType};

/// Creates work items in an external tracker
pub trait WorkItemClient {
    /// Creates one item, linked under `parent_id` when given, and returns its id
    fn create_work_item(
        &mut self,
        node: &TaskNode,
        project: &str,
        parent_id: Option<u64>,
    ) -> Result<u64>;
}

/// One call seen by [`DryRunClient`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedCall {
    pub key: ItemKey,
    pub title: String,
    pub kind: WorkItemType,
    pub project: String,
    pub parent_id: Option<u64>,
    pub assigned_id: u64,
}

/// Client that creates nothing and hands out sequential ids from 1
#[derive(Debug, Clone, Default)]
pub struct DryRunClient {
    calls: Vec<RecordedCall>,
}

impl DryRunClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls made so far, in order
    pub fn calls(&self) -> &[RecordedCall] {
        &self.calls
    }
}

impl WorkItemClient for DryRunClient {
    fn create_work_item(
        &mut self,
        node: &TaskNode,
        project: &str,
        parent_id: Option<u64>,
    ) -> Result<u64> {
        let assigned_id = self.calls.len() as u64 + 1;
        self.calls.push(RecordedCall {
            key: node.key.clone(),
            title: node.title.clone(),
            kind: node.kind,
            project: project.to_string(),
            parent_id,
            assigned_id,
        });
        Ok(assigned_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Document, NodeDraft};

    #[test]
    fn dry_run_assigns_sequential_ids() {
        let mut doc = Document::new("", "", "");
        let epic = doc.add_root(NodeDraft::new(WorkItemType::Epic, "E"));
        let task = doc.add_child(epic, NodeDraft::new(WorkItemType::Task, "T"));

        let mut client = DryRunClient::new();
        let epic_id = client.create_work_item(&doc[epic], "Apollo", None).unwrap();
        let task_id = client
            .create_work_item(&doc[task], "Apollo", Some(epic_id))
            .unwrap();

        assert_eq!((epic_id, task_id), (1, 2));
        assert_eq!(client.calls().len(), 2);
        assert_eq!(client.calls()[1].parent_id, Some(1));
        assert_eq!(client.calls()[1].project, "Apollo");
        assert_eq!(client.calls()[1].kind, WorkItemType::Task);
    }
}
