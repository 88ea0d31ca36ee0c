//! # Submission
//!
//! Creates the parsed hierarchy in an external tracker through a
//! [`WorkItemClient`], parents before children.
//!
//! ## Order
//!
//! For each epic, depth first:
//!
//! 1. the epic, without a parent
//! 2. each Feature child, under the epic
//! 3. each Story/Task child of that feature, under the feature
//! 4. each Task child of that story, under the story
//! 5. the epic's children that are not Features, under the epic
//!
//! Top-level items that are not epics (loose tasks, promoted features) come
//! after every epic, created without a parent and followed by their subtrees.
//!
//! Items whose key already has a remote id (from an earlier run's sync
//! mappings) are not sent again; their id is reused as the parent of their
//! children. A run that failed part way can therefore be repeated.
//!
//! ## Clients
//!
//! | Client | Purpose |
//! |--------|---------|
//! | [`DryRunClient`] | Records calls, assigns ids 1, 2, 3, ... |
//! | [`PluginClient`] | Runs a `backlog-sync-{name}` executable |
//!
//! ## Protocol
//!
//! ```text
//! CLI                            Plugin Binary
//!  │                                 │
//!  ├── Spawn: backlog-sync-azure     │
//!  │                                 │
//!  ├── Stdin: {"operation": "create", "params": {...}}
//!  │                                 │
//!  └── Stdout: {"success": true, "data": {"id": 1234}}
//! ```

mod client;
mod fields;
mod plugin;
mod protocol;

use std::collections::HashMap;

use anyhow::Context;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{Document, HierarchyView, ItemKey, NodeId, TaskNode, WorkItemType};

pub use client::{DryRunClient, RecordedCall, WorkItemClient};
pub use fields::{business_value, priority_rank, type_name, PatchOperation, WorkItemFields};
pub use plugin::{plugin_name, PluginClient, PLUGIN_PREFIX};
pub use protocol::{PluginManifest, PluginRequest, PluginResponse};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Work item '{title}' was rejected: {reason}")]
    Rejected { title: String, reason: String },

    #[error("No id returned for work item '{title}'")]
    NoId { title: String },

    /// Creation stopped part way; `report` lists what exists remotely
    #[error("Submission stopped after creating {} item(s)", .report.created.len())]
    Interrupted {
        report: Box<SubmitReport>,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// One item that exists remotely
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedItem {
    pub key: ItemKey,
    pub title: String,
    pub kind: WorkItemType,
    pub remote_id: u64,
    pub parent_remote_id: Option<u64>,
}

/// Outcome of [`submit_hierarchy`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubmitReport {
    pub project: String,

    /// Items created by this run, in creation order
    pub created: Vec<SubmittedItem>,

    /// Items found in the sync mappings and not sent again
    pub already_synced: Vec<SubmittedItem>,

    /// Reachable items the creation order does not visit
    pub skipped: usize,
}

/// Creates every item of the view's document through `client`
///
/// `synced` maps keys created by earlier runs to their remote ids. Stops at
/// the first failed creation with [`SubmitError::Interrupted`], whose report
/// holds the items created before it.
pub fn submit_hierarchy(
    view: &HierarchyView<'_>,
    client: &mut dyn WorkItemClient,
    project: &str,
    synced: &HashMap<ItemKey, u64>,
) -> Result<SubmitReport, SubmitError> {
    let mut run = Submission {
        doc: view.document(),
        client,
        synced,
        report: SubmitReport {
            project: project.to_string(),
            ..SubmitReport::default()
        },
    };

    let outcome = run.submit_all(view);

    let mut report = run.report;
    report.skipped = view
        .total_work_items
        .saturating_sub(report.created.len() + report.already_synced.len());

    match outcome {
        Ok(()) => {
            info!(
                project,
                created = report.created.len(),
                already_synced = report.already_synced.len(),
                skipped = report.skipped,
                "submitted backlog"
            );
            Ok(report)
        }
        Err(source) => Err(SubmitError::Interrupted {
            report: Box::new(report),
            source: source.into(),
        }),
    }
}

struct Submission<'a, 'c> {
    doc: &'a Document,
    client: &'c mut dyn WorkItemClient,
    synced: &'a HashMap<ItemKey, u64>,
    report: SubmitReport,
}

impl Submission<'_, '_> {
    fn submit_all(&mut self, view: &HierarchyView<'_>) -> anyhow::Result<()> {
        let doc = self.doc;

        for epic in &view.epics {
            let epic_id = self.create(epic, None)?;

            for feature in view.features_of(epic.id()) {
                let feature_id = self.create(feature, Some(epic_id))?;

                for story in view.stories_of(feature.id()) {
                    let story_id = self.create(story, Some(feature_id))?;

                    for task in doc
                        .children(story.id())
                        .filter(|c| c.kind == WorkItemType::Task)
                    {
                        self.create(task, Some(story_id))?;
                    }
                }
            }

            for child in doc
                .children(epic.id())
                .filter(|c| c.kind != WorkItemType::Feature)
            {
                self.create(child, Some(epic_id))?;
            }
        }

        for root in doc.roots().filter(|r| r.kind != WorkItemType::Epic) {
            self.create_subtree(root.id(), None)?;
        }

        Ok(())
    }

    fn create(&mut self, node: &TaskNode, parent: Option<u64>) -> anyhow::Result<u64> {
        if let Some(&remote_id) = self.synced.get(&node.key) {
            debug!(key = %node.key, remote_id, "already synced");
            self.report
                .already_synced
                .push(submitted(node, remote_id, parent));
            return Ok(remote_id);
        }

        let remote_id = self
            .client
            .create_work_item(node, &self.report.project, parent)
            .inspect_err(|e| warn!(key = %node.key, error = %e, "work item creation failed"))
            .with_context(|| format!("Failed to create {} '{}'", node.kind, node.title))?;

        self.report.created.push(submitted(node, remote_id, parent));
        Ok(remote_id)
    }

    fn create_subtree(&mut self, id: NodeId, parent: Option<u64>) -> anyhow::Result<()> {
        let doc = self.doc;
        let node = &doc[id];
        let remote_id = self.create(node, parent)?;
        for child in node.child_ids() {
            self.create_subtree(*child, Some(remote_id))?;
        }
        Ok(())
    }
}

fn submitted(node: &TaskNode, remote_id: u64, parent: Option<u64>) -> SubmittedItem {
    SubmittedItem {
        key: node.key.clone(),
        title: node.title.clone(),
        kind: node.kind,
        remote_id,
        parent_remote_id: parent,
    }
}
