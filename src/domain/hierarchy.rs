//! Hierarchy aggregation
//!
//! [`HierarchyView`] is a read-only projection of a [`Document`]: the epics,
//! the features under each epic, the stories/tasks under each feature, and
//! totals over every reachable node. It borrows the document and is rebuilt
//! from scratch on every call to [`HierarchyView::compute`].

use std::collections::{BTreeMap, HashMap};

use super::document::Document;
use super::id::NodeId;
use super::task::{TaskNode, WorkItemType};

/// Per-level groupings and totals over a document
#[derive(Debug, Clone)]
pub struct HierarchyView<'a> {
    doc: &'a Document,

    /// Root items of kind Epic, in document order
    pub epics: Vec<&'a TaskNode>,

    /// Epic id -> its direct Feature children
    pub epic_to_features: HashMap<NodeId, Vec<&'a TaskNode>>,

    /// Feature id -> its direct UserStory/Task children
    pub feature_to_stories: HashMap<NodeId, Vec<&'a TaskNode>>,

    /// Sum of story points over every reachable node
    pub total_story_points: u64,

    /// Count of every reachable node
    pub total_work_items: usize,
}

impl<'a> HierarchyView<'a> {
    /// Computes the view from the document's roots
    pub fn compute(doc: &'a Document) -> Self {
        let epics: Vec<&TaskNode> = doc
            .roots()
            .filter(|n| n.kind == WorkItemType::Epic)
            .collect();

        let mut epic_to_features = HashMap::new();
        let mut feature_to_stories = HashMap::new();

        for epic in &epics {
            let features: Vec<&TaskNode> = doc
                .children(epic.id())
                .filter(|c| c.kind == WorkItemType::Feature)
                .collect();

            for feature in &features {
                let stories: Vec<&TaskNode> = doc
                    .children(feature.id())
                    .filter(|c| c.kind.is_story_or_task())
                    .collect();
                feature_to_stories.insert(feature.id(), stories);
            }

            epic_to_features.insert(epic.id(), features);
        }

        Self {
            doc,
            epics,
            epic_to_features,
            feature_to_stories,
            total_story_points: sum_story_points(doc, doc.root_ids()),
            total_work_items: count_work_items(doc, doc.root_ids()),
        }
    }

    /// The document this view was computed from
    pub fn document(&self) -> &'a Document {
        self.doc
    }

    /// Features grouped under an epic (empty for non-epics)
    pub fn features_of(&self, epic: NodeId) -> &[&'a TaskNode] {
        self.epic_to_features
            .get(&epic)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Stories and tasks grouped under a feature (empty for unknown features)
    pub fn stories_of(&self, feature: NodeId) -> &[&'a TaskNode] {
        self.feature_to_stories
            .get(&feature)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of reachable nodes per kind
    pub fn count_by_kind(&self) -> BTreeMap<WorkItemType, usize> {
        let mut counts = BTreeMap::new();
        for node in self.doc.walk() {
            *counts.entry(node.kind).or_insert(0) += 1;
        }
        counts
    }
}

/// Depth-first sum of story points under the given ids
fn sum_story_points(doc: &Document, ids: &[NodeId]) -> u64 {
    ids.iter()
        .map(|id| {
            let node = &doc[*id];
            u64::from(node.story_points) + sum_story_points(doc, node.child_ids())
        })
        .sum()
}

/// Depth-first count of the nodes under the given ids
fn count_work_items(doc: &Document, ids: &[NodeId]) -> usize {
    ids.len()
        + ids
            .iter()
            .map(|id| count_work_items(doc, doc[*id].child_ids()))
            .sum::<usize>()
}
