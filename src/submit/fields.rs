//! Work item field mapping
//!
//! Converts a [`TaskNode`] into the field set a tracker expects, plus the
//! JSON-patch form (`/fields/System.Title`, ...) used by Azure-style APIs.

use serde::{Deserialize, Serialize};

use crate::domain::{Priority, TaskNode, WorkItemType};

/// Tracker fields for one work item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemFields {
    /// Tracker type name (`Epic`, `Feature`, `User Story`, `Task`, `Bug`)
    #[serde(rename = "type")]
    pub work_item_type: String,

    pub title: String,

    /// Description with acceptance criteria appended
    pub description: String,

    /// 1 (highest) to 3
    pub priority: u8,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_estimate: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_value: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

/// One JSON-patch `add` operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: String,
    pub path: String,
    pub value: serde_json::Value,
}

impl PatchOperation {
    fn add(field: &str, value: impl Into<serde_json::Value>) -> Self {
        Self {
            op: "add".to_string(),
            path: format!("/fields/{}", field),
            value: value.into(),
        }
    }
}

impl WorkItemFields {
    pub fn from_node(node: &TaskNode) -> Self {
        let points = (node.story_points > 0).then_some(node.story_points);

        let story_points = match node.kind {
            WorkItemType::UserStory | WorkItemType::Feature => points,
            _ => None,
        };
        let original_estimate = match node.kind {
            WorkItemType::Task => points,
            _ => None,
        };

        let tags = (!node.tags.is_empty()).then(|| node.tags.join("; "));

        Self {
            work_item_type: type_name(node.kind).to_string(),
            title: node.title.clone(),
            description: description_with_criteria(&node.description, &node.acceptance_criteria),
            priority: priority_rank(node.priority),
            story_points,
            original_estimate,
            business_value: business_value(&node.business_value),
            tags,
        }
    }

    /// JSON-patch document creating this item
    pub fn patch_document(&self) -> Vec<PatchOperation> {
        let mut ops = vec![
            PatchOperation::add("System.Title", self.title.as_str()),
            PatchOperation::add("System.Description", self.description.as_str()),
            PatchOperation::add("Microsoft.VSTS.Common.Priority", self.priority),
        ];

        if let Some(points) = self.story_points {
            ops.push(PatchOperation::add("Microsoft.VSTS.Scheduling.StoryPoints", points));
        }
        if let Some(estimate) = self.original_estimate {
            ops.push(PatchOperation::add(
                "Microsoft.VSTS.Scheduling.OriginalEstimate",
                estimate,
            ));
        }
        if let Some(value) = self.business_value {
            ops.push(PatchOperation::add("Microsoft.VSTS.Common.BusinessValue", value));
        }
        if let Some(tags) = &self.tags {
            ops.push(PatchOperation::add("System.Tags", tags.as_str()));
        }

        ops
    }
}

/// Tracker type name for a kind
pub fn type_name(kind: WorkItemType) -> &'static str {
    match kind {
        WorkItemType::Epic => "Epic",
        WorkItemType::Feature => "Feature",
        WorkItemType::UserStory => "User Story",
        WorkItemType::Task => "Task",
        WorkItemType::Bug => "Bug",
    }
}

/// Tracker priority: 1 for Critical and High, 2 for Medium, 3 for Low
pub fn priority_rank(priority: Priority) -> u8 {
    match priority {
        Priority::Critical | Priority::High => 1,
        Priority::Medium => 2,
        Priority::Low => 3,
    }
}

/// Numeric business value
///
/// Integer text is used as is; otherwise the leading word `high`, `medium`
/// or `low` maps to 100, 50 or 10.
pub fn business_value(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(value) = text.parse() {
        return Some(value);
    }

    let word: String = text
        .chars()
        .take_while(|c| c.is_alphabetic())
        .collect::<String>()
        .to_lowercase();

    match word.as_str() {
        "high" => Some(100),
        "medium" => Some(50),
        "low" => Some(10),
        _ => None,
    }
}

fn description_with_criteria(description: &str, criteria: &[String]) -> String {
    if criteria.is_empty() {
        return description.to_string();
    }

    let mut out = description.to_string();
    if !out.is_empty() {
        out.push_str("<br/><br/>");
    }
    out.push_str("<strong>Acceptance Criteria:</strong><br/>");

    let items: Vec<String> = criteria
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}", i + 1, c))
        .collect();
    out.push_str(&items.join("<br/>"));

    out
}
