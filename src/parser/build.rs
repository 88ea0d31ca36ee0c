//! Tree building
//!
//! One forward pass over classified lines. The pass is a fold: [`TreeBuilder::step`]
//! takes the current [`BuildState`] and a line index, attaches whatever that
//! line creates to the document, and returns the next state and the next
//! index to visit. The pass never moves backwards.

use tracing::debug;

use super::classify::{bullet_text, feature_title, Line, LineKind};
use super::scan::{effort_in_line, ContextScanner};
use crate::domain::{Document, NodeDraft, NodeId, Priority, WorkItemType};

/// Cursors carried between lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildState {
    /// Epic that new features attach to
    pub current_epic: Option<NodeId>,
    /// Feature that new tasks and effort lines attach to
    pub current_feature: Option<NodeId>,
}

impl BuildState {
    /// Where a new task goes: feature, else epic, else top level
    fn task_parent(&self) -> Option<NodeId> {
        self.current_feature.or(self.current_epic)
    }
}

/// Outcome of processing one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub state: BuildState,
    pub next: usize,
}

/// Builds the work item tree from classified lines
pub struct TreeBuilder<'a> {
    lines: &'a [Line<'a>],
    scanner: ContextScanner<'a>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(lines: &'a [Line<'a>]) -> Self {
        Self {
            lines,
            scanner: ContextScanner::new(lines),
        }
    }

    /// Runs the whole pass, adding every item to `doc`
    pub fn build(&self, doc: &mut Document) -> BuildState {
        let mut state = BuildState::default();
        let mut index = 0;

        while index < self.lines.len() {
            let step = self.step(doc, state, index);
            state = step.state;
            index = step.next;
        }

        state
    }

    /// Processes the line at `index`
    pub fn step(&self, doc: &mut Document, state: BuildState, index: usize) -> Step {
        let line = &self.lines[index];
        let next = index + 1;

        match line.kind {
            LineKind::EpicHeader => {
                let epic = doc.add_root(self.epic_draft(line.text, index));
                debug!(line = index + 1, title = %doc[epic].title, "epic");
                Step {
                    state: BuildState {
                        current_epic: Some(epic),
                        current_feature: None,
                    },
                    next,
                }
            }

            LineKind::FeatureItem => {
                let draft = self.feature_draft(line.text, index);
                let feature = match state.current_epic {
                    Some(epic) => doc.add_child(epic, draft),
                    None => {
                        debug!(line = index + 1, "feature item outside an epic, promoted to top level");
                        doc.add_root(draft)
                    }
                };

                let absorbed = self.scanner.absorb_feature_properties(index);
                if let Some(effort) = absorbed.effort {
                    doc.node_mut(feature).story_points = effort;
                }
                debug!(
                    line = index + 1,
                    title = %doc[feature].title,
                    skipped = absorbed.lines,
                    "feature"
                );

                Step {
                    state: BuildState {
                        current_feature: Some(feature),
                        ..state
                    },
                    next: next + absorbed.lines,
                }
            }

            LineKind::PropertyLine => {
                if let Some(feature) = state.current_feature {
                    let effort = effort_in_line(line.text).unwrap_or(0);
                    if effort > 0 {
                        doc.node_mut(feature).story_points = effort;
                    }
                }
                Step { state, next }
            }

            LineKind::BulletItem => {
                let draft = self.task_draft(line.text, index);
                match state.task_parent() {
                    Some(parent) => doc.add_child(parent, draft),
                    None => doc.add_root(draft),
                };
                Step { state, next }
            }

            LineKind::FeatureSectionMarker
            | LineKind::TitleHeader
            | LineKind::SectionHeader
            | LineKind::Blank
            | LineKind::Other => Step { state, next },
        }
    }

    fn epic_draft(&self, text: &str, index: usize) -> NodeDraft {
        NodeDraft {
            kind: WorkItemType::Epic,
            title: epic_title(text),
            description: self.scanner.epic_description(index),
            priority: self.scanner.priority(index),
            story_points: self.scanner.effort(index),
            business_value: self.scanner.business_value(index),
        }
    }

    fn feature_draft(&self, text: &str, index: usize) -> NodeDraft {
        NodeDraft {
            kind: WorkItemType::Feature,
            title: feature_title(text).unwrap_or(text).to_string(),
            description: self.scanner.feature_description(index),
            priority: self.scanner.priority(index),
            story_points: self.scanner.effort(index),
            business_value: String::new(),
        }
    }

    fn task_draft(&self, text: &str, index: usize) -> NodeDraft {
        NodeDraft {
            kind: WorkItemType::Task,
            title: task_title(text),
            description: self.scanner.task_description(index),
            priority: Priority::Medium,
            story_points: self.scanner.effort(index),
            business_value: String::new(),
        }
    }
}

/// Header text without `#` marks and the `Epic:` label
fn epic_title(text: &str) -> String {
    text.replace('#', "").replace("Epic:", "").trim().to_string()
}

/// Bullet text without the marker and `**` emphasis
fn task_title(text: &str) -> String {
    bullet_text(text).replace("**", "").trim().to_string()
}
