//! Stats command: hierarchy summary of a backlog file

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use super::output::Output;
use super::parse_cmd::load;
use crate::domain::{HierarchyView, TaskNode, WorkItemType};

#[derive(Serialize)]
struct FeatureSummary<'a> {
    key: String,
    title: &'a str,
    story_points: u32,
    stories: Vec<&'a str>,
}

#[derive(Serialize)]
struct EpicSummary<'a> {
    key: String,
    title: &'a str,
    priority: &'static str,
    story_points: u32,
    features: Vec<FeatureSummary<'a>>,
    direct_items: usize,
}

#[derive(Serialize)]
struct Stats<'a> {
    title: &'a str,
    epics: Vec<EpicSummary<'a>>,
    total_work_items: usize,
    total_story_points: u64,
    by_kind: BTreeMap<String, usize>,
}

fn summarize<'a>(view: &HierarchyView<'a>) -> Stats<'a> {
    let doc = view.document();

    let epics = view
        .epics
        .iter()
        .map(|epic| EpicSummary {
            key: epic.key.to_string(),
            title: &epic.title,
            priority: epic.priority.as_str(),
            story_points: epic.story_points,
            features: view
                .features_of(epic.id())
                .iter()
                .map(|feature| FeatureSummary {
                    key: feature.key.to_string(),
                    title: &feature.title,
                    story_points: feature.story_points,
                    stories: view
                        .stories_of(feature.id())
                        .iter()
                        .map(|s| s.title.as_str())
                        .collect(),
                })
                .collect(),
            direct_items: epic.child_ids().len() - view.features_of(epic.id()).len(),
        })
        .collect();

    Stats {
        title: doc.title(),
        epics,
        total_work_items: view.total_work_items,
        total_story_points: view.total_story_points,
        by_kind: view
            .count_by_kind()
            .into_iter()
            .map(|(kind, count)| (kind.label().to_string(), count))
            .collect(),
    }
}

pub fn run(output: &Output, file: &Path) -> Result<()> {
    let doc = load(file)?;
    let view = HierarchyView::compute(&doc);

    if output.is_json() {
        output.data(&summarize(&view));
        return Ok(());
    }

    println!("{}", doc.title());
    println!("{}", "-".repeat(60));

    if view.epics.is_empty() {
        println!("No epics.");
    }

    for epic in &view.epics {
        println!(
            "EPIC: {} ({} SP, {} priority)",
            epic.title, epic.story_points, epic.priority
        );

        for feature in view.features_of(epic.id()) {
            println!("  FEATURE: {} ({} SP)", feature.title, feature.story_points);
            for story in view.stories_of(feature.id()) {
                println!("    {}", item_line(story));
            }
        }

        for child in doc
            .children(epic.id())
            .filter(|c| c.kind != WorkItemType::Feature)
        {
            println!("  {}", item_line(child));
        }
    }

    println!();
    println!("Total work items: {}", view.total_work_items);
    println!("Total story points: {}", view.total_story_points);
    for (kind, count) in view.count_by_kind() {
        println!("  {:<12} {}", kind.label(), count);
    }

    Ok(())
}

fn item_line(node: &TaskNode) -> String {
    format!(
        "{}: {} ({} SP)",
        node.kind.label().to_uppercase(),
        node.title,
        node.story_points
    )
}
