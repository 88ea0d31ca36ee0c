//! Submit command: create the parsed hierarchy in a tracker

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use super::output::Output;
use super::parse_cmd::load;
use crate::domain::HierarchyView;
use crate::storage::{Config, IdMapping, MappingStore};
use crate::submit::{self, plugin_name, DryRunClient, PluginClient, SubmitError, SubmitReport};

pub struct SubmitArgs<'a> {
    pub file: &'a Path,
    pub project: Option<String>,
    pub plugin: Option<String>,
    pub dry_run: bool,
}

pub fn run(output: &Output, config: &Config, args: SubmitArgs<'_>) -> Result<()> {
    let settings = config.effective();

    let project = args.project.or(settings.project).ok_or_else(|| {
        anyhow::anyhow!("No target project. Pass --project or set `project` in .backlog/config.toml")
    })?;
    let plugin = args.plugin.or(settings.plugin);

    let doc = load(args.file)?;
    let view = HierarchyView::compute(&doc);
    info!(
        epics = view.epics.len(),
        items = view.total_work_items,
        points = view.total_story_points,
        "built hierarchy"
    );

    let store = match (config.sync_dir(), &plugin) {
        (Some(sync_dir), Some(plugin)) => {
            Some(MappingStore::for_plugin(&sync_dir, plugin_name(plugin)))
        }
        _ => None,
    };
    let synced = match &store {
        Some(store) => store.remote_ids()?,
        None => HashMap::new(),
    };

    if args.dry_run {
        let mut client = DryRunClient::new();
        let report = submit::submit_hierarchy(&view, &mut client, &project, &synced)?;
        print_report(output, &report, true);
        return Ok(());
    }

    let plugin = plugin.ok_or_else(|| {
        anyhow::anyhow!("No sync plugin. Pass --plugin, set `plugin` in config, or use --dry-run")
    })?;

    let plugin_dir = config.plugin_dir();
    let mut client = PluginClient::discover(&plugin, plugin_dir.as_deref())?;

    match client.manifest() {
        Ok(manifest) if !manifest.supports("create") => {
            warn!(plugin = %manifest.name, "plugin manifest does not list the create operation")
        }
        Ok(manifest) => info!(plugin = %manifest.name, version = %manifest.version, "loaded plugin"),
        Err(e) => warn!(error = %e, "could not read plugin manifest"),
    }

    if !client.test().context("Plugin connectivity test failed")? {
        anyhow::bail!("Plugin '{}' reported that the tracker is unreachable", client.name());
    }

    let report = match submit::submit_hierarchy(&view, &mut client, &project, &synced) {
        Ok(report) => report,
        Err(err) => {
            if let (SubmitError::Interrupted { report, .. }, Some(store)) = (&err, &store) {
                save_mappings(store, report)?;
            }
            return Err(err.into());
        }
    };

    if let Some(store) = &store {
        save_mappings(store, &report)?;
    }

    print_report(output, &report, false);
    Ok(())
}

fn save_mappings(store: &MappingStore, report: &SubmitReport) -> Result<()> {
    if report.created.is_empty() {
        return Ok(());
    }

    let now = Utc::now();
    let recorded = store.record(report.created.iter().map(|item| IdMapping {
        local_key: item.key.clone(),
        remote_id: item.remote_id,
        kind: item.kind,
        last_sync: now,
    }))?;
    info!(count = recorded, path = %store.path().display(), "saved id mappings");
    Ok(())
}

fn print_report(output: &Output, report: &SubmitReport, dry_run: bool) {
    if output.is_json() {
        output.data(&serde_json::json!({
            "dry_run": dry_run,
            "project": report.project,
            "created": report.created,
            "already_synced": report.already_synced,
            "skipped": report.skipped,
        }));
        return;
    }

    for item in &report.created {
        let parent = item
            .parent_remote_id
            .map(|p| format!(" (parent #{})", p))
            .unwrap_or_default();
        println!(
            "#{:<6} {:<10} {}{}",
            item.remote_id,
            item.kind.label(),
            item.title,
            parent
        );
    }

    if !report.already_synced.is_empty() {
        println!(
            "{} item(s) already synced, not sent again",
            report.already_synced.len()
        );
    }

    if report.skipped > 0 {
        println!("Skipped {} item(s) outside the epic/feature/story levels", report.skipped);
    }

    let verb = if dry_run { "Would create" } else { "Created" };
    output.success(&format!(
        "{} {} work item(s) in {}",
        verb,
        report.created.len(),
        report.project
    ));
}
