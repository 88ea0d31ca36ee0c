//! CLI integration tests for Backlog
//!
//! These tests drive the `backlog` binary over the markdown fixtures in
//! `tests/fixtures/`, from parsing through dry-run and plugin submission.

use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get a command instance for the backlog binary
fn backlog_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("backlog"));
    cmd.env_remove("BACKLOG_PROJECT").env_remove("RUST_LOG");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Runs a command and parses its stdout as JSON
fn json_output(cmd: &mut assert_cmd::Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "command failed: {:?}", output);
    serde_json::from_slice(&output.stdout).unwrap()
}

/// Temporary directory with an empty `.backlog/` project
fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join(".backlog")).unwrap();
    dir
}

// =============================================================================
// Parse Tests
// =============================================================================

#[test]
fn test_parse_prints_tree() {
    let dir = TempDir::new().unwrap();

    backlog_cmd()
        .current_dir(dir.path())
        .arg("parse")
        .arg(fixture("sample-tasks.md"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Sample Development Tasks"))
        .stdout(predicate::str::contains(
            "EPIC: Authentication & Security (21 SP, critical priority)",
        ))
        .stdout(predicate::str::contains(
            "  FEATURE: JWT Authentication (8 SP, medium priority)",
        ))
        .stdout(predicate::str::contains(
            "    TASK: Implement token validation (0 SP, medium priority)",
        ))
        .stdout(predicate::str::contains(
            "EPIC: DDD Architecture Refactor (34 SP, high priority)",
        ));
}

#[test]
fn test_parse_json_document() {
    let dir = TempDir::new().unwrap();
    let json = json_output(
        backlog_cmd()
            .current_dir(dir.path())
            .args(["--format", "json", "parse"])
            .arg(fixture("sample-tasks.md")),
    );

    assert_eq!(json["title"], "Sample Development Tasks");
    assert_eq!(json["source_name"], "sample-tasks.md");
    assert_eq!(
        json["description"],
        "Backlog for the authentication and platform work."
    );

    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["kind"], "epic");
    assert_eq!(items[0]["priority"], "critical");
    assert_eq!(items[0]["story_points"], 21);
    assert_eq!(items[0]["business_value"], "High - protects customer data");
    assert_eq!(items[0]["description"], "Harden login and API access.");
    assert_eq!(items[0]["children"][1]["title"], "API Rate Limiting");
    assert_eq!(items[0]["children"][1]["story_points"], 5);

    let epic_key = items[0]["key"].as_str().unwrap();
    let feature_key = items[0]["children"][0]["key"].as_str().unwrap();
    assert!(epic_key.starts_with("e-"));
    assert_eq!(feature_key, format!("{}.1", epic_key));
}

#[test]
fn test_parse_bare_bullets() {
    let dir = TempDir::new().unwrap();
    let json = json_output(
        backlog_cmd()
            .current_dir(dir.path())
            .args(["-f", "json", "parse"])
            .arg(fixture("simple-tasks.md")),
    );

    let items = json["items"].as_array().unwrap();
    let titles: Vec<&str> = items.iter().map(|i| i["title"].as_str().unwrap()).collect();
    assert_eq!(
        titles,
        vec![
            "Fix authentication issues",
            "Update dependencies",
            "Add logging",
            "Improve error handling"
        ]
    );
    assert!(items.iter().all(|i| i["kind"] == "task"));
    assert!(items.iter().all(|i| i["story_points"] == 0));
}

#[test]
fn test_parse_frontmatter_metadata() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("tasks.md");
    fs::write(&file, "---\nteam: Platform\n---\n# Tasks\n- One\n").unwrap();

    let json = json_output(
        backlog_cmd()
            .current_dir(dir.path())
            .args(["--format", "json", "parse"])
            .arg(&file),
    );

    assert_eq!(json["metadata"]["team"], "Platform");
    assert_eq!(json["title"], "Tasks");
}

#[test]
fn test_parse_missing_file() {
    let dir = TempDir::new().unwrap();

    backlog_cmd()
        .current_dir(dir.path())
        .args(["parse", "does-not-exist.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_parse_empty_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("empty.md");
    fs::write(&file, "").unwrap();

    backlog_cmd()
        .current_dir(dir.path())
        .arg("parse")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Development Tasks"))
        .stdout(predicate::str::contains("No work items found."));
}

// =============================================================================
// Stats and Show Tests
// =============================================================================

#[test]
fn test_stats_totals() {
    let dir = TempDir::new().unwrap();
    let json = json_output(
        backlog_cmd()
            .current_dir(dir.path())
            .args(["--format", "json", "stats"])
            .arg(fixture("sample-tasks.md")),
    );

    assert_eq!(json["total_work_items"], 9);
    assert_eq!(json["total_story_points"], 81);
    assert_eq!(json["epics"].as_array().unwrap().len(), 2);
    assert_eq!(json["epics"][0]["features"][0]["stories"][1], "Add refresh tokens");
    assert_eq!(json["by_kind"]["feature"], 3);
    assert_eq!(json["by_kind"]["task"], 4);
}

#[test]
fn test_stats_text() {
    let dir = TempDir::new().unwrap();

    backlog_cmd()
        .current_dir(dir.path())
        .arg("stats")
        .arg(fixture("sample-tasks.md"))
        .assert()
        .success()
        .stdout(predicate::str::contains("FEATURE: Bounded Contexts (13 SP)"))
        .stdout(predicate::str::contains("Total work items: 9"))
        .stdout(predicate::str::contains("Total story points: 81"));
}

#[test]
fn test_show_by_position() {
    let dir = TempDir::new().unwrap();

    backlog_cmd()
        .current_dir(dir.path())
        .arg("show")
        .arg(fixture("sample-tasks.md"))
        .arg("1.1")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "FEATURE: JWT Authentication (8 SP, medium priority)",
        ))
        .stdout(predicate::str::contains("Parent: Authentication & Security"))
        .stdout(predicate::str::contains("TASK: Add refresh tokens"));
}

#[test]
fn test_show_json_subtree() {
    let dir = TempDir::new().unwrap();
    let json = json_output(
        backlog_cmd()
            .current_dir(dir.path())
            .args(["--format", "json", "show"])
            .arg(fixture("sample-tasks.md"))
            .arg("2"),
    );

    assert_eq!(json["title"], "DDD Architecture Refactor");
    assert_eq!(json["children"][0]["children"][0]["title"], "Split billing module");
}

#[test]
fn test_show_bad_position() {
    let dir = TempDir::new().unwrap();

    backlog_cmd()
        .current_dir(dir.path())
        .arg("show")
        .arg(fixture("sample-tasks.md"))
        .arg("3.1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No work item at position 3.1"));

    backlog_cmd()
        .current_dir(dir.path())
        .arg("show")
        .arg(fixture("sample-tasks.md"))
        .arg("abc")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid item 'abc'"));
}

#[test]
fn test_show_by_key() {
    let dir = TempDir::new().unwrap();
    let feature = json_output(
        backlog_cmd()
            .current_dir(dir.path())
            .args(["--format", "json", "show"])
            .arg(fixture("sample-tasks.md"))
            .arg("1.1"),
    );
    let key = feature["key"].as_str().unwrap().to_string();

    backlog_cmd()
        .current_dir(dir.path())
        .arg("show")
        .arg(fixture("sample-tasks.md"))
        .arg(&key)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "FEATURE: JWT Authentication (8 SP, medium priority)",
        ))
        .stdout(predicate::str::contains(format!("Key: {}", key)));

    backlog_cmd()
        .current_dir(dir.path())
        .arg("show")
        .arg(fixture("sample-tasks.md"))
        .arg("t-0000000.9")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No work item with key t-0000000.9"));
}

// =============================================================================
// Submit Tests
// =============================================================================

#[test]
fn test_submit_dry_run() {
    let dir = TempDir::new().unwrap();

    backlog_cmd()
        .current_dir(dir.path())
        .arg("submit")
        .arg(fixture("sample-tasks.md"))
        .args(["--project", "Apollo", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would create 9 work item(s) in Apollo"));
}

#[test]
fn test_submit_dry_run_order() {
    let dir = TempDir::new().unwrap();
    let json = json_output(
        backlog_cmd()
            .current_dir(dir.path())
            .args(["--format", "json", "submit"])
            .arg(fixture("sample-tasks.md"))
            .args(["--project", "Apollo", "--dry-run"]),
    );

    assert_eq!(json["dry_run"], true);
    let created = json["created"].as_array().unwrap();
    let titles: Vec<&str> = created.iter().map(|c| c["title"].as_str().unwrap()).collect();
    assert_eq!(
        titles,
        vec![
            "Authentication & Security",
            "JWT Authentication",
            "Implement token validation",
            "Add refresh tokens",
            "API Rate Limiting",
            "Add per-client quotas",
            "DDD Architecture Refactor",
            "Bounded Contexts",
            "Split billing module",
        ]
    );

    let parents: Vec<Option<u64>> = created
        .iter()
        .map(|c| c["parent_remote_id"].as_u64())
        .collect();
    assert_eq!(
        parents,
        vec![None, Some(1), Some(2), Some(2), Some(1), Some(5), None, Some(7), Some(8)]
    );
}

#[test]
fn test_submit_project_from_config() {
    let dir = setup_project();
    fs::write(
        dir.path().join(".backlog/config.toml"),
        "project = \"FromConfig\"\n",
    )
    .unwrap();

    backlog_cmd()
        .current_dir(dir.path())
        .arg("submit")
        .arg(fixture("simple-tasks.md"))
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Would create 4 work item(s) in FromConfig"));
}

#[test]
fn test_submit_requires_project() {
    let dir = TempDir::new().unwrap();

    backlog_cmd()
        .current_dir(dir.path())
        .arg("submit")
        .arg(fixture("sample-tasks.md"))
        .arg("--dry-run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No target project"));
}

#[test]
fn test_submit_requires_plugin() {
    let dir = TempDir::new().unwrap();

    backlog_cmd()
        .current_dir(dir.path())
        .arg("submit")
        .arg(fixture("sample-tasks.md"))
        .args(["--project", "Apollo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No sync plugin"));
}

#[cfg(unix)]
#[test]
fn test_submit_through_plugin() {
    use std::os::unix::fs::PermissionsExt;

    let dir = setup_project();
    let plugins = dir.path().join(".backlog/plugins");
    fs::create_dir_all(&plugins).unwrap();

    let script = plugins.join("backlog-sync-fake");
    fs::write(
        &script,
        r#"#!/bin/sh
if [ "$1" = "--manifest" ]; then
  echo '{"name":"backlog-sync-fake","version":"0.1.0","operations":["create","test"]}'
  exit 0
fi
read line
echo '{"success":true,"data":{"id":42}}'
"#,
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    backlog_cmd()
        .current_dir(dir.path())
        .arg("submit")
        .arg(fixture("simple-tasks.md"))
        .args(["--project", "Apollo", "--plugin", "fake"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created 4 work item(s) in Apollo"));

    let mappings = fs::read_to_string(dir.path().join(".backlog/sync/fake.jsonl")).unwrap();
    let lines: Vec<&str> = mappings.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines.iter().all(|l| l.contains(r#""remote_id":42"#)));
}

#[cfg(unix)]
#[test]
fn test_submit_plugin_rejects() {
    use std::os::unix::fs::PermissionsExt;

    let dir = setup_project();
    let plugins = dir.path().join(".backlog/plugins");
    fs::create_dir_all(&plugins).unwrap();

    let script = plugins.join("backlog-sync-grumpy");
    fs::write(
        &script,
        r#"#!/bin/sh
if [ "$1" = "--manifest" ]; then
  echo '{"name":"backlog-sync-grumpy","version":"0.1.0","operations":["create","test"]}'
  exit 0
fi
read line
case "$line" in
  *'"operation":"test"'*) echo '{"success":true}' ;;
  *) echo '{"success":false,"error":"project is archived"}' ;;
esac
"#,
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    backlog_cmd()
        .current_dir(dir.path())
        .arg("submit")
        .arg(fixture("simple-tasks.md"))
        .args(["--project", "Apollo", "--plugin", "grumpy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("project is archived"));

    assert!(!dir.path().join(".backlog/sync/grumpy.jsonl").exists());
}

#[cfg(unix)]
#[test]
fn test_submit_resumes_after_failure() {
    use std::os::unix::fs::PermissionsExt;

    let dir = setup_project();
    let plugins = dir.path().join(".backlog/plugins");
    fs::create_dir_all(&plugins).unwrap();

    // Third create call fails; ids are 100 + call number
    let script = plugins.join("backlog-sync-flaky");
    fs::write(
        &script,
        r#"#!/bin/sh
if [ "$1" = "--manifest" ]; then
  echo '{"name":"backlog-sync-flaky","version":"0.1.0","operations":["create","test"]}'
  exit 0
fi
read line
case "$line" in
  *'"operation":"test"'*) echo '{"success":true}'; exit 0 ;;
esac
count=$(cat calls 2>/dev/null || echo 0)
count=$((count + 1))
echo "$count" > calls
if [ "$count" -eq 3 ]; then
  echo '{"success":false,"error":"quota exceeded"}'
else
  echo "{\"success\":true,\"data\":{\"id\":$((100 + count))}}"
fi
"#,
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let mappings = dir.path().join(".backlog/sync/flaky.jsonl");
    let remote_ids = || -> Vec<u64> {
        let mut ids: Vec<u64> = fs::read_to_string(&mappings)
            .unwrap()
            .lines()
            .map(|l| {
                let mapping: serde_json::Value = serde_json::from_str(l).unwrap();
                mapping["remote_id"].as_u64().unwrap()
            })
            .collect();
        ids.sort();
        ids
    };

    backlog_cmd()
        .current_dir(dir.path())
        .arg("submit")
        .arg(fixture("simple-tasks.md"))
        .args(["--project", "Apollo", "--plugin", "flaky"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Submission stopped after creating 2 item(s)"))
        .stderr(predicate::str::contains("quota exceeded"));

    assert_eq!(remote_ids(), vec![101, 102]);

    backlog_cmd()
        .current_dir(dir.path())
        .arg("submit")
        .arg(fixture("simple-tasks.md"))
        .args(["--project", "Apollo", "--plugin", "flaky"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 item(s) already synced"))
        .stdout(predicate::str::contains("Created 2 work item(s) in Apollo"));

    assert_eq!(remote_ids(), vec![101, 102, 104, 105]);
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_config_show() {
    let dir = setup_project();
    fs::write(
        dir.path().join(".backlog/config.toml"),
        "project = \"Apollo\"\nplugin = \"azure\"\ndefault_format = \"json\"\n",
    )
    .unwrap();

    let json = json_output(backlog_cmd().current_dir(dir.path()).args(["config", "show"]));

    assert_eq!(json["project"], "Apollo");
    assert_eq!(json["plugin"], "azure");
    assert_eq!(json["default_format"], "json");
}

#[test]
fn test_config_show_outside_project() {
    let dir = TempDir::new().unwrap();

    backlog_cmd()
        .current_dir(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("project_root"))
        .stdout(predicate::str::contains("(not set)"));
}
