//! Sync plugin discovery and execution
//!
//! A sync plugin is an executable named `backlog-sync-{name}`, found in the
//! configured plugin directory first and then on `PATH`. Every request spawns
//! the plugin once, writes one JSON line to its stdin and reads one JSON line
//! back from its stdout.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::client::WorkItemClient;
use super::fields::WorkItemFields;
use super::protocol::{PluginManifest, PluginRequest, PluginResponse};
use super::SubmitError;
use crate::domain::TaskNode;

/// Executable name prefix for sync plugins
pub const PLUGIN_PREFIX: &str = "backlog-sync-";

/// Short name of a plugin given by name or path
///
/// `azure`, `backlog-sync-azure` and `./bin/backlog-sync-azure` all give
/// `azure`; sync mappings are stored under this name.
pub fn plugin_name(spec: &str) -> &str {
    let file_name = Path::new(spec)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(spec);
    file_name.strip_prefix(PLUGIN_PREFIX).unwrap_or(file_name)
}

/// Client backed by an external sync plugin
#[derive(Debug, Clone)]
pub struct PluginClient {
    name: String,
    path: PathBuf,
}

impl PluginClient {
    /// Uses the executable at `path` directly
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| plugin_name(n).to_string())
            .unwrap_or_default();

        Self { name, path }
    }

    /// Finds `backlog-sync-{name}`, or uses `name` itself when it is a path
    pub fn discover(name: &str, plugin_dir: Option<&Path>) -> Result<Self> {
        let as_path = Path::new(name);
        if as_path.components().count() > 1 && is_executable(as_path) {
            return Ok(Self::from_path(as_path));
        }

        let file_name = format!("{}{}", PLUGIN_PREFIX, name);
        let mut dirs: Vec<PathBuf> = plugin_dir.map(Path::to_path_buf).into_iter().collect();
        if let Some(path_var) = std::env::var_os("PATH") {
            dirs.extend(std::env::split_paths(&path_var));
        }

        let path = dirs
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| is_executable(candidate))
            .ok_or_else(|| anyhow::anyhow!("Plugin not found: {}", file_name))?;

        debug!(plugin = name, path = %path.display(), "found sync plugin");

        Ok(Self {
            name: plugin_name(name).to_string(),
            path,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the manifest from the plugin
    pub fn manifest(&self) -> Result<PluginManifest> {
        let output = Command::new(&self.path)
            .arg("--manifest")
            .output()
            .with_context(|| format!("Failed to execute plugin: {}", self.path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Plugin returned error: {}", stderr.trim());
        }

        serde_json::from_slice(&output.stdout).context("Failed to parse plugin manifest")
    }

    /// Executes a plugin request
    pub fn execute(&self, request: &PluginRequest) -> Result<PluginResponse> {
        let mut child = Command::new(&self.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("Failed to spawn plugin: {}", self.path.display()))?;

        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| anyhow::anyhow!("Failed to open plugin stdin"))?;
            let request_json =
                serde_json::to_string(request).context("Failed to serialize request")?;
            writeln!(stdin, "{}", request_json).context("Failed to write to plugin")?;
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("Failed to open plugin stdout"))?;

        let response_line = BufReader::new(stdout)
            .lines()
            .next()
            .ok_or_else(|| anyhow::anyhow!("No response from plugin {}", self.name))?
            .context("Failed to read plugin response")?;

        let response: PluginResponse =
            serde_json::from_str(&response_line).context("Failed to parse plugin response")?;

        let status = child.wait().context("Failed to wait for plugin")?;
        if !status.success() {
            warn!(plugin = %self.name, %status, "plugin exited with failure after responding");
        }

        Ok(response)
    }

    /// Tests connectivity to the tracker behind the plugin
    pub fn test(&self) -> Result<bool> {
        let request = PluginRequest::new("test", serde_json::json!({}));
        Ok(self.execute(&request)?.success)
    }
}

impl WorkItemClient for PluginClient {
    fn create_work_item(
        &mut self,
        node: &TaskNode,
        project: &str,
        parent_id: Option<u64>,
    ) -> Result<u64> {
        let fields = WorkItemFields::from_node(node);
        let request = PluginRequest::new(
            "create",
            serde_json::json!({
                "project": project,
                "parent_id": parent_id,
                "key": node.key.to_string(),
                "patch": fields.patch_document(),
                "fields": fields,
            }),
        );

        let response = self.execute(&request)?;
        if !response.success {
            return Err(SubmitError::Rejected {
                title: node.title.clone(),
                reason: response
                    .error
                    .unwrap_or_else(|| "Unknown error".to_string()),
            }
            .into());
        }

        response.created_id().ok_or_else(|| {
            SubmitError::NoId {
                title: node.title.clone(),
            }
            .into()
        })
    }
}

/// Checks if a file is executable
fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(meta) = path.metadata() {
            return meta.is_file() && meta.permissions().mode() & 0o111 != 0;
        }
    }

    #[cfg(windows)]
    {
        if let Some(ext) = path.extension() {
            return path.is_file() && (ext == "exe" || ext == "bat" || ext == "cmd");
        }
    }

    false
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::domain::{Document, NodeDraft, WorkItemType};
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn sample_doc() -> Document {
        let mut doc = Document::new("", "", "");
        doc.add_root(NodeDraft::new(WorkItemType::Epic, "Security"));
        doc
    }

    #[test]
    fn discover_in_plugin_dir() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "backlog-sync-fake", "exit 0");

        let client = PluginClient::discover("fake", Some(dir.path())).unwrap();
        assert_eq!(client.name(), "fake");
        assert_eq!(client.path(), dir.path().join("backlog-sync-fake"));
    }

    #[test]
    fn short_names() {
        assert_eq!(plugin_name("azure"), "azure");
        assert_eq!(plugin_name("backlog-sync-azure"), "azure");
        assert_eq!(plugin_name("./bin/backlog-sync-azure"), "azure");
        assert_eq!(plugin_name("/opt/tools/jira"), "jira");
    }

    #[test]
    fn discover_missing_plugin() {
        let dir = TempDir::new().unwrap();
        let err = PluginClient::discover("definitely-not-installed", Some(dir.path())).unwrap_err();

        assert!(err.to_string().contains("backlog-sync-definitely-not-installed"));
    }

    #[test]
    fn non_executable_is_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("backlog-sync-plain"), "not a script").unwrap();

        assert!(PluginClient::discover("plain", Some(dir.path())).is_err());
    }

    #[test]
    fn manifest_from_plugin() {
        let dir = TempDir::new().unwrap();
        let path = write_script(
            dir.path(),
            "backlog-sync-fake",
            r#"echo '{"name":"backlog-sync-fake","version":"0.1.0","operations":["create","test"]}'"#,
        );

        let manifest = PluginClient::from_path(path).manifest().unwrap();
        assert_eq!(manifest.name, "backlog-sync-fake");
        assert!(manifest.supports("create"));
    }

    #[test]
    fn create_returns_remote_id() {
        let dir = TempDir::new().unwrap();
        let path = write_script(
            dir.path(),
            "backlog-sync-fake",
            r#"read line; echo '{"success":true,"data":{"id":77}}'"#,
        );
        let doc = sample_doc();
        let mut client = PluginClient::from_path(path);

        let id = client
            .create_work_item(doc.roots().next().unwrap(), "Apollo", None)
            .unwrap();
        assert_eq!(id, 77);
    }

    #[test]
    fn create_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_script(
            dir.path(),
            "backlog-sync-fake",
            r#"read line; echo '{"success":false,"error":"quota exceeded"}'"#,
        );
        let doc = sample_doc();
        let mut client = PluginClient::from_path(path);

        let err = client
            .create_work_item(doc.roots().next().unwrap(), "Apollo", None)
            .unwrap_err();
        let submit_err = err.downcast_ref::<SubmitError>().unwrap();
        assert!(matches!(submit_err, SubmitError::Rejected { reason, .. } if reason == "quota exceeded"));
    }

    #[test]
    fn create_without_id() {
        let dir = TempDir::new().unwrap();
        let path = write_script(
            dir.path(),
            "backlog-sync-fake",
            r#"read line; echo '{"success":true,"data":{}}'"#,
        );
        let doc = sample_doc();
        let mut client = PluginClient::from_path(path);

        let err = client
            .create_work_item(doc.roots().next().unwrap(), "Apollo", None)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SubmitError>(),
            Some(SubmitError::NoId { .. })
        ));
    }

    #[test]
    fn test_operation() {
        let dir = TempDir::new().unwrap();
        let path = write_script(
            dir.path(),
            "backlog-sync-fake",
            r#"read line; echo '{"success":true}'"#,
        );

        assert!(PluginClient::from_path(path).test().unwrap());
    }
}
