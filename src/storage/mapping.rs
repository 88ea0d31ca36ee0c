//! JSONL storage for submitted item ids
//!
//! Each sync plugin has its own file, `.backlog/sync/{plugin}.jsonl`, with one
//! `{local_key, remote_id, kind, last_sync}` object per line. Writers hold an
//! exclusive lock on `{plugin}.jsonl.lock` for the whole read-merge-write;
//! the data file itself is replaced atomically by rename.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::domain::{ItemKey, WorkItemType};

/// Local key to remote id link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdMapping {
    pub local_key: ItemKey,

    /// Id assigned by the tracker
    pub remote_id: u64,

    pub kind: WorkItemType,

    pub last_sync: DateTime<Utc>,
}

/// Store for id mappings in JSONL format
pub struct MappingStore {
    path: PathBuf,
}

impl MappingStore {
    /// Creates a new mapping store at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the store for a plugin inside a sync directory
    pub fn for_plugin(sync_dir: &Path, plugin: &str) -> Self {
        Self::new(sync_dir.join(format!("{}.jsonl", plugin)))
    }

    /// Returns the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all mappings, keyed by local key
    pub fn read_all(&self) -> Result<BTreeMap<String, IdMapping>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open mapping file: {}", self.path.display()))?;

        file.lock_shared()
            .context("Failed to acquire read lock on mapping file")?;

        let reader = BufReader::new(&file);
        let mut mappings = BTreeMap::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

            if line.trim().is_empty() {
                continue;
            }

            let mapping: IdMapping = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse mapping at line {}", line_num + 1))?;

            mappings.insert(mapping.local_key.to_string(), mapping);
        }

        Ok(mappings)
    }

    /// Remote id of every mapped item
    pub fn remote_ids(&self) -> Result<HashMap<ItemKey, u64>> {
        Ok(self
            .read_all()?
            .into_values()
            .map(|m| (m.local_key, m.remote_id))
            .collect())
    }

    /// Adds or replaces mappings and rewrites the file
    pub fn record(&self, new: impl IntoIterator<Item = IdMapping>) -> Result<usize> {
        let _lock = self.lock()?;

        let mut mappings = self.read_all()?;
        let mut count = 0;
        for mapping in new {
            mappings.insert(mapping.local_key.to_string(), mapping);
            count += 1;
        }
        self.write_all(&mappings)?;
        Ok(count)
    }

    /// Exclusive lock held until the returned file is dropped
    fn lock(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let lock_path = self.path.with_extension("jsonl.lock");
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;

        file.lock_exclusive()
            .context("Failed to acquire write lock on mapping store")?;

        Ok(file)
    }

    /// Full rewrite, sorted by key; the caller holds the store lock
    fn write_all(&self, mappings: &BTreeMap<String, IdMapping>) -> Result<()> {
        let temp_path = self.path.with_extension("jsonl.tmp");

        {
            let file = File::create(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;
            let mut writer = BufWriter::new(&file);

            for mapping in mappings.values() {
                let line = serde_json::to_string(mapping).context("Failed to serialize mapping")?;
                writeln!(writer, "{}", line).context("Failed to write mapping")?;
            }

            writer.flush().context("Failed to flush mapping file")?;
        }

        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }
}
