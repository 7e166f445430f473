//! Local filesystem ledger.
//!
//! Stores one JSON-encoded [`KnownEntry`] per line and only ever appends.
//! A line torn by a crash mid-append is skipped on load and never glued to
//! the next entry.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{KnownEntry, ListingIdentity};
use crate::storage::{Ledger, RecordOutcome};

/// Row keys per partition, mirrored from the file.
#[derive(Debug, Default)]
struct LedgerIndex {
    loaded: bool,
    rows: HashMap<String, HashSet<String>>,
    /// File ends without a newline
    torn_tail: bool,
}

/// Append-only JSON-lines ledger.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    index: Mutex<LedgerIndex>,
}

impl FileLedger {
    /// Create a ledger backed by the given file. The file is created lazily.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            index: Mutex::new(LedgerIndex::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every well-formed entry, skipping damaged lines.
    ///
    /// Lines are decoded one by one, so a tear inside a multi-byte character
    /// only costs that line.
    async fn read_entries(&self) -> Result<(Vec<KnownEntry>, bool)> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), false)),
            Err(e) => return Err(self.unavailable(e)),
        };

        let torn_tail = content.last().is_some_and(|byte| *byte != b'\n');
        let mut entries = Vec::new();
        for (number, bytes) in content.split(|byte| *byte == b'\n').enumerate() {
            let line = match std::str::from_utf8(bytes) {
                Ok(line) => line.trim(),
                Err(e) => {
                    self.skip_line(number, e);
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<KnownEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => self.skip_line(number, e),
            }
        }
        Ok((entries, torn_tail))
    }

    fn skip_line(&self, index: usize, error: impl std::fmt::Display) {
        log::warn!(
            "Skipping damaged ledger line {} in {}: {}",
            index + 1,
            self.path.display(),
            error
        );
    }

    /// Rebuild the index from disk.
    async fn reload(&self, index: &mut LedgerIndex) -> Result<Vec<KnownEntry>> {
        let (entries, torn_tail) = self.read_entries().await?;

        index.rows.clear();
        for entry in &entries {
            index
                .rows
                .entry(entry.partition.clone())
                .or_default()
                .insert(entry.row_key.clone());
        }
        index.torn_tail = torn_tail;
        index.loaded = true;
        Ok(entries)
    }

    /// Append one line, flushed to disk before returning.
    async fn append_line(&self, line: &str, torn_tail: bool) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.unavailable(e))?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.unavailable(e))?;

        let mut bytes = Vec::with_capacity(line.len() + 2);
        if torn_tail {
            bytes.push(b'\n');
        }
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');

        file.write_all(&bytes).await.map_err(|e| self.unavailable(e))?;
        file.flush().await.map_err(|e| self.unavailable(e))?;
        file.sync_data().await.map_err(|e| self.unavailable(e))?;
        Ok(())
    }

    fn unavailable(&self, error: impl std::fmt::Display) -> AppError {
        AppError::ledger(format!("{}: {}", self.path.display(), error))
    }
}

#[async_trait]
impl Ledger for FileLedger {
    async fn query_known(&self, partition: &str) -> Result<HashSet<ListingIdentity>> {
        let mut index = self.index.lock().await;
        let entries = self.reload(&mut index).await?;

        Ok(entries
            .into_iter()
            .filter(|entry| entry.partition == partition)
            .map(|entry| entry.identity)
            .collect())
    }

    async fn record(&self, entry: &KnownEntry) -> Result<RecordOutcome> {
        let mut index = self.index.lock().await;
        if !index.loaded {
            self.reload(&mut index).await?;
        }

        let exists = index
            .rows
            .get(&entry.partition)
            .is_some_and(|rows| rows.contains(&entry.row_key));
        if exists {
            log::debug!("Ledger already holds {}", entry.identity);
            return Ok(RecordOutcome::AlreadyExists);
        }

        let line = serde_json::to_string(entry).map_err(|e| self.unavailable(e))?;
        self.append_line(&line, index.torn_tail).await?;

        index.torn_tail = false;
        index
            .rows
            .entry(entry.partition.clone())
            .or_default()
            .insert(entry.row_key.clone());
        Ok(RecordOutcome::Inserted)
    }
}
