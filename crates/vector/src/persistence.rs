//! Persistence port and its adapters
//!
//! The store only needs keyed put/get and a full scan. [`JournalBackend`] keeps an
//! append-only JSON Lines journal on disk and replays it on open; [`MemoryBackend`]
//! keeps everything in process memory.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use snipvec_common::{Result, SnipvecError};
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::record::VectorRecord;

/// Keyed record storage used by [`crate::VectorStore`]
pub trait PersistenceBackend: Sized {
    /// Open or create the storage bound to `location`
    fn open(location: &Path) -> Result<Self>;

    /// Insert or overwrite the record stored under `key`.
    ///
    /// Backends may reject records they cannot encode; [`crate::VectorStore::save`]
    /// refuses non-finite embeddings before any backend sees them.
    fn put(&mut self, key: &str, record: &VectorRecord) -> Result<()>;

    /// Look up a record by exact key
    fn get(&self, key: &str) -> Result<Option<VectorRecord>>;

    /// Every stored record matching `predicate`, in first-insertion order of keys
    fn scan_all<F>(&self, predicate: F) -> Result<Vec<VectorRecord>>
    where
        F: Fn(&VectorRecord) -> bool;

    /// Number of stored records
    fn len(&self) -> Result<usize> {
        Ok(self.scan_all(|_| true)?.len())
    }

    /// Fold any write log into a compact snapshot
    fn compact(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory backend; `location` is ignored
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: IndexMap<String, VectorRecord>,
}

impl PersistenceBackend for MemoryBackend {
    fn open(_location: &Path) -> Result<Self> {
        Ok(Self::default())
    }

    fn put(&mut self, key: &str, record: &VectorRecord) -> Result<()> {
        self.records.insert(key.to_string(), record.clone());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<VectorRecord>> {
        Ok(self.records.get(key).cloned())
    }

    fn scan_all<F>(&self, predicate: F) -> Result<Vec<VectorRecord>>
    where
        F: Fn(&VectorRecord) -> bool,
    {
        Ok(self.records.values().filter(|&r| predicate(r)).cloned().collect())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.records.len())
    }
}

/// One journal line
#[derive(Debug, Deserialize)]
struct JournalEntry {
    key: String,
    record: VectorRecord,
}

#[derive(Serialize)]
struct JournalEntryRef<'a> {
    key: &'a str,
    record: &'a VectorRecord,
}

/// Append-only JSON Lines journal with in-memory state
///
/// Each `put` appends `{"key": .., "record": ..}` and syncs the file before returning.
/// A failed append is truncated away, so it never replays.
/// Opening replays the journal; a later line for a key replaces the earlier one.
#[derive(Debug)]
pub struct JournalBackend {
    path: PathBuf,
    file: File,
    records: IndexMap<String, VectorRecord>,
    journal_lines: usize,
}

impl JournalBackend {
    /// Journal file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines currently in the journal file (including superseded ones)
    pub fn journal_lines(&self) -> usize {
        self.journal_lines
    }

    fn replay(path: &Path) -> Result<(IndexMap<String, VectorRecord>, usize)> {
        let mut records = IndexMap::new();
        let mut lines = 0;

        if !path.exists() {
            return Ok((records, lines));
        }

        let file = File::open(path).map_err(|e| {
            SnipvecError::persistence(format!("Failed to open journal {}: {}", path.display(), e))
        })?;

        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                SnipvecError::persistence(format!("Failed to read journal {}: {}", path.display(), e))
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let entry: JournalEntry = serde_json::from_str(&line).map_err(|e| {
                SnipvecError::persistence(format!(
                    "Corrupt journal entry at {}:{}: {}",
                    path.display(),
                    idx + 1,
                    e
                ))
            })?;
            records.insert(entry.key, entry.record);
            lines += 1;
        }

        Ok((records, lines))
    }

    fn open_append(path: &Path) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                SnipvecError::persistence(format!("Failed to open journal {}: {}", path.display(), e))
            })
    }

    fn encode_line(key: &str, record: &VectorRecord) -> Result<String> {
        let mut line = serde_json::to_string(&JournalEntryRef { key, record })
            .map_err(|e| SnipvecError::persistence(format!("Failed to encode '{}': {}", key, e)))?;
        line.push('\n');
        Ok(line)
    }

    /// Append one encoded line unbuffered; on failure cut the file back to its prior length
    fn append_line(&mut self, line: &str) -> Result<()> {
        let len_before = self
            .file
            .metadata()
            .map_err(|e| SnipvecError::persistence(format!("Failed to stat journal: {}", e)))?
            .len();

        let written = self
            .file
            .write_all(line.as_bytes())
            .and_then(|_| self.file.sync_data());

        if let Err(e) = written {
            if let Err(rollback) = self.file.set_len(len_before) {
                warn!(
                    "Failed to roll back journal {} to {} bytes: {}",
                    self.path.display(),
                    len_before,
                    rollback
                );
            }
            return Err(SnipvecError::persistence(format!(
                "Failed to append to journal {}: {}",
                self.path.display(),
                e
            )));
        }

        Ok(())
    }

    fn write_snapshot(&self, tmp_path: &Path) -> Result<()> {
        let tmp_file = File::create(tmp_path).map_err(|e| {
            SnipvecError::persistence(format!("Failed to create {}: {}", tmp_path.display(), e))
        })?;

        let mut writer = BufWriter::new(tmp_file);
        for (key, record) in &self.records {
            writer
                .write_all(Self::encode_line(key, record)?.as_bytes())
                .map_err(|e| SnipvecError::persistence(format!("Failed to write snapshot: {}", e)))?;
        }
        let tmp_file = writer
            .into_inner()
            .map_err(|e| SnipvecError::persistence(format!("Failed to write snapshot: {}", e.error())))?;
        tmp_file
            .sync_data()
            .map_err(|e| SnipvecError::persistence(format!("Failed to sync snapshot: {}", e)))
    }
}

impl PersistenceBackend for JournalBackend {
    fn open(location: &Path) -> Result<Self> {
        if let Some(parent) = location.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SnipvecError::persistence(format!(
                        "Failed to create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let (records, journal_lines) = Self::replay(location)?;
        let file = Self::open_append(location)?;

        debug!(
            "Journal replayed - {} records from {} lines ({})",
            records.len(),
            journal_lines,
            location.display()
        );

        Ok(Self {
            path: location.to_path_buf(),
            file,
            records,
            journal_lines,
        })
    }

    fn put(&mut self, key: &str, record: &VectorRecord) -> Result<()> {
        // JSON has no NaN/inf; serde_json would write null and break replay
        if record.embedding.iter().any(|x| !x.is_finite()) {
            return Err(SnipvecError::persistence(format!(
                "Record '{}' has non-finite embedding values",
                key
            )));
        }

        let line = Self::encode_line(key, record)?;
        self.append_line(&line)?;
        self.journal_lines += 1;
        self.records.insert(key.to_string(), record.clone());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<VectorRecord>> {
        Ok(self.records.get(key).cloned())
    }

    fn scan_all<F>(&self, predicate: F) -> Result<Vec<VectorRecord>>
    where
        F: Fn(&VectorRecord) -> bool,
    {
        Ok(self.records.values().filter(|&r| predicate(r)).cloned().collect())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.records.len())
    }

    fn compact(&mut self) -> Result<()> {
        let mut tmp_name = OsString::from(self.path.as_os_str());
        tmp_name.push(".compact");
        let tmp_path = PathBuf::from(tmp_name);

        // The live journal stays untouched until the snapshot is complete
        if let Err(e) = self.write_snapshot(&tmp_path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e);
        }

        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp_path);
            SnipvecError::persistence(format!(
                "Failed to replace journal {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let before = self.journal_lines;
        self.file = Self::open_append(&self.path)?;
        self.journal_lines = self.records.len();

        info!(
            "Journal compacted - {} lines -> {} lines ({})",
            before,
            self.journal_lines,
            self.path.display()
        );
        Ok(())
    }
}
