use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use explorer_logging::explorer_warn;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::filename::record_filename;
use crate::storage::{KeyValueStore, StorageError};

/// Ensure the store directory exists; create if missing.
pub fn ensure_store_dir(dir: &Path) -> Result<(), StorageError> {
    if dir.exists() {
        let meta = fs::metadata(dir)?;
        if !meta.is_dir() {
            return Err(StorageError::Io(format!("{dir:?} is not a directory")));
        }
    } else {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, StorageError> {
        ensure_store_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&target)
            .map_err(|e| StorageError::Io(e.error.to_string()))?;
        Ok(target)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    key: String,
    value: String,
}

/// Durable store: one JSON record per key in a directory.
///
/// With a quota, a write that would push the directory's record bytes past it
/// fails with [`StorageError::QuotaExceeded`] and leaves the old record intact.
pub struct FileStore {
    dir: PathBuf,
    writer: AtomicFileWriter,
    quota: Option<u64>,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        ensure_store_dir(&dir)?;
        Ok(Self {
            writer: AtomicFileWriter::new(dir.clone()),
            dir,
            quota: None,
        })
    }

    pub fn with_quota(mut self, quota: Option<u64>) -> Self {
        self.quota = quota;
        self
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(record_filename(key))
    }

    fn record_files(&self) -> Result<Vec<PathBuf>, StorageError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }

    fn used_bytes_except(&self, skip: &Path) -> Result<u64, StorageError> {
        let mut used = 0;
        for path in self.record_files()? {
            if path != skip {
                used += fs::metadata(&path)?.len();
            }
        }
        Ok(used)
    }

    fn read_record(path: &Path) -> Result<Record, StorageError> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| StorageError::Corrupt(e.to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.record_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let record = Self::read_record(&path)?;
        Ok((record.key == key).then_some(record.value))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let content = serde_json::to_string(&Record {
            key: key.to_string(),
            value: value.to_string(),
        })
        .map_err(|e| StorageError::Corrupt(e.to_string()))?;

        let filename = record_filename(key);
        if let Some(quota) = self.quota {
            let needed = self.used_bytes_except(&self.dir.join(&filename))? + content.len() as u64;
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        self.writer.write(&filename, &content)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.record_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        for path in self.record_files()? {
            match Self::read_record(&path) {
                Ok(record) => keys.push(record.key),
                Err(err) => {
                    // No key can address it, so it would hold quota forever.
                    explorer_warn!("removing unreadable record {:?}: {}", path, err);
                    if let Err(err) = fs::remove_file(&path) {
                        explorer_warn!("cannot remove {:?}: {}", path, err);
                    }
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
