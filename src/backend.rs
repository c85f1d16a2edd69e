//! Durable representations of the telemetry log.
//!
//! A backend only knows how to load and persist the whole sequence; the
//! capacity policy and the concurrency discipline live in `LogStore`.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use tracing::{debug, warn};

use crate::errors::{SafeLock, StoreError, StoreResult};
use crate::record::Record;

pub trait LogBackend: Send + Sync {
    /// Read the durable copy. `Ok(None)` means none exists yet.
    fn load(&self) -> StoreResult<Option<Vec<Record>>>;

    /// Replace the durable copy with `records`. Must be all-or-nothing.
    fn persist(&self, records: &[Record]) -> StoreResult<()>;

    /// Move an unusable durable copy aside so a fresh one can be written.
    fn quarantine(&self) -> StoreResult<Option<PathBuf>>;

    fn describe(&self) -> String;
}

/// A single JSON array on disk, rewritten in full on every persist.
///
/// Writes go to a sibling `.tmp` file which is synced and then renamed over
/// the log, so a crash mid-write leaves the previous copy intact.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "logs.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl LogBackend for JsonFileBackend {
    fn load(&self) -> StoreResult<Option<Vec<Record>>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::unreadable(&self.path, e)),
        };
        let records: Vec<Record> =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::corrupt(&self.path, e))?;
        debug!(path = %self.path.display(), count = records.len(), "loaded durable log");
        Ok(Some(records))
    }

    fn persist(&self, records: &[Record]) -> StoreResult<()> {
        let encoded = serde_json::to_vec(records)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| StoreError::persist("creating log directory", e))?;
            }
        }

        let tmp = self.temp_path();
        let written = File::create(&tmp)
            .and_then(|mut file| {
                file.write_all(&encoded)?;
                file.sync_all()
            })
            .map_err(|e| StoreError::persist("writing temp file", e))
            .and_then(|()| {
                fs::rename(&tmp, &self.path)
                    .map_err(|e| StoreError::persist("replacing log file", e))
            });

        if written.is_err() {
            // Best effort; the original log is still in place.
            let _ = fs::remove_file(&tmp);
        }
        written
    }

    fn quarantine(&self) -> StoreResult<Option<PathBuf>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "logs.json".into());
        name.push(format!(".corrupt-{}", Local::now().format("%Y%m%dT%H%M%S")));
        let target = self.path.with_file_name(name);
        fs::rename(&self.path, &target)
            .map_err(|e| StoreError::persist("moving corrupt log aside", e))?;
        warn!(from = %self.path.display(), to = %target.display(), "quarantined corrupt log");
        Ok(Some(target))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Volatile backend: the log lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<Option<Vec<Record>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: Mutex::new(Some(records)),
        }
    }
}

impl LogBackend for MemoryBackend {
    fn load(&self) -> StoreResult<Option<Vec<Record>>> {
        Ok(self.records.safe_lock()?.clone())
    }

    fn persist(&self, records: &[Record]) -> StoreResult<()> {
        *self.records.safe_lock()? = Some(records.to_vec());
        Ok(())
    }

    fn quarantine(&self) -> StoreResult<Option<PathBuf>> {
        self.records.safe_lock()?.take();
        Ok(None)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample(tag: u32) -> Record {
        Record::from_value(json!({"state": "NORMAL", "tag": tag})).unwrap()
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("logs.json"));
        assert!(backend.load().unwrap().is_none());
    }

    #[test]
    fn persist_then_load_preserves_order() {
        let dir = tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("nested").join("logs.json"));
        let records = vec![sample(1), sample(2), sample(3)];

        backend.persist(&records).unwrap();

        assert_eq!(backend.load().unwrap(), Some(records));
        assert!(!backend.temp_path().exists());
    }

    #[test]
    fn file_holds_a_plain_json_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs.json");
        let backend = JsonFileBackend::new(&path);

        backend.persist(&[sample(7)]).unwrap();

        let on_disk: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, json!([{"state": "NORMAL", "tag": 7}]));
    }

    #[test]
    fn garbage_file_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs.json");
        fs::write(&path, b"{not an array").unwrap();

        let err = JsonFileBackend::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn array_of_scalars_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs.json");
        fs::write(&path, b"[1, 2, 3]").unwrap();

        let err = JsonFileBackend::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn quarantine_moves_file_aside() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs.json");
        fs::write(&path, b"garbage").unwrap();
        let backend = JsonFileBackend::new(&path);

        let moved = backend.quarantine().unwrap().expect("file was present");

        assert!(!path.exists());
        assert!(moved.exists());
        assert!(moved
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("logs.json.corrupt-"));
    }

    #[test]
    fn persist_fails_when_directory_is_a_file() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("data");
        fs::write(&blocker, b"").unwrap();
        let backend = JsonFileBackend::new(blocker.join("logs.json"));

        let err = backend.persist(&[sample(1)]).unwrap_err();
        assert!(matches!(err, StoreError::PersistFailure { .. }));
    }

    #[test]
    fn memory_backend_round_trips() {
        let backend = MemoryBackend::new();
        assert!(backend.load().unwrap().is_none());

        backend.persist(&[sample(1), sample(2)]).unwrap();
        assert_eq!(backend.load().unwrap().map(|r| r.len()), Some(2));
    }
}
