//! Capacity-bounded, append-only telemetry log.
//!
//! Appends are serialised by `writer`. Each append builds the next sequence
//! off to the side, persists it, and only then swaps it into `view`, so a
//! reader sees either the state before an append or the state after it.
//! A failed persist never reaches `view`.

use std::sync::{Arc, Mutex, RwLock};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace, warn};

use crate::backend::LogBackend;
use crate::errors::{SafeLock, SafeReadLock, SafeWriteLock, StoreError, StoreResult};
use crate::record::Record;

pub const DEFAULT_CAPACITY: usize = 500;

/// What to do when the durable copy exists but cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorruptPolicy {
    /// Refuse to start.
    #[default]
    Fail,
    /// Move the file aside and start from an empty log.
    Reset,
}

pub struct LogStore {
    backend: Box<dyn LogBackend>,
    capacity: usize,
    writer: Mutex<()>,
    view: RwLock<Arc<Vec<Record>>>,
}

impl LogStore {
    /// Load (or create) the durable log and build the in-memory view.
    pub fn open<B>(backend: B, capacity: usize, on_corrupt: CorruptPolicy) -> StoreResult<Self>
    where
        B: LogBackend + 'static,
    {
        if capacity == 0 {
            return Err(StoreError::config("capacity must be greater than zero"));
        }

        let loaded = match backend.load() {
            Ok(loaded) => loaded,
            Err(err @ StoreError::Corrupt { .. }) if on_corrupt == CorruptPolicy::Reset => {
                warn!(error = %err, "durable log is corrupt, starting empty");
                backend.quarantine()?;
                None
            }
            Err(err) => return Err(err),
        };

        let records = match loaded {
            Some(mut records) => {
                if records.len() > capacity {
                    let excess = records.len() - capacity;
                    records.drain(..excess);
                    info!(evicted = excess, "trimmed durable log to capacity");
                    backend.persist(&records)?;
                }
                records
            }
            None => {
                backend.persist(&[])?;
                info!(store = %backend.describe(), "created empty durable log");
                Vec::new()
            }
        };

        info!(
            store = %backend.describe(),
            count = records.len(),
            capacity,
            "log store ready"
        );

        Ok(Self {
            backend: Box::new(backend),
            capacity,
            writer: Mutex::new(()),
            view: RwLock::new(Arc::new(records)),
        })
    }

    /// Decode `body` as a JSON object and append it.
    pub fn append_raw(&self, body: &[u8]) -> StoreResult<()> {
        let record = Record::from_slice(body)?;
        self.append(record)
    }

    /// Stamp, append, trim to capacity and persist. The in-memory view only
    /// changes once the durable write has succeeded.
    pub fn append(&self, mut record: Record) -> StoreResult<()> {
        let _writer = self.writer.safe_lock()?;

        // Stamped under the writer lock so timestamps follow log order.
        record.stamp(Local::now());

        let current = Arc::clone(&*self.view.safe_read()?);
        let evicted = (current.len() + 1).saturating_sub(self.capacity);
        let mut next = Vec::with_capacity(current.len() + 1 - evicted);
        next.extend(current[evicted..].iter().cloned());
        next.push(record);

        if let Err(err) = self.backend.persist(&next) {
            error!(error = %err, "failed to persist telemetry log");
            return Err(err);
        }

        if evicted > 0 {
            trace!(evicted, "evicted oldest records");
        }
        let len = next.len();
        *self.view.safe_write()? = Arc::new(next);
        debug!(len, "record appended");
        Ok(())
    }

    /// The whole log, oldest first, as of a single instant.
    pub fn snapshot(&self) -> StoreResult<Arc<Vec<Record>>> {
        Ok(Arc::clone(&*self.view.safe_read()?))
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.view.safe_read()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }
}
