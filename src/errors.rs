//! Error types for the telemetry log store.
//!
//! Every failure the store can produce is a `StoreError`. The HTTP layer
//! converts these into responses through `api_errors::AppError`.

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by `LogStore` and its durable backends.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("malformed record: {reason}")]
    Malformed { reason: String },

    #[error("persist failed: {operation}: {source}")]
    PersistFailure {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode log: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },

    #[error("durable log at {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("durable log at {} cannot be read: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("lock poisoned: {resource}")]
    LockPoisoned { resource: String },

    #[error("configuration error: {message}")]
    Config { message: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Create a malformed-input error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    /// Create a persistence error
    pub fn persist(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::PersistFailure {
            operation: operation.into(),
            source,
        }
    }

    pub fn corrupt(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Corrupt {
            path: path.into(),
            source,
        }
    }

    pub fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Unreadable {
            path: path.into(),
            source,
        }
    }

    pub fn poisoned(resource: impl Into<String>) -> Self {
        Self::LockPoisoned {
            resource: resource.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// True when the caller sent something the store refuses to accept.
    pub fn is_client_error(&self) -> bool {
        matches!(self, StoreError::Malformed { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Encode { source: err }
    }
}

/// Lock a mutex, mapping poison to `StoreError::LockPoisoned`.
pub trait SafeLock<T: ?Sized> {
    fn safe_lock(&self) -> StoreResult<std::sync::MutexGuard<'_, T>>;
}

impl<T: ?Sized> SafeLock<T> for std::sync::Mutex<T> {
    fn safe_lock(&self) -> StoreResult<std::sync::MutexGuard<'_, T>> {
        self.lock().map_err(|_| StoreError::poisoned("log_writer"))
    }
}

/// Read side of an `RwLock`, mapping poison to `StoreError::LockPoisoned`.
pub trait SafeReadLock<T: ?Sized> {
    fn safe_read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, T>>;
}

impl<T: ?Sized> SafeReadLock<T> for std::sync::RwLock<T> {
    fn safe_read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, T>> {
        self.read().map_err(|_| StoreError::poisoned("log_view_read"))
    }
}

/// Write side of an `RwLock`, mapping poison to `StoreError::LockPoisoned`.
pub trait SafeWriteLock<T: ?Sized> {
    fn safe_write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, T>>;
}

impl<T: ?Sized> SafeWriteLock<T> for std::sync::RwLock<T> {
    fn safe_write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, T>> {
        self.write().map_err(|_| StoreError::poisoned("log_view_write"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn malformed_is_a_client_error() {
        let err = StoreError::malformed("expected a JSON object");
        assert!(err.is_client_error());
        assert!(err.to_string().contains("expected a JSON object"));
    }

    #[test]
    fn persist_failure_keeps_its_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = StoreError::persist("rename temp file", io_err);

        assert!(!err.is_client_error());
        assert!(err.source().is_some());
        assert!(err.to_string().contains("rename temp file"));
    }

    #[test]
    fn poisoned_mutex_maps_to_lock_error() {
        let lock = std::sync::Arc::new(std::sync::Mutex::new(0u8));
        let cloned = lock.clone();
        let _ = std::thread::spawn(move || {
            let _guard = cloned.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        match lock.safe_lock() {
            Err(StoreError::LockPoisoned { resource }) => assert_eq!(resource, "log_writer"),
            other => panic!("unexpected result: {other:?}"),
        };
    }
}
