//! Library root for the `telemetry_sink` crate: a bounded, durable telemetry
//! log with an HTTP ingestion endpoint and a polling dashboard.

// Error handling
pub mod api_errors;
pub mod errors;

// Log storage
pub mod backend;
pub mod log_store;
pub mod record;

// Configuration & CLI
pub mod cli;
pub mod config_loader;
pub mod logging;

// Web server interface
pub mod app_state;
pub mod dashboard;
pub mod ingest_server;
pub mod netinfo;

pub use errors::{StoreError, StoreResult};
pub use log_store::{CorruptPolicy, LogStore, DEFAULT_CAPACITY};
pub use record::Record;
