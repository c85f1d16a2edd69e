//! One telemetry snapshot as submitted by the device.
//!
//! A `Record` is any JSON object. The well-known fields (`state`, `left`,
//! `center`, `right`, `invalidRatio`, `stability`, `fps`) have typed
//! accessors, everything else is carried through untouched. `timestamp` is
//! always assigned by the server.

use chrono::{DateTime, Local, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{StoreError, StoreResult};

pub const FIELD_STATE: &str = "state";
pub const FIELD_LEFT: &str = "left";
pub const FIELD_CENTER: &str = "center";
pub const FIELD_RIGHT: &str = "right";
pub const FIELD_INVALID_RATIO: &str = "invalidRatio";
pub const FIELD_STABILITY: &str = "stability";
pub const FIELD_FPS: &str = "fps";
pub const FIELD_TIMESTAMP: &str = "timestamp";

/// `HH:MM:SS.mmm`
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S%.3f";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Decode a request body. Anything other than a JSON object is rejected.
    pub fn from_slice(body: &[u8]) -> StoreResult<Self> {
        if body.is_empty() {
            return Err(StoreError::malformed("empty body"));
        }
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| StoreError::malformed(format!("invalid JSON: {e}")))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> StoreResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(StoreError::malformed(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Overwrite `timestamp` with the wall-clock time of `now`, truncated to
    /// milliseconds. Any client-supplied value is discarded.
    pub fn stamp(&mut self, now: DateTime<Local>) {
        let truncated = now
            .with_nanosecond(now.nanosecond() / 1_000_000 * 1_000_000)
            .unwrap_or(now);
        self.fields.insert(
            FIELD_TIMESTAMP.to_string(),
            Value::String(truncated.format(TIMESTAMP_FORMAT).to_string()),
        );
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.fields.get(FIELD_TIMESTAMP).and_then(Value::as_str)
    }

    pub fn state(&self) -> Option<&str> {
        self.fields.get(FIELD_STATE).and_then(Value::as_str)
    }

    /// Numeric field lookup; `None` when absent or not a number.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(Value::as_f64)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Dashboard-style line: `12:00:01.250 [NORMAL] L:1.20 C:0.80 R:1.50`.
    pub fn summary_line(&self) -> String {
        let metric = |name: &str| {
            self.metric(name)
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| "-".to_string())
        };
        format!(
            "{} [{}] L:{} C:{} R:{}",
            self.timestamp().unwrap_or("--:--:--.---"),
            self.state().unwrap_or("UNKNOWN"),
            metric(FIELD_LEFT),
            metric(FIELD_CENTER),
            metric(FIELD_RIGHT),
        )
    }
}

/// True if `value` is a well-formed `HH:MM:SS.mmm` timestamp.
pub fn is_valid_timestamp(value: &str) -> bool {
    value.len() == 12 && NaiveTime::parse_from_str(value, TIMESTAMP_FORMAT).is_ok()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
