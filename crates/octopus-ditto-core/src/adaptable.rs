//! Protocol messages ("Adaptables") and their JSON envelope.
//!
//! Wire form:
//!
//! ```json
//! {
//!   "topic": "org.eclipse.ditto/thing-1/things/twin/commands/merge",
//!   "headers": { "content-type": "application/merge-patch+json" },
//!   "path": "/features",
//!   "value": { "temperature": { "properties": { "value": 24.2 } } }
//! }
//! ```

use crate::headers::DittoHeaders;
use crate::topic::{TopicError, TopicPath};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of a protocol message.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    /// JSON pointer of the affected sub-resource, always starting with `/`
    pub path: String,
    /// Optional value
    pub value: Option<Value>,
    /// Optional timestamp of the message
    pub timestamp: Option<DateTime<Utc>>,
    /// Optional HTTP-like status (responses only)
    pub status: Option<u16>,
}

impl Payload {
    /// Create a payload for the given path.
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self {
            path: normalize_pointer(path),
            value: None,
            timestamp: None,
            status: None,
        }
    }

    /// Set the value.
    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Set the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// A Ditto protocol message: topic, headers and payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Adaptable {
    /// Topic path
    pub topic_path: TopicPath,
    /// Headers
    pub headers: DittoHeaders,
    /// Payload
    pub payload: Payload,
}

impl Adaptable {
    /// Create a new adaptable.
    #[must_use]
    pub fn new(topic_path: TopicPath, headers: DittoHeaders, payload: Payload) -> Self {
        Self {
            topic_path,
            headers,
            payload,
        }
    }

    /// Serialize to the JSON envelope.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let envelope = Envelope {
            topic: self.topic_path.to_string(),
            headers: self.headers.clone(),
            path: self.payload.path.clone(),
            value: self.payload.value.clone(),
            timestamp: self.payload.timestamp,
            status: self.payload.status,
        };
        // Envelope only holds strings, maps and JSON values.
        serde_json::to_value(envelope).unwrap_or(Value::Null)
    }

    /// Serialize to a compact JSON string.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }

    /// Parse from a JSON envelope value.
    ///
    /// # Errors
    ///
    /// Returns error if the envelope is malformed or the topic is invalid.
    pub fn from_json(value: Value) -> Result<Self, ProtocolError> {
        let envelope: Envelope =
            serde_json::from_value(value).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
        Self::from_envelope(envelope)
    }

    /// Parse from JSON envelope bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not a valid envelope.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let envelope: Envelope =
            serde_json::from_slice(bytes).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
        Self::from_envelope(envelope)
    }

    fn from_envelope(envelope: Envelope) -> Result<Self, ProtocolError> {
        let topic_path = envelope.topic.parse()?;
        Ok(Self {
            topic_path,
            headers: envelope.headers,
            payload: Payload {
                path: normalize_pointer(&envelope.path),
                value: envelope.value,
                timestamp: envelope.timestamp,
                status: envelope.status,
            },
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    topic: String,
    #[serde(default)]
    headers: DittoHeaders,
    #[serde(default = "root_pointer")]
    path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
}

fn root_pointer() -> String {
    "/".to_string()
}

/// Normalize a JSON pointer: leading `/`, no trailing `/` except for the root.
#[must_use]
pub fn normalize_pointer(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    format!("/{trimmed}")
}

/// Format a JSON value as a plain string.
///
/// Strings are returned without quotes; every other value as compact JSON.
///
/// # Examples
///
/// ```
/// use octopus_ditto_core::format_as_string;
/// use serde_json::json;
///
/// assert_eq!(format_as_string(&json!("on")), "on");
/// assert_eq!(format_as_string(&json!(42)), "42");
/// assert_eq!(format_as_string(&json!(true)), "true");
/// assert_eq!(format_as_string(&json!({"a": 1})), r#"{"a":1}"#);
/// ```
#[must_use]
pub fn format_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Errors for protocol message (de)serialization.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProtocolError {
    /// Envelope is not valid JSON or misses required fields
    #[error("invalid protocol JSON: {0}")]
    InvalidJson(String),
    /// Topic is malformed
    #[error(transparent)]
    Topic(#[from] TopicError),
}
