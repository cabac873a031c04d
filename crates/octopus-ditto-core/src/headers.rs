//! Ditto protocol headers.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Header key of the correlation id.
pub const CORRELATION_ID: &str = "correlation-id";
/// Header key of the content type.
pub const CONTENT_TYPE: &str = "content-type";
/// Header key of the response-required flag.
pub const RESPONSE_REQUIRED: &str = "response-required";

/// Content type of JSON merge patches (RFC 7396).
pub const APPLICATION_MERGE_PATCH_JSON: &str = "application/merge-patch+json";

/// Header bag of a protocol message.
///
/// Keys are case-insensitive and stored lower-case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DittoHeaders(BTreeMap<String, String>);

impl DittoHeaders {
    /// Empty headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a header value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(&key.to_ascii_lowercase()).map(String::as_str)
    }

    /// Set a header, replacing any previous value.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.0
            .insert(key.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Set a header only if it is not present yet.
    pub fn insert_if_absent(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.0
            .entry(key.as_ref().to_ascii_lowercase())
            .or_insert_with(|| value.into());
    }

    /// Copy every header from `other` that is not already set here.
    pub fn merge_absent<K, V>(&mut self, other: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in other {
            self.insert_if_absent(key, value);
        }
    }

    /// Builder-style variant of [`DittoHeaders::insert`].
    #[must_use]
    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// The correlation id, if any.
    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        self.get(CORRELATION_ID)
    }

    /// The content type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.get(CONTENT_TYPE)
    }

    /// Whether the sender expects a response.
    ///
    /// Defaults to `true` when the header is absent or not a boolean.
    #[must_use]
    pub fn is_response_required(&self) -> bool {
        !matches!(self.get(RESPONSE_REQUIRED), Some(v) if v.eq_ignore_ascii_case("false"))
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for DittoHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (key, value) in iter {
            headers.insert(key, value);
        }
        headers
    }
}

impl<'de> Deserialize<'de> for DittoHeaders {
    /// Non-string JSON values (e.g. `"response-required": false`) are kept as their JSON text.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(key, value)| match value {
                serde_json::Value::String(s) => (key, s),
                other => (key, other.to_string()),
            })
            .collect())
    }
}
