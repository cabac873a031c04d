//! Transport-facing messages exchanged with brokers.

use octopus_ditto_core::headers::CONTENT_TYPE;
use octopus_ditto_core::TopicPath;
use std::collections::BTreeMap;

/// Payload of an external message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalPayload {
    /// Binary payload
    Bytes(Vec<u8>),
    /// Text payload
    Text(String),
}

/// A message as received from or sent to a broker.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExternalMessage {
    /// Transport headers (keys lower-case)
    pub headers: BTreeMap<String, String>,
    /// Payload, if any
    pub payload: Option<ExternalPayload>,
    /// Topic of the protocol message this was mapped from (outbound only)
    pub topic_path: Option<TopicPath>,
}

impl ExternalMessage {
    /// Create a message with a binary payload.
    #[must_use]
    pub fn bytes(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: Some(ExternalPayload::Bytes(payload.into())),
            ..Self::default()
        }
    }

    /// Create a message with a text payload.
    #[must_use]
    pub fn text(payload: impl Into<String>) -> Self {
        Self {
            payload: Some(ExternalPayload::Text(payload.into())),
            ..Self::default()
        }
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.insert(key.to_ascii_lowercase(), value.into());
        self
    }

    /// Replace all headers.
    #[must_use]
    pub fn with_headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        self.headers = headers
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
            .collect();
        self
    }

    /// Set the topic path.
    #[must_use]
    pub fn with_topic_path(mut self, topic_path: TopicPath) -> Self {
        self.topic_path = Some(topic_path);
        self
    }

    /// The declared content type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).map(String::as_str)
    }

    /// The binary payload, if the payload is binary.
    #[must_use]
    pub fn byte_payload(&self) -> Option<&[u8]> {
        match &self.payload {
            Some(ExternalPayload::Bytes(bytes)) => Some(bytes),
            _ => None,
        }
    }

    /// The text payload, if the payload is text.
    #[must_use]
    pub fn text_payload(&self) -> Option<&str> {
        match &self.payload {
            Some(ExternalPayload::Text(text)) => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_keys_are_lowercased() {
        let message = ExternalMessage::bytes(vec![1, 2])
            .with_header("Content-Type", "application/octet-stream");

        assert_eq!(message.content_type(), Some("application/octet-stream"));
        assert_eq!(message.byte_payload(), Some(&[1u8, 2][..]));
        assert_eq!(message.text_payload(), None);
    }

    #[test]
    fn with_headers_replaces_existing() {
        let message = ExternalMessage::text("hi")
            .with_header("a", "1")
            .with_headers([("B", "2")]);

        assert_eq!(message.headers.len(), 1);
        assert_eq!(message.headers.get("b").map(String::as_str), Some("2"));
    }
}
