//! The bidirectional message mapper contract.

use crate::external::ExternalMessage;
use octopus_ditto_core::{Adaptable, DittoHeaders, ThingIdError};

/// Maps between transport messages and Ditto protocol messages.
///
/// Implementations hold no mutable state, so one instance can serve any
/// number of connections concurrently.
pub trait MessageMapper: Send + Sync {
    /// Name the mapper is registered under.
    fn alias(&self) -> &'static str;

    /// Whether the mapper refuses to run without explicit configuration.
    fn is_configuration_mandatory(&self) -> bool;

    /// Map a message received from a device to protocol messages.
    ///
    /// An unrecognised message yields an empty vector.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::MappingFailed`] if the payload cannot be decoded.
    fn map_inbound(&self, message: &ExternalMessage) -> Result<Vec<Adaptable>, MappingError>;

    /// Map a protocol message to messages for a device.
    ///
    /// A protocol message of an unrecognised shape yields an empty vector.
    fn map_outbound(&self, adaptable: &Adaptable) -> Vec<ExternalMessage>;

    /// Extra headers to attach to every inbound protocol message.
    fn additional_inbound_headers(&self, _message: &ExternalMessage) -> DittoHeaders {
        DittoHeaders::new()
    }
}

/// Errors raised while mapping.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// The message could not be mapped
    #[error("mapping failed for content type '{content_type}': {cause}")]
    MappingFailed {
        /// Declared content type, `?` if none
        content_type: String,
        /// Underlying failure
        #[source]
        cause: MappingFailure,
    },
}

impl MappingError {
    /// Build a mapping failure for the given message.
    #[must_use]
    pub fn mapping_failed(message: &ExternalMessage, cause: impl Into<MappingFailure>) -> Self {
        Self::MappingFailed {
            content_type: message.content_type().unwrap_or("?").to_string(),
            cause: cause.into(),
        }
    }
}

/// Causes of a [`MappingError::MappingFailed`].
#[derive(Debug, thiserror::Error)]
pub enum MappingFailure {
    /// Payload is not a valid protobuf message
    #[error("protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),
    /// Message carries neither bytes nor text
    #[error("message has no payload")]
    NoPayload,
    /// Device id is not a valid thing id
    #[error(transparent)]
    DeviceId(#[from] ThingIdError),
    /// Event has an empty name, which is not a valid message subject
    #[error("event has no name")]
    EmptyEventName,
    /// Device timestamp cannot be represented
    #[error("timestamp out of range: {seconds}s {nanos}ns")]
    Timestamp {
        /// Seconds since epoch
        seconds: i64,
        /// Nanoseconds
        nanos: i32,
    },
}
