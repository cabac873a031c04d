//! Protobuf mapper for Octopus boards.

use crate::external::ExternalMessage;
use crate::inbound::map_inbound;
use crate::mapper::{MappingError, MessageMapper};
use crate::outbound::map_outbound;
use octopus_ditto_core::headers::CORRELATION_ID;
use octopus_ditto_core::Adaptable;

/// Alias the Octopus mapper is registered under.
pub const MAPPER_ALIAS: &str = "CustomOctopusProtobuf";

/// Maps Octopus protobuf payloads from/to Ditto protocol messages.
///
/// Stateless and needs no configuration; copies are interchangeable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OctopusProtobufMapper;

impl OctopusProtobufMapper {
    /// Create a new mapper.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MessageMapper for OctopusProtobufMapper {
    fn alias(&self) -> &'static str {
        MAPPER_ALIAS
    }

    fn is_configuration_mandatory(&self) -> bool {
        false
    }

    fn map_inbound(&self, message: &ExternalMessage) -> Result<Vec<Adaptable>, MappingError> {
        tracing::debug!(
            alias = MAPPER_ALIAS,
            correlation_id = ?message.headers.get(CORRELATION_ID),
            content_type = ?message.content_type(),
            "Mapping received external message"
        );

        let adaptables = map_inbound(message)?;

        tracing::debug!(
            alias = MAPPER_ALIAS,
            count = adaptables.len(),
            topics = ?adaptables.iter().map(|a| a.topic_path.to_string()).collect::<Vec<_>>(),
            "Mapped external message to adaptables"
        );
        Ok(adaptables)
    }

    fn map_outbound(&self, adaptable: &Adaptable) -> Vec<ExternalMessage> {
        tracing::debug!(
            alias = MAPPER_ALIAS,
            correlation_id = ?adaptable.headers.correlation_id(),
            topic = %adaptable.topic_path,
            path = %adaptable.payload.path,
            "Mapping outbound adaptable"
        );

        let messages = map_outbound(adaptable);

        tracing::debug!(
            alias = MAPPER_ALIAS,
            count = messages.len(),
            "Mapped adaptable to external messages"
        );
        messages
    }
}
