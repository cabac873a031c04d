//! MQTT topic scheme of the bridge.
//!
//! Topic structure:
//! - `octopus/v1/{tenant}/{device_id}/telemetry`: device → bridge (protobuf)
//! - `octopus/v1/{tenant}/{device_id}/command`: bridge → device (protobuf)
//! - `octopus/v1/{tenant}/ditto/inbound`: bridge → Ditto (protocol JSON)
//! - `octopus/v1/{tenant}/ditto/outbound`: Ditto → bridge (protocol JSON)
//!
//! Device ids contain `:` but never `/`, so they fit in a single topic level.

use serde::{Deserialize, Serialize};

/// Protocol version for topic scheme.
pub const PROTOCOL_VERSION: &str = "v1";

/// Topic level reserved for the Ditto side of the bridge.
const DITTO_LEVEL: &str = "ditto";

/// Topic scheme configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicScheme {
    /// Tenant identifier
    pub tenant: String,
    /// Topic prefix (default: "octopus")
    pub prefix: String,
}

impl Default for TopicScheme {
    fn default() -> Self {
        Self::new("default")
    }
}

impl TopicScheme {
    /// Create a new topic scheme with the given tenant.
    #[must_use]
    pub fn new(tenant: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            prefix: "octopus".to_string(),
        }
    }

    fn base(&self) -> String {
        format!("{}/{}/{}", self.prefix, PROTOCOL_VERSION, self.tenant)
    }

    /// Topic a device publishes its telemetry and events on.
    #[must_use]
    pub fn telemetry(&self, device_id: &str) -> String {
        format!("{}/{device_id}/telemetry", self.base())
    }

    /// Topic a device receives its commands on.
    #[must_use]
    pub fn command(&self, device_id: &str) -> String {
        format!("{}/{device_id}/command", self.base())
    }

    /// Topic the bridge publishes protocol messages for Ditto on.
    #[must_use]
    pub fn ditto_inbound(&self) -> String {
        format!("{}/{DITTO_LEVEL}/inbound", self.base())
    }

    /// Topic Ditto publishes protocol messages for devices on.
    #[must_use]
    pub fn ditto_outbound(&self) -> String {
        format!("{}/{DITTO_LEVEL}/outbound", self.base())
    }

    /// Wildcard subscription for the telemetry of all devices in the tenant.
    #[must_use]
    pub fn telemetry_wildcard(&self) -> String {
        format!("{}/+/telemetry", self.base())
    }

    /// Parse a topic to extract components.
    #[must_use]
    pub fn parse(&self, topic: &str) -> Option<BridgeTopic> {
        let expected_prefix = format!("{}/", self.base());
        let remainder = topic.strip_prefix(&expected_prefix)?;

        let (first, second) = remainder.split_once('/')?;
        if first.is_empty() || second.contains('/') {
            return None;
        }

        match (first, second) {
            (DITTO_LEVEL, "inbound") => Some(BridgeTopic::DittoInbound),
            (DITTO_LEVEL, "outbound") => Some(BridgeTopic::DittoOutbound),
            (DITTO_LEVEL, _) => None,
            (device_id, "telemetry") => Some(BridgeTopic::Telemetry(device_id.to_string())),
            (device_id, "command") => Some(BridgeTopic::Command(device_id.to_string())),
            _ => None,
        }
    }
}

/// Topics of the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeTopic {
    /// Device telemetry
    Telemetry(String),
    /// Device command
    Command(String),
    /// Protocol messages to Ditto
    DittoInbound,
    /// Protocol messages from Ditto
    DittoOutbound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_generation() {
        let scheme = TopicScheme::new("factory-a");
        let device_id = "org.eclipse.ditto:octopus";

        assert_eq!(
            scheme.telemetry(device_id),
            "octopus/v1/factory-a/org.eclipse.ditto:octopus/telemetry"
        );
        assert_eq!(
            scheme.command(device_id),
            "octopus/v1/factory-a/org.eclipse.ditto:octopus/command"
        );
        assert_eq!(scheme.ditto_inbound(), "octopus/v1/factory-a/ditto/inbound");
        assert_eq!(
            scheme.ditto_outbound(),
            "octopus/v1/factory-a/ditto/outbound"
        );
    }

    #[test]
    fn topic_parsing() {
        let scheme = TopicScheme::new("factory-a");

        assert_eq!(
            scheme.parse("octopus/v1/factory-a/ns:dev/telemetry"),
            Some(BridgeTopic::Telemetry("ns:dev".to_string()))
        );
        assert_eq!(
            scheme.parse("octopus/v1/factory-a/ns:dev/command"),
            Some(BridgeTopic::Command("ns:dev".to_string()))
        );
        assert_eq!(
            scheme.parse("octopus/v1/factory-a/ditto/outbound"),
            Some(BridgeTopic::DittoOutbound)
        );
    }

    #[test]
    fn foreign_topics_are_ignored() {
        let scheme = TopicScheme::new("factory-a");

        assert_eq!(scheme.parse("octopus/v1/factory-b/ns:dev/telemetry"), None);
        assert_eq!(scheme.parse("octopus/v1/factory-a/ns:dev/status"), None);
        assert_eq!(scheme.parse("octopus/v1/factory-a/ns:dev/telemetry/x"), None);
        assert_eq!(scheme.parse("octopus/v1/factory-a/ditto/other"), None);
    }

    #[test]
    fn wildcard_topic() {
        let scheme = TopicScheme::new("tenant1");
        assert_eq!(scheme.telemetry_wildcard(), "octopus/v1/tenant1/+/telemetry");
    }
}
