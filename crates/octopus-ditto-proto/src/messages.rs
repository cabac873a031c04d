//! Protobuf messages exchanged with Octopus devices.
//!
//! Equivalent schema:
//!
//! ```protobuf
//! message OctopusOutboundMessage {
//!   string device_id = 1;
//!   google.protobuf.Timestamp timestamp = 2;
//!   float current_voltage = 3;
//!   oneof payload {
//!     BME680Data data = 4;
//!     Event event = 5;
//!   }
//! }
//!
//! message BME680Data {
//!   double temperature = 1;
//!   double humidity = 2;
//!   double pressure = 3;
//!   double gas_resistance = 4;
//!   double altitude = 5;
//! }
//!
//! message Event {
//!   string name = 1;
//!   string payload = 2;
//! }
//!
//! message OctopusInboundMessage {
//!   string device_id = 1;
//!   oneof payload {
//!     Action action = 2;
//!     Configuration config = 3;
//!   }
//! }
//!
//! message Action {
//!   string name = 1;
//!   string payload = 2;
//!   bool requiring_response = 3;
//! }
//!
//! message Configuration {
//!   map<string, string> config_entry = 1;
//! }
//! ```

use prost::Message;
use std::collections::BTreeMap;

/// Message sent by a device: sensor readings or an event.
#[derive(Clone, PartialEq, Message)]
pub struct OctopusOutboundMessage {
    /// Device identifier (`namespace:name`)
    #[prost(string, tag = "1")]
    pub device_id: String,
    /// Device-side timestamp
    #[prost(message, optional, tag = "2")]
    pub timestamp: Option<prost_types::Timestamp>,
    /// Supply voltage, single precision
    #[prost(float, tag = "3")]
    pub current_voltage: f32,
    /// Payload kind
    #[prost(oneof = "octopus_outbound_message::Payload", tags = "4, 5")]
    pub payload: Option<octopus_outbound_message::Payload>,
}

/// Nested types of [`OctopusOutboundMessage`].
pub mod octopus_outbound_message {
    /// Payload of a device message.
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Payload {
        /// BME680 environmental readings
        #[prost(message, tag = "4")]
        Data(super::Bme680Data),
        /// Asynchronous device event
        #[prost(message, tag = "5")]
        Event(super::Event),
    }
}

/// BME680 environmental sensor readings.
#[derive(Clone, PartialEq, Message)]
pub struct Bme680Data {
    /// Temperature in °C
    #[prost(double, tag = "1")]
    pub temperature: f64,
    /// Relative humidity in %
    #[prost(double, tag = "2")]
    pub humidity: f64,
    /// Pressure in hPa
    #[prost(double, tag = "3")]
    pub pressure: f64,
    /// Gas resistance in kΩ
    #[prost(double, tag = "4")]
    pub gas_resistance: f64,
    /// Altitude in m
    #[prost(double, tag = "5")]
    pub altitude: f64,
}

/// Named device event with an opaque payload.
#[derive(Clone, PartialEq, Message)]
pub struct Event {
    /// Event name
    #[prost(string, tag = "1")]
    pub name: String,
    /// Opaque payload
    #[prost(string, tag = "2")]
    pub payload: String,
}

/// Message sent to a device: an action or a configuration update.
#[derive(Clone, PartialEq, Message)]
pub struct OctopusInboundMessage {
    /// Device identifier (`namespace:name`)
    #[prost(string, tag = "1")]
    pub device_id: String,
    /// Payload kind
    #[prost(oneof = "octopus_inbound_message::Payload", tags = "2, 3")]
    pub payload: Option<octopus_inbound_message::Payload>,
}

/// Nested types of [`OctopusInboundMessage`].
pub mod octopus_inbound_message {
    /// Payload of a device command.
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Payload {
        /// Action to perform
        #[prost(message, tag = "2")]
        Action(super::Action),
        /// Configuration to apply
        #[prost(message, tag = "3")]
        Config(super::Configuration),
    }
}

/// Action the device should perform.
#[derive(Clone, PartialEq, Message)]
pub struct Action {
    /// Action name
    #[prost(string, tag = "1")]
    pub name: String,
    /// Action payload
    #[prost(string, tag = "2")]
    pub payload: String,
    /// Whether the sender waits for a response
    #[prost(bool, tag = "3")]
    pub requiring_response: bool,
}

/// Configuration entries for the device.
#[derive(Clone, PartialEq, Message)]
pub struct Configuration {
    /// Key/value configuration
    #[prost(btree_map = "string, string", tag = "1")]
    pub config_entry: BTreeMap<String, String>,
}

impl OctopusOutboundMessage {
    /// Create a sensor reading message.
    #[must_use]
    pub fn sensor_reading(
        device_id: impl Into<String>,
        timestamp: Option<prost_types::Timestamp>,
        current_voltage: f32,
        data: Bme680Data,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            timestamp,
            current_voltage,
            payload: Some(octopus_outbound_message::Payload::Data(data)),
        }
    }

    /// Create an event message.
    #[must_use]
    pub fn event(
        device_id: impl Into<String>,
        timestamp: Option<prost_types::Timestamp>,
        name: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            timestamp,
            current_voltage: 0.0,
            payload: Some(octopus_outbound_message::Payload::Event(Event {
                name: name.into(),
                payload: payload.into(),
            })),
        }
    }

    /// Decode from protobuf bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not a valid message.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, prost::DecodeError> {
        Self::decode(bytes)
    }
}

impl OctopusInboundMessage {
    /// Create an action message.
    #[must_use]
    pub fn action(device_id: impl Into<String>, action: Action) -> Self {
        Self {
            device_id: device_id.into(),
            payload: Some(octopus_inbound_message::Payload::Action(action)),
        }
    }

    /// Create a configuration message.
    #[must_use]
    pub fn configuration(
        device_id: impl Into<String>,
        config_entry: BTreeMap<String, String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            payload: Some(octopus_inbound_message::Payload::Config(Configuration {
                config_entry,
            })),
        }
    }

    /// Decode from protobuf bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not a valid message.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, prost::DecodeError> {
        Self::decode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_without_payload_decodes_to_none() {
        let message = OctopusOutboundMessage {
            device_id: "ns:octopus".to_string(),
            ..Default::default()
        };

        let decoded = OctopusOutboundMessage::from_bytes(&message.encode_to_vec()).unwrap();
        assert_eq!(decoded.device_id, "ns:octopus");
        assert!(decoded.payload.is_none());
        assert!(decoded.timestamp.is_none());
    }

    #[test]
    fn voltage_stays_single_precision() {
        let message = OctopusOutboundMessage::sensor_reading(
            "ns:octopus",
            None,
            3.3,
            Bme680Data::default(),
        );

        // key (1 byte) + fixed32 for the float
        let bytes = message.encode_to_vec();
        assert!(bytes.windows(5).any(|w| w[0] == 0x1d && w[1..] == 3.3f32.to_le_bytes()));
    }

    #[test]
    fn event_decodes() {
        let message = OctopusOutboundMessage::event(
            "ns:octopus",
            Some(prost_types::Timestamp {
                seconds: 1_700_000_000,
                nanos: 42,
            }),
            "call-fire-department",
            "smoke detected",
        );

        let decoded = OctopusOutboundMessage::from_bytes(&message.encode_to_vec()).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn configuration_entries_encode_in_key_order() {
        let entries: BTreeMap<String, String> = [("b", "2"), ("a", "1")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let first = OctopusInboundMessage::configuration("ns:octopus", entries.clone());
        let second = OctopusInboundMessage::configuration("ns:octopus", entries);

        assert_eq!(first.encode_to_vec(), second.encode_to_vec());
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(OctopusOutboundMessage::from_bytes(&[0xff, 0xff, 0xff]).is_err());
    }
}
