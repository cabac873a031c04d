//! # Octopus-Ditto Protocol
//!
//! Wire definitions and MQTT topic scheme for Octopus devices.
//!
//! ## Messages
//!
//! - `OctopusOutboundMessage`: device → bridge, sensor readings or events
//! - `OctopusInboundMessage`: bridge → device, actions or configuration
//!
//! ## MQTT Topics
//!
//! Topic scheme: `octopus/v1/{tenant}/{device_id}/{telemetry|command}`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod messages;
pub mod topics;

pub use messages::{
    octopus_inbound_message, octopus_outbound_message, Action, Bme680Data, Configuration, Event,
    OctopusInboundMessage, OctopusOutboundMessage,
};
pub use topics::{BridgeTopic, TopicScheme};
