//! Ditto → device translation.
//!
//! Only two shapes reach the device:
//! - messages (criterion `messages`) become an `Action`
//! - commands on `/features/configuration` become a `Configuration`
//!
//! Everything else is dropped.

use crate::external::ExternalMessage;
use octopus_ditto_core::{format_as_string, Adaptable, Criterion};
use octopus_ditto_proto::{Action, OctopusInboundMessage};
use prost::Message;
use serde_json::Value;
use std::collections::BTreeMap;

/// Path of the feature holding device configuration.
pub const CONFIGURATION_PATH: &str = "/features/configuration";

/// Map a protocol message to device messages.
#[must_use]
pub fn map_outbound(adaptable: &Adaptable) -> Vec<ExternalMessage> {
    let topic_path = &adaptable.topic_path;

    let device_message = if topic_path.is_criterion(Criterion::Messages) {
        Some(action_message(adaptable))
    } else if topic_path.is_criterion(Criterion::Commands)
        && adaptable.payload.path == CONFIGURATION_PATH
    {
        Some(configuration_message(adaptable))
    } else {
        None
    };

    device_message
        .map(|device_message| {
            ExternalMessage::bytes(device_message.encode_to_vec())
                .with_headers(adaptable.headers.iter())
                .with_topic_path(topic_path.clone())
        })
        .into_iter()
        .collect()
}

fn action_message(adaptable: &Adaptable) -> OctopusInboundMessage {
    let topic_path = &adaptable.topic_path;
    let payload = adaptable
        .payload
        .value
        .as_ref()
        .map_or_else(|| format_as_string(&Value::Null), format_as_string);

    OctopusInboundMessage::action(
        topic_path.thing_id().to_string(),
        Action {
            name: topic_path.subject.clone().unwrap_or_default(),
            payload,
            requiring_response: adaptable.headers.is_response_required(),
        },
    )
}

fn configuration_message(adaptable: &Adaptable) -> OctopusInboundMessage {
    let config_entry: BTreeMap<String, String> = adaptable
        .payload
        .value
        .as_ref()
        .and_then(|value| value.get("properties"))
        .and_then(Value::as_object)
        .map(|properties| {
            properties
                .iter()
                .map(|(key, value)| (key.clone(), format_as_string(value)))
                .collect()
        })
        .unwrap_or_default();

    OctopusInboundMessage::configuration(adaptable.topic_path.thing_id().to_string(), config_entry)
}
