//! Device → Ditto translation.
//!
//! - Sensor readings become a twin merge command on `/features`.
//! - Events become a live message on `/features/temperature/outbox/messages/{name}`.
//! - Messages without a payload kind map to nothing.

use crate::charset::{encode_text, Charset};
use crate::external::{ExternalMessage, ExternalPayload};
use crate::mapper::{MappingError, MappingFailure};
use chrono::{DateTime, TimeZone, Utc};
use octopus_ditto_core::headers::{APPLICATION_MERGE_PATCH_JSON, CONTENT_TYPE};
use octopus_ditto_core::{Adaptable, DittoHeaders, Payload, ThingId, TopicPath};
use octopus_ditto_proto::octopus_outbound_message::Payload as DevicePayload;
use octopus_ditto_proto::{Bme680Data, Event, OctopusOutboundMessage};
use serde_json::json;

const NANOS_PER_SECOND: i32 = 1_000_000_000;

/// Path all sensor readings are merged into.
pub const FEATURES_PATH: &str = "/features";

/// Map a device message to protocol messages.
///
/// # Errors
///
/// Returns [`MappingError::MappingFailed`] if the payload is missing or not a
/// valid device message, if its device id or timestamp is unusable, or if an
/// event has no name to use as message subject.
pub fn map_inbound(message: &ExternalMessage) -> Result<Vec<Adaptable>, MappingError> {
    let device_message = decode(message)?;

    let Some(payload) = device_message.payload else {
        return Ok(Vec::new());
    };

    let thing_id: ThingId = device_message
        .device_id
        .parse()
        .map_err(|e| MappingError::mapping_failed(message, MappingFailure::DeviceId(e)))?;

    let adaptable = match payload {
        DevicePayload::Data(data) => {
            sensor_reading_adaptable(message, &thing_id, device_message.current_voltage, &data)
        }
        DevicePayload::Event(event) => {
            if event.name.is_empty() {
                return Err(MappingError::mapping_failed(
                    message,
                    MappingFailure::EmptyEventName,
                ));
            }
            let timestamp = device_timestamp(device_message.timestamp.as_ref())
                .map_err(|cause| MappingError::mapping_failed(message, cause))?;
            event_adaptable(message, &thing_id, timestamp, event)
        }
    };

    Ok(vec![adaptable])
}

/// Decode the protobuf envelope from a bytes or text payload.
fn decode(message: &ExternalMessage) -> Result<OctopusOutboundMessage, MappingError> {
    let decoded = match &message.payload {
        Some(ExternalPayload::Bytes(bytes)) => OctopusOutboundMessage::from_bytes(bytes),
        Some(ExternalPayload::Text(text)) => {
            let charset = Charset::from_content_type(message.content_type());
            OctopusOutboundMessage::from_bytes(&encode_text(text, charset))
        }
        None => return Err(MappingError::mapping_failed(message, MappingFailure::NoPayload)),
    };

    decoded.map_err(|e| MappingError::mapping_failed(message, e))
}

fn sensor_reading_adaptable(
    message: &ExternalMessage,
    thing_id: &ThingId,
    current_voltage: f32,
    data: &Bme680Data,
) -> Adaptable {
    let mut headers = DittoHeaders::new().with(CONTENT_TYPE, APPLICATION_MERGE_PATCH_JSON);
    headers.merge_absent(&message.headers);

    let value = json!({
        "voltage": { "properties": { "value": current_voltage } },
        "temperature": { "properties": { "value": data.temperature } },
        "humidity": { "properties": { "value": data.humidity } },
        "pressure": { "properties": { "value": data.pressure } },
        "gas_resistance": { "properties": { "value": data.gas_resistance } },
        "altitude": { "properties": { "value": data.altitude } },
    });

    Adaptable::new(
        TopicPath::twin_merge_command(thing_id),
        headers,
        Payload::new(FEATURES_PATH).with_value(value),
    )
}

fn event_adaptable(
    message: &ExternalMessage,
    thing_id: &ThingId,
    timestamp: DateTime<Utc>,
    event: Event,
) -> Adaptable {
    let headers: DittoHeaders = message.headers.iter().collect();
    let path = format!("/features/temperature/outbox/messages/{}", event.name);

    Adaptable::new(
        TopicPath::live_message(thing_id, event.name),
        headers,
        Payload::new(&path)
            .with_timestamp(timestamp)
            .with_value(serde_json::Value::String(event.payload)),
    )
}

/// Convert a device timestamp to an absolute instant.
///
/// A missing timestamp is the protobuf default, the Unix epoch.
fn device_timestamp(
    timestamp: Option<&prost_types::Timestamp>,
) -> Result<DateTime<Utc>, MappingFailure> {
    let prost_types::Timestamp { seconds, nanos } = timestamp.cloned().unwrap_or_default();
    let out_of_range = || MappingFailure::Timestamp { seconds, nanos };

    let normalized_seconds = seconds
        .checked_add(i64::from(nanos.div_euclid(NANOS_PER_SECOND)))
        .ok_or_else(out_of_range)?;
    let normalized_nanos =
        u32::try_from(nanos.rem_euclid(NANOS_PER_SECOND)).map_err(|_| out_of_range())?;

    Utc.timestamp_opt(normalized_seconds, normalized_nanos)
        .single()
        .ok_or_else(out_of_range)
}
