//! Bridge runtime: device topics ⇄ mapper ⇄ Ditto topics.

use crate::config::AgentConfig;
use anyhow::{Context, Result};
use octopus_ditto_core::headers::CORRELATION_ID;
use octopus_ditto_core::Adaptable;
use octopus_ditto_mapper::{ExternalMessage, MapperRegistry, MessageMapper};
use octopus_ditto_proto::{BridgeTopic, TopicScheme};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::sync::Arc;
use uuid::Uuid;

/// Header carrying the MQTT topic a device message arrived on.
const MQTT_TOPIC_HEADER: &str = "mqtt.topic";

/// A message to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    /// Target topic
    pub topic: String,
    /// Payload bytes
    pub payload: Vec<u8>,
}

/// The bridge between Octopus devices and Ditto.
pub struct Bridge {
    config: AgentConfig,
    topics: TopicScheme,
    mapper: Arc<dyn MessageMapper>,
}

impl Bridge {
    /// Create a new bridge using the configured mapper.
    ///
    /// # Errors
    ///
    /// Returns error if the configured mapper alias is unknown.
    pub fn new(config: AgentConfig, registry: &MapperRegistry) -> Result<Self, BridgeError> {
        let mapper = registry
            .get(&config.bridge.mapper_alias)
            .ok_or_else(|| BridgeError::UnknownMapper(config.bridge.mapper_alias.clone()))?;
        let topics = TopicScheme::new(&config.bridge.tenant);

        Ok(Self {
            config,
            topics,
            mapper,
        })
    }

    /// Handle a message received on `topic`, returning what to publish.
    #[must_use]
    pub fn handle(&self, topic: &str, payload: &[u8]) -> Vec<Publication> {
        match self.topics.parse(topic) {
            Some(BridgeTopic::Telemetry(device_id)) => {
                self.handle_telemetry(topic, &device_id, payload)
            }
            Some(BridgeTopic::DittoOutbound) => self.handle_ditto_outbound(payload),
            _ => {
                tracing::debug!(topic, "Ignoring message on unhandled topic");
                Vec::new()
            }
        }
    }

    fn handle_telemetry(&self, topic: &str, device_id: &str, payload: &[u8]) -> Vec<Publication> {
        let message = ExternalMessage::bytes(payload).with_header(MQTT_TOPIC_HEADER, topic);

        let adaptables = match self.mapper.map_inbound(&message) {
            Ok(adaptables) => adaptables,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    device_id,
                    payload_len = payload.len(),
                    "Failed to map device message"
                );
                return Vec::new();
            }
        };

        if adaptables.is_empty() {
            tracing::debug!(device_id, "Device message mapped to no protocol messages");
        }

        let extra_headers = self.mapper.additional_inbound_headers(&message);
        adaptables
            .into_iter()
            .map(|mut adaptable| {
                adaptable.headers.merge_absent(extra_headers.iter());
                adaptable
                    .headers
                    .insert_if_absent(CORRELATION_ID, Uuid::new_v4().to_string());

                tracing::debug!(
                    device_id,
                    topic = %adaptable.topic_path,
                    correlation_id = ?adaptable.headers.correlation_id(),
                    "Forwarding protocol message to Ditto"
                );
                Publication {
                    topic: self.topics.ditto_inbound(),
                    payload: adaptable.to_json_string().into_bytes(),
                }
            })
            .collect()
    }

    fn handle_ditto_outbound(&self, payload: &[u8]) -> Vec<Publication> {
        let adaptable = match Adaptable::from_slice(payload) {
            Ok(adaptable) => adaptable,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    payload_len = payload.len(),
                    "Failed to parse protocol message from Ditto"
                );
                return Vec::new();
            }
        };

        let messages = self.mapper.map_outbound(&adaptable);
        if messages.is_empty() {
            tracing::debug!(
                topic = %adaptable.topic_path,
                path = %adaptable.payload.path,
                "Protocol message not addressed to a device"
            );
        }

        messages
            .into_iter()
            .filter_map(|message| {
                let device_id = message.topic_path.as_ref()?.thing_id().to_string();
                let payload = message.byte_payload()?.to_vec();

                tracing::debug!(
                    device_id = %device_id,
                    correlation_id = ?adaptable.headers.correlation_id(),
                    "Forwarding command to device"
                );
                Some(Publication {
                    topic: self.topics.command(&device_id),
                    payload,
                })
            })
            .collect()
    }

    /// Run the bridge until Ctrl+C.
    ///
    /// # Errors
    ///
    /// Returns error if subscribing fails.
    pub async fn run(self) -> Result<()> {
        let broker = &self.config.mqtt.broker;
        let mut mqtt_options =
            MqttOptions::new(&self.config.mqtt.client_id, broker.host.as_str(), broker.port);
        mqtt_options.set_keep_alive(self.config.mqtt.keep_alive);

        let (client, mut eventloop) = AsyncClient::new(mqtt_options, 100);

        for topic in [self.topics.telemetry_wildcard(), self.topics.ditto_outbound()] {
            tracing::info!(topic, "Subscribing");
            client
                .subscribe(&topic, QoS::AtLeastOnce)
                .await
                .with_context(|| format!("Failed to subscribe to {topic}"))?;
        }

        tracing::info!(
            mapper = self.mapper.alias(),
            tenant = %self.config.bridge.tenant,
            "Bridge running, press Ctrl+C to stop"
        );

        loop {
            tokio::select! {
                event = eventloop.poll() => {
                    match event {
                        Ok(Event::Incoming(Packet::Publish(publish))) => {
                            tracing::debug!(
                                topic = %publish.topic,
                                payload_len = publish.payload.len(),
                                "Received MQTT message"
                            );
                            for publication in self.handle(&publish.topic, &publish.payload) {
                                spawn_publish(client.clone(), publication);
                            }
                        }
                        Ok(Event::Incoming(Packet::ConnAck(_))) => {
                            tracing::info!("Connected to MQTT broker");
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::error!(error = %e, "MQTT error");
                            tokio::time::sleep(self.config.mqtt.reconnect_delay).await;
                        }
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
            }
        }

        if let Err(err) = client.disconnect().await {
            tracing::debug!(error = %err, "Disconnect failed");
        }
        tracing::info!("Bridge stopped");
        Ok(())
    }
}

/// Publish without blocking the event loop that drains the request queue.
fn spawn_publish(client: AsyncClient, publication: Publication) {
    tokio::spawn(async move {
        let Publication { topic, payload } = publication;
        let payload_len = payload.len();
        if let Err(err) = client
            .publish(&topic, QoS::AtLeastOnce, false, payload)
            .await
        {
            tracing::warn!(error = %err, topic, payload_len, "Failed to publish");
        }
    });
}

/// Errors for bridge setup.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BridgeError {
    /// No mapper registered under the configured alias
    #[error("unknown mapper alias: {0}")]
    UnknownMapper(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use octopus_ditto_proto::octopus_inbound_message::Payload as DevicePayload;
    use octopus_ditto_proto::{Bme680Data, OctopusInboundMessage, OctopusOutboundMessage};
    use prost::Message;
    use serde_json::json;

    fn bridge() -> Bridge {
        let mut config = AgentConfig::default();
        config.bridge.tenant = "factory-a".to_string();
        Bridge::new(config, &MapperRegistry::with_defaults()).unwrap()
    }

    #[test]
    fn unknown_mapper_alias_fails() {
        let mut config = AgentConfig::default();
        config.bridge.mapper_alias = "Nope".to_string();
        assert!(matches!(
            Bridge::new(config, &MapperRegistry::with_defaults()),
            Err(BridgeError::UnknownMapper(_))
        ));
    }

    #[test]
    fn telemetry_is_forwarded_to_ditto() {
        let device_message = OctopusOutboundMessage::sensor_reading(
            "org.eclipse.ditto:octopus",
            None,
            3.3,
            Bme680Data {
                temperature: 21.5,
                ..Default::default()
            },
        );

        let publications = bridge().handle(
            "octopus/v1/factory-a/org.eclipse.ditto:octopus/telemetry",
            &device_message.encode_to_vec(),
        );
        assert_eq!(publications.len(), 1);
        assert_eq!(publications[0].topic, "octopus/v1/factory-a/ditto/inbound");

        let adaptable = Adaptable::from_slice(&publications[0].payload).unwrap();
        assert_eq!(
            adaptable.topic_path.to_string(),
            "org.eclipse.ditto/octopus/things/twin/commands/merge"
        );
        assert!(adaptable.headers.correlation_id().is_some());
        assert_eq!(
            adaptable.headers.get(MQTT_TOPIC_HEADER),
            Some("octopus/v1/factory-a/org.eclipse.ditto:octopus/telemetry")
        );
        assert_eq!(
            adaptable.payload.value.unwrap()["temperature"]["properties"]["value"],
            21.5
        );
    }

    #[test]
    fn undecodable_telemetry_is_dropped() {
        let publications = bridge().handle(
            "octopus/v1/factory-a/ns:octopus/telemetry",
            &[0xff, 0xff, 0xff],
        );
        assert!(publications.is_empty());
    }

    #[test]
    fn ditto_message_is_forwarded_to_device() {
        let envelope = json!({
            "topic": "org.eclipse.ditto/octopus/things/live/messages/switch-led",
            "headers": {"correlation-id": "corr-9", "response-required": false},
            "path": "/inbox/messages/switch-led",
            "value": "on"
        });

        let publications = bridge().handle(
            "octopus/v1/factory-a/ditto/outbound",
            envelope.to_string().as_bytes(),
        );
        assert_eq!(publications.len(), 1);
        assert_eq!(
            publications[0].topic,
            "octopus/v1/factory-a/org.eclipse.ditto:octopus/command"
        );

        let device_message = OctopusInboundMessage::from_bytes(&publications[0].payload).unwrap();
        let Some(DevicePayload::Action(action)) = device_message.payload else {
            panic!("expected an action");
        };
        assert_eq!(action.name, "switch-led");
        assert_eq!(action.payload, "on");
        assert!(!action.requiring_response);
    }

    #[test]
    fn twin_events_from_ditto_are_dropped() {
        let envelope = json!({
            "topic": "org.eclipse.ditto/octopus/things/twin/events/modified",
            "path": "/features/temperature",
            "value": {}
        });

        let publications = bridge().handle(
            "octopus/v1/factory-a/ditto/outbound",
            envelope.to_string().as_bytes(),
        );
        assert!(publications.is_empty());
    }

    #[test]
    fn foreign_topics_are_ignored() {
        assert!(bridge()
            .handle("octopus/v1/other-tenant/ditto/outbound", b"{}")
            .is_empty());
        assert!(bridge()
            .handle("octopus/v1/factory-a/ns:octopus/command", b"")
            .is_empty());
    }
}
