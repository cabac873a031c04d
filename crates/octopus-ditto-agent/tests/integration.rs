//! End-to-end check against a running agent.
//!
//! Needs a broker and an agent started with `OCTOPUS_TENANT=integration`.
//! Set `OCTOPUS_INTEGRATION=1` to run.

use octopus_ditto_proto::octopus_inbound_message::Payload as DevicePayload;
use octopus_ditto_proto::{Bme680Data, OctopusInboundMessage, OctopusOutboundMessage, TopicScheme};
use prost::Message;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use url::Url;
use uuid::Uuid;

const DEVICE_ID: &str = "org.eclipse.ditto:octopus-it";

/// Wait for the next publish on `topic`, skipping anything else.
async fn next_on(rx: &mut mpsc::UnboundedReceiver<(String, Vec<u8>)>, topic: &str) -> Vec<u8> {
    timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Some((received, payload)) if received == topic => return payload,
                Some(_) => {}
                None => panic!("device connection closed"),
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("no message on {topic}"))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn telemetry_and_commands_round_trip() {
    if std::env::var("OCTOPUS_INTEGRATION").is_err() {
        eprintln!("Skipping integration test; set OCTOPUS_INTEGRATION=1 to run");
        return;
    }

    let broker = std::env::var("OCTOPUS_MQTT_BROKER")
        .unwrap_or_else(|_| "tcp://localhost:1883".to_string());
    let broker = Url::parse(&broker).unwrap();
    let host = broker.host_str().unwrap().to_string();
    let port = broker.port().unwrap_or(1883);

    let scheme = TopicScheme::new("integration");

    // One client plays both the device and Ditto.
    let mut options = MqttOptions::new(format!("it-{}", Uuid::new_v4()), host, port);
    options.set_keep_alive(Duration::from_secs(5));
    let (client, mut eventloop) = AsyncClient::new(options, 10);
    for topic in [scheme.ditto_inbound(), scheme.command(DEVICE_ID)] {
        client.subscribe(topic, QoS::AtLeastOnce).await.unwrap();
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Ok(event) = eventloop.poll().await {
            if let Event::Incoming(Packet::Publish(publish)) = event {
                if tx.send((publish.topic, publish.payload.to_vec())).is_err() {
                    break;
                }
            }
        }
    });
    tokio::time::sleep(Duration::from_millis(200)).await;

    let reading = OctopusOutboundMessage::sensor_reading(
        DEVICE_ID,
        None,
        3.3,
        Bme680Data {
            temperature: 24.2,
            ..Default::default()
        },
    );
    client
        .publish(
            scheme.telemetry(DEVICE_ID),
            QoS::AtLeastOnce,
            false,
            reading.encode_to_vec(),
        )
        .await
        .unwrap();

    let merge: serde_json::Value =
        serde_json::from_slice(&next_on(&mut rx, &scheme.ditto_inbound()).await).unwrap();
    assert_eq!(
        merge["topic"],
        "org.eclipse.ditto/octopus-it/things/twin/commands/merge"
    );
    assert_eq!(merge["value"]["temperature"]["properties"]["value"], 24.2);
    assert!(merge["headers"]["correlation-id"].is_string());

    let command = json!({
        "topic": "org.eclipse.ditto/octopus-it/things/live/messages/switch-led",
        "headers": {"correlation-id": "it-1"},
        "path": "/inbox/messages/switch-led",
        "value": {"state": "on"}
    });
    client
        .publish(
            scheme.ditto_outbound(),
            QoS::AtLeastOnce,
            false,
            command.to_string(),
        )
        .await
        .unwrap();

    let bytes = next_on(&mut rx, &scheme.command(DEVICE_ID)).await;
    let device_message = OctopusInboundMessage::from_bytes(&bytes).unwrap();
    assert_eq!(device_message.device_id, DEVICE_ID);
    let Some(DevicePayload::Action(action)) = device_message.payload else {
        panic!("expected an action");
    };
    assert_eq!(action.name, "switch-led");
    assert_eq!(action.payload, r#"{"state":"on"}"#);
    assert!(action.requiring_response);
}
