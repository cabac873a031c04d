//! # Octopus-Ditto CLI
//!
//! Command-line utilities for testing payload mappings offline.

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::{Parser, Subcommand, ValueEnum};
use octopus_ditto_core::headers::CONTENT_TYPE;
use octopus_ditto_core::Adaptable;
use octopus_ditto_mapper::{ExternalMessage, MapperRegistry, MessageMapper, MAPPER_ALIAS};
use octopus_ditto_proto::{Bme680Data, OctopusOutboundMessage};
use prost::Message;
use tracing_subscriber::EnvFilter;

/// Octopus-Ditto - test protobuf ⇄ Ditto protocol mappings.
#[derive(Parser, Debug)]
#[command(name = "octopus-ditto")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Mapper alias.
    #[arg(short, long, global = true, default_value = MAPPER_ALIAS)]
    mapper: String,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Map an encoded device message to Ditto protocol JSON.
    Inbound {
        /// Encoded protobuf payload.
        payload: String,
        /// Encoding of the payload argument.
        #[arg(short, long, value_enum, default_value_t = PayloadFormat::Hex)]
        format: PayloadFormat,
        /// Content type to declare on the message.
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Map a Ditto protocol JSON message to device messages (hex).
    Outbound {
        /// Ditto protocol JSON envelope.
        json: String,
    },
    /// Print an example sensor reading message.
    Sample {
        /// Device id of the example message.
        #[arg(long, default_value = "org.eclipse.ditto:octopus")]
        device_id: String,
        /// Output encoding.
        #[arg(short, long, value_enum, default_value_t = PayloadFormat::Hex)]
        format: PayloadFormat,
    },
    /// List registered mapper aliases.
    Aliases,
}

/// Binary payload encodings accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PayloadFormat {
    /// Hexadecimal
    Hex,
    /// Standard base64
    Base64,
}

impl PayloadFormat {
    fn decode(self, input: &str) -> Result<Vec<u8>> {
        let input = input.trim();
        match self {
            Self::Hex => hex::decode(input).context("Invalid hex payload"),
            Self::Base64 => STANDARD.decode(input).context("Invalid base64 payload"),
        }
    }

    fn encode(self, bytes: &[u8]) -> String {
        match self {
            Self::Hex => hex::encode(bytes),
            Self::Base64 => STANDARD.encode(bytes),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let registry = MapperRegistry::with_defaults();

    match args.command {
        Command::Inbound {
            payload,
            format,
            content_type,
        } => {
            let mapper = registry.require(&args.mapper)?;
            for line in inbound(mapper.as_ref(), &payload, format, content_type.as_deref())? {
                println!("{line}");
            }
        }
        Command::Outbound { json } => {
            let mapper = registry.require(&args.mapper)?;
            for line in outbound(mapper.as_ref(), &json)? {
                println!("{line}");
            }
        }
        Command::Sample { device_id, format } => {
            println!("{}", format.encode(&sample_message(&device_id).encode_to_vec()));
        }
        Command::Aliases => {
            for alias in registry.aliases() {
                println!("{alias}");
            }
        }
    }

    Ok(())
}

/// Map an encoded device message, returning one JSON envelope per line.
fn inbound(
    mapper: &dyn MessageMapper,
    payload: &str,
    format: PayloadFormat,
    content_type: Option<&str>,
) -> Result<Vec<String>> {
    let mut message = ExternalMessage::bytes(format.decode(payload)?);
    if let Some(content_type) = content_type {
        message = message.with_header(CONTENT_TYPE, content_type);
    }

    let adaptables = mapper
        .map_inbound(&message)
        .context("Failed to map device message")?;
    Ok(adaptables.iter().map(Adaptable::to_json_string).collect())
}

/// Map a protocol JSON envelope, returning one hex device message per line.
fn outbound(mapper: &dyn MessageMapper, json: &str) -> Result<Vec<String>> {
    let adaptable = Adaptable::from_slice(json.as_bytes()).context("Invalid protocol message")?;
    mapper
        .map_outbound(&adaptable)
        .iter()
        .map(|message| match message.byte_payload() {
            Some(bytes) => Ok(hex::encode(bytes)),
            None => bail!("Mapper produced a non-binary message"),
        })
        .collect()
}

/// The example BME680 reading used in mapper tests.
fn sample_message(device_id: &str) -> OctopusOutboundMessage {
    OctopusOutboundMessage::sensor_reading(
        device_id,
        None,
        3.3,
        Bme680Data {
            temperature: 24.2,
            humidity: 48.43,
            pressure: 1000.2,
            gas_resistance: 0.32,
            altitude: 412.3,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use octopus_ditto_proto::octopus_inbound_message::Payload as DevicePayload;
    use octopus_ditto_proto::OctopusInboundMessage;
    use std::sync::Arc;

    fn default_mapper() -> Arc<dyn MessageMapper> {
        Arc::new(octopus_ditto_mapper::OctopusProtobufMapper::new())
    }

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn sample_maps_inbound() {
        let mapper = default_mapper();
        let encoded = PayloadFormat::Base64.encode(&sample_message("ns:octopus").encode_to_vec());

        let lines = inbound(mapper.as_ref(), &encoded, PayloadFormat::Base64, None).unwrap();
        assert_eq!(lines.len(), 1);

        let json: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(json["topic"], "ns/octopus/things/twin/commands/merge");
        assert_eq!(json["value"]["altitude"]["properties"]["value"], 412.3);
    }

    #[test]
    fn invalid_hex_is_reported() {
        let mapper = default_mapper();
        assert!(inbound(mapper.as_ref(), "zz", PayloadFormat::Hex, None).is_err());
    }

    #[test]
    fn outbound_prints_hex() {
        let mapper = default_mapper();
        let json = r#"{"topic":"ns/octopus/things/live/messages/beep","path":"/","value":"now"}"#;

        let lines = outbound(mapper.as_ref(), json).unwrap();
        assert_eq!(lines.len(), 1);

        let bytes = hex::decode(&lines[0]).unwrap();
        let message = OctopusInboundMessage::from_bytes(&bytes).unwrap();
        assert_eq!(message.device_id, "ns:octopus");
        assert!(matches!(message.payload, Some(DevicePayload::Action(ref a)) if a.name == "beep"));
    }
}
