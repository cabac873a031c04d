//! # Octopus-Ditto Agent
//!
//! MQTT bridge between Octopus boards and Eclipse Ditto.
//!
//! ## Flows
//!
//! 1. **Telemetry**: protobuf from `octopus/v1/{tenant}/+/telemetry` is mapped
//!    to Ditto protocol JSON and published to `octopus/v1/{tenant}/ditto/inbound`
//! 2. **Commands**: Ditto protocol JSON from `octopus/v1/{tenant}/ditto/outbound`
//!    is mapped to protobuf and published to `octopus/v1/{tenant}/{device_id}/command`

use anyhow::{Context, Result};
use octopus_ditto_mapper::MapperRegistry;
use tracing_subscriber::EnvFilter;

mod bridge;
mod config;

pub use bridge::Bridge;
pub use config::AgentConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Octopus-Ditto Agent"
    );

    let config = AgentConfig::from_env()?;
    let registry = MapperRegistry::with_defaults();

    tracing::info!(
        broker = %config.mqtt.broker,
        mapper = %config.bridge.mapper_alias,
        "Agent initialized"
    );

    let bridge = Bridge::new(config, &registry).context("Failed to create bridge")?;

    bridge.run().await?;

    Ok(())
}
