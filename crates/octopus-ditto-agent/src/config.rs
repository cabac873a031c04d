//! Agent configuration.

use anyhow::{bail, Context, Result};
use octopus_ditto_mapper::MAPPER_ALIAS;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Port used when the broker address does not name one.
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// MQTT connection configuration
    pub mqtt: MqttConfig,

    /// Bridge configuration
    pub bridge: BridgeConfig,
}

/// MQTT connection configuration.
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// Broker address
    pub broker: BrokerAddress,

    /// Client identifier
    pub client_id: String,

    /// Keep-alive interval
    pub keep_alive: Duration,

    /// Delay before polling again after a connection error
    pub reconnect_delay: Duration,
}

/// Host and port of an MQTT broker.
///
/// Accepts `tcp://host:port`, `mqtt://host:port` or a bare `host[:port]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    /// Host name or IP address
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl fmt::Display for BrokerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tcp://{}:{}", self.host, self.port)
    }
}

impl FromStr for BrokerAddress {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self> {
        let url = if input.contains("://") {
            Url::parse(input)
        } else {
            Url::parse(&format!("tcp://{input}"))
        }
        .with_context(|| format!("Malformed broker address '{input}'"))?;

        if !matches!(url.scheme(), "tcp" | "mqtt") {
            bail!("Unsupported broker scheme '{}' in '{input}'", url.scheme());
        }
        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .with_context(|| format!("Broker address '{input}' has no host"))?;

        Ok(Self {
            host: host.to_string(),
            port: url.port().unwrap_or(DEFAULT_MQTT_PORT),
        })
    }
}

/// Bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Tenant identifier used in topics
    pub tenant: String,

    /// Alias of the mapper translating payloads
    pub mapper_alias: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            mqtt: MqttConfig {
                broker: BrokerAddress {
                    host: "localhost".to_string(),
                    port: DEFAULT_MQTT_PORT,
                },
                client_id: "octopus-ditto-agent".to_string(),
                keep_alive: Duration::from_secs(30),
                reconnect_delay: Duration::from_secs(5),
            },
            bridge: BridgeConfig {
                tenant: "default".to_string(),
                mapper_alias: MAPPER_ALIAS.to_string(),
            },
        }
    }
}

impl AgentConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OCTOPUS_MQTT_BROKER`: MQTT broker address
    /// - `OCTOPUS_CLIENT_ID`: MQTT client identifier
    /// - `OCTOPUS_KEEP_ALIVE_SECS`: MQTT keep-alive in seconds
    /// - `OCTOPUS_TENANT`: Tenant identifier
    /// - `OCTOPUS_MAPPER`: Mapper alias
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set to an unparsable value, including a
    /// broker address with an unsupported scheme or no host.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(broker) = lookup("OCTOPUS_MQTT_BROKER") {
            config.mqtt.broker = broker
                .parse()
                .context("Invalid OCTOPUS_MQTT_BROKER")?;
        }

        if let Some(client_id) = lookup("OCTOPUS_CLIENT_ID") {
            config.mqtt.client_id = client_id;
        }

        if let Some(secs) = lookup("OCTOPUS_KEEP_ALIVE_SECS") {
            let secs: u64 = secs
                .parse()
                .context("Invalid OCTOPUS_KEEP_ALIVE_SECS")?;
            config.mqtt.keep_alive = Duration::from_secs(secs);
        }

        if let Some(tenant) = lookup("OCTOPUS_TENANT") {
            config.bridge.tenant = tenant;
        }

        if let Some(alias) = lookup("OCTOPUS_MAPPER") {
            config.bridge.mapper_alias = alias;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = AgentConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.mqtt.broker.to_string(), "tcp://localhost:1883");
        assert_eq!(config.bridge.tenant, "default");
        assert_eq!(config.bridge.mapper_alias, "CustomOctopusProtobuf");
    }

    #[test]
    fn env_overrides() {
        let config = AgentConfig::from_lookup(lookup(&[
            ("OCTOPUS_MQTT_BROKER", "mqtt://broker:1884"),
            ("OCTOPUS_TENANT", "factory-a"),
            ("OCTOPUS_KEEP_ALIVE_SECS", "10"),
        ]))
        .unwrap();

        assert_eq!(config.mqtt.broker.host, "broker");
        assert_eq!(config.mqtt.broker.port, 1884);
        assert_eq!(config.bridge.tenant, "factory-a");
        assert_eq!(config.mqtt.keep_alive, Duration::from_secs(10));
    }

    #[test]
    fn broker_address_forms() {
        let parse = |input: &str| input.parse::<BrokerAddress>().unwrap();

        assert_eq!(parse("tcp://localhost:1883").port, 1883);
        assert_eq!(parse("mqtt://broker.example.com").host, "broker.example.com");
        assert_eq!(parse("mqtt://broker.example.com").port, DEFAULT_MQTT_PORT);
        assert_eq!(
            parse("10.0.0.7:1884"),
            BrokerAddress {
                host: "10.0.0.7".to_string(),
                port: 1884
            }
        );
    }

    #[test]
    fn invalid_broker_is_rejected() {
        for broker in ["ws://localhost", "tcp://", "a:b:c", "host:99999"] {
            let result = AgentConfig::from_lookup(lookup(&[("OCTOPUS_MQTT_BROKER", broker)]));
            let err = result.expect_err(broker);
            assert!(format!("{err:#}").contains("OCTOPUS_MQTT_BROKER"), "{err:#}");
        }
    }

    #[test]
    fn invalid_keep_alive_is_rejected() {
        assert!(AgentConfig::from_lookup(lookup(&[("OCTOPUS_KEEP_ALIVE_SECS", "soon")])).is_err());
    }
}
