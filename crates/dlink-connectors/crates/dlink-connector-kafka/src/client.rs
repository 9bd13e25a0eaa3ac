//! Cluster metadata access

use std::time::Duration;

use dlink_core::{LinkError, Parameter, Result};
use rdkafka::ClientConfig;
use rdkafka::consumer::{BaseConsumer, Consumer};

pub const BOOTSTRAP_SERVERS: &str = "bootstrap.servers";

/// Legacy name of [`BOOTSTRAP_SERVERS`] in stored connections
const BROKER: &str = "broker";

/// Metadata calls the connector makes against a cluster
pub trait ClusterClient: Send + Sync {
    fn topics(&self, timeout: Duration) -> Result<Vec<String>>;
}

/// librdkafka client config for `param`.
///
/// `bootstrap.servers` (or `broker`) is required. Other dotted keys are
/// librdkafka properties and pass through unchanged.
pub fn client_config(param: &Parameter) -> Result<ClientConfig> {
    let servers = param
        .config_value(BOOTSTRAP_SERVERS)
        .or_else(|| param.config_value(BROKER))
        .map(str::trim)
        .filter(|servers| !servers.is_empty())
        .ok_or_else(|| {
            LinkError::Configuration(format!(
                "connector '{}' requires config key '{}'",
                param.name, BOOTSTRAP_SERVERS
            ))
        })?;

    let mut config = ClientConfig::new();
    for (key, value) in &param.config {
        if key.contains('.') {
            config.set(key, value);
        }
    }
    config.set(BOOTSTRAP_SERVERS, servers);
    Ok(config)
}

/// [`ClusterClient`] over a librdkafka consumer that never subscribes
pub struct RdKafkaClient {
    consumer: BaseConsumer,
}

impl RdKafkaClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let consumer: BaseConsumer = config
            .create()
            .map_err(|e| LinkError::Configuration(format!("failed to create Kafka client: {}", e)))?;
        Ok(Self { consumer })
    }
}

impl ClusterClient for RdKafkaClient {
    fn topics(&self, timeout: Duration) -> Result<Vec<String>> {
        let metadata = self
            .consumer
            .fetch_metadata(None, timeout)
            .map_err(|e| LinkError::Connectivity(format!("failed to fetch Kafka metadata: {}", e)))?;
        Ok(metadata
            .topics()
            .iter()
            .map(|topic| topic.name().to_string())
            .collect())
    }
}
