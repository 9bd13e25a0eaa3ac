use std::time::Duration;

use dlink_core::{LinkError, Parameter, Result, TableConnector, TableField, connector_names};

use crate::client::{BOOTSTRAP_SERVERS, ClusterClient, RdKafkaClient, client_config};

const DEFAULT_TIMEOUT_MS: u64 = 5_000;

pub struct KafkaConnector {
    client: Option<Box<dyn ClusterClient>>,
    servers: String,
    timeout: Duration,
}

impl KafkaConnector {
    pub fn new() -> Self {
        Self {
            client: None,
            servers: String::new(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// A connector already attached to `client`
    pub fn with_client(client: Box<dyn ClusterClient>) -> Self {
        Self {
            client: Some(client),
            ..Self::new()
        }
    }

    /// Topic names visible to the configured credentials
    pub fn topics(&self) -> Result<Vec<String>> {
        let client = self.client.as_deref().ok_or_else(|| {
            LinkError::Connectivity("connector 'Kafka' is not initialized".to_string())
        })?;
        client.topics(self.timeout)
    }
}

impl Default for KafkaConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl TableConnector for KafkaConnector {
    fn name(&self) -> &str {
        connector_names::KAFKA
    }

    #[tracing::instrument(skip(self, param), fields(connector = %param.name))]
    fn initialize(&mut self, param: &Parameter) -> Result<()> {
        let config = client_config(param)?;
        self.timeout = param
            .config_value("connectionTimeout")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(self.timeout);
        self.servers = config.get(BOOTSTRAP_SERVERS).unwrap_or_default().to_string();
        self.client = Some(Box::new(RdKafkaClient::new(&config)?));
        tracing::info!(servers = %self.servers, "Kafka client created");
        Ok(())
    }

    fn list_databases(&mut self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn list_tables_matching(&mut self, _database: &str, _pattern: Option<&str>) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn list_columns_matching(
        &mut self,
        _database: &str,
        _table: &str,
        _pattern: Option<&str>,
    ) -> Result<Vec<TableField>> {
        Ok(Vec::new())
    }

    fn test_connectivity(&mut self) -> bool {
        match self.topics() {
            Ok(topics) => {
                tracing::debug!(servers = %self.servers, topics = topics.len(), "Kafka cluster reachable");
                true
            }
            Err(e) => {
                tracing::warn!(servers = %self.servers, error = %e, "Kafka connectivity check failed");
                false
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        self.client = None;
        Ok(())
    }
}
