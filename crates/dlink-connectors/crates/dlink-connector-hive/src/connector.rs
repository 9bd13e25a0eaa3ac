use std::time::Duration;

use dlink_core::{LinkError, Parameter, Result, TableConnector, TableField, connector_names};

use crate::metastore::{METASTORE_URI, MetastoreEndpoint, parse_metastore_uris};

const DEFAULT_TIMEOUT_MS: u64 = 5_000;

pub struct HiveConnector {
    endpoints: Vec<MetastoreEndpoint>,
    timeout: Duration,
}

impl HiveConnector {
    pub fn new() -> Self {
        Self {
            endpoints: Vec::new(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn endpoints(&self) -> &[MetastoreEndpoint] {
        &self.endpoints
    }

    fn unsupported(&self, what: &str) -> LinkError {
        LinkError::NotSupported(format!(
            "listing {} from the Hive metastore is not supported; describe Hive tables with virtual tables",
            what
        ))
    }
}

impl Default for HiveConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl TableConnector for HiveConnector {
    fn name(&self) -> &str {
        connector_names::HIVE
    }

    #[tracing::instrument(skip(self, param), fields(connector = %param.name))]
    fn initialize(&mut self, param: &Parameter) -> Result<()> {
        self.endpoints = parse_metastore_uris(param.require(METASTORE_URI)?)?;
        self.timeout = param
            .config_value("connectionTimeout")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(self.timeout);
        tracing::info!(metastores = self.endpoints.len(), "Hive metastore configured");
        Ok(())
    }

    fn list_databases(&mut self) -> Result<Vec<String>> {
        Err(self.unsupported("databases"))
    }

    fn list_tables_matching(&mut self, _database: &str, _pattern: Option<&str>) -> Result<Vec<String>> {
        Err(self.unsupported("tables"))
    }

    fn list_columns_matching(
        &mut self,
        _database: &str,
        _table: &str,
        _pattern: Option<&str>,
    ) -> Result<Vec<TableField>> {
        Err(self.unsupported("columns"))
    }

    /// True when any configured metastore accepts a connection
    fn test_connectivity(&mut self) -> bool {
        let reachable = self
            .endpoints
            .iter()
            .find(|endpoint| endpoint.is_reachable(self.timeout));
        match reachable {
            Some(endpoint) => {
                tracing::debug!(endpoint = %endpoint, "Hive metastore reachable");
                true
            }
            None => {
                tracing::warn!(metastores = self.endpoints.len(), "no Hive metastore reachable");
                false
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        self.endpoints.clear();
        Ok(())
    }
}
