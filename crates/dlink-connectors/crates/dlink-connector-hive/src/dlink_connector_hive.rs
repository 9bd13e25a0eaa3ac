//! Hive connector
//!
//! Validates metastore settings and checks the metastore endpoints. Table
//! metadata is not read from the metastore.

mod connector;
mod metastore;

#[cfg(test)]
mod connector_tests;
#[cfg(test)]
mod metastore_tests;

pub use connector::HiveConnector;
pub use metastore::{DEFAULT_METASTORE_PORT, METASTORE_URI, MetastoreEndpoint, parse_metastore_uris};

use dlink_core::{ConnectorProvider, TableConnector, connector_names};

fn hive() -> Box<dyn TableConnector> {
    Box::new(HiveConnector::new())
}

/// Providers declared by this unit
pub fn providers() -> Vec<ConnectorProvider> {
    vec![ConnectorProvider::table(connector_names::HIVE, hive)]
}

dlink_core::export_connectors!(providers);
