//! Kafka connector
//!
//! Topics carry no schema, so listings are empty and table shapes come from
//! virtual-table metadata. The connector exists to validate broker settings
//! and check the cluster is reachable.

mod client;
mod connector;

#[cfg(test)]
mod connector_tests;

pub use client::{BOOTSTRAP_SERVERS, ClusterClient, RdKafkaClient, client_config};
pub use connector::KafkaConnector;

use dlink_core::{ConnectorProvider, TableConnector, connector_names};

fn kafka() -> Box<dyn TableConnector> {
    Box::new(KafkaConnector::new())
}

/// Providers declared by this unit
pub fn providers() -> Vec<ConnectorProvider> {
    vec![ConnectorProvider::table(connector_names::KAFKA, kafka)]
}

dlink_core::export_connectors!(providers);
