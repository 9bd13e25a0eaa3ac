use super::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use dlink_core::{LinkError, Parameter, Result, TableConnector};
use pretty_assertions::assert_eq;

/// Answers topic lookups from a canned result and counts the calls
struct FakeCluster {
    topics: Option<Vec<String>>,
    calls: Arc<AtomicUsize>,
}

impl ClusterClient for FakeCluster {
    fn topics(&self, _timeout: Duration) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.topics
            .clone()
            .ok_or_else(|| LinkError::Connectivity("all brokers down".into()))
    }
}

fn connector(topics: Option<&[&str]>) -> (KafkaConnector, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let cluster = FakeCluster {
        topics: topics.map(|t| t.iter().map(|s| s.to_string()).collect()),
        calls: Arc::clone(&calls),
    };
    (KafkaConnector::with_client(Box::new(cluster)), calls)
}

#[test]
fn test_connectivity_lists_topics() {
    let (mut reachable, calls) = connector(Some(&["orders", "payments"]));
    assert!(reachable.test_connectivity());
    assert_eq!(reachable.topics().unwrap(), vec!["orders", "payments"]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let (mut down, _) = connector(None);
    assert!(!down.test_connectivity());
}

#[test]
fn test_listings_are_empty() {
    let (mut kafka, calls) = connector(Some(&["orders"]));
    assert!(kafka.list_databases().unwrap().is_empty());
    assert!(kafka.list_tables("any").unwrap().is_empty());
    assert!(kafka.list_columns("any", "orders").unwrap().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_closed_connector_is_unreachable() {
    let (mut kafka, _) = connector(Some(&["orders"]));
    kafka.close().unwrap();
    assert!(!kafka.test_connectivity());
    assert!(matches!(kafka.topics(), Err(LinkError::Connectivity(_))));
}

#[test]
fn test_bootstrap_servers_are_required() {
    let mut kafka = KafkaConnector::new();
    let err = kafka
        .initialize(&Parameter::new("Kafka", "Kafka"))
        .unwrap_err();
    assert!(matches!(err, LinkError::Configuration(_)));
    assert!(err.to_string().contains(BOOTSTRAP_SERVERS));

    let blank = Parameter::new("Kafka", "Kafka").with_config(BOOTSTRAP_SERVERS, "  ");
    assert!(kafka.initialize(&blank).is_err());
}

#[test]
fn test_client_config_passes_librdkafka_properties() {
    let param = Parameter::new("Kafka", "Kafka")
        .with_config("broker", "kafka-1:9092,kafka-2:9092")
        .with_config("security.protocol", "SASL_PLAINTEXT")
        .with_config("connectionTimeout", "1000");
    let config = client_config(&param).unwrap();
    assert_eq!(config.get(BOOTSTRAP_SERVERS), Some("kafka-1:9092,kafka-2:9092"));
    assert_eq!(config.get("security.protocol"), Some("SASL_PLAINTEXT"));
    assert_eq!(config.get("connectionTimeout"), None);
    assert_eq!(config.get("broker"), None);
}

#[test]
fn test_unreachable_cluster_is_reported() {
    let mut kafka = KafkaConnector::new();
    let param = Parameter::new("Kafka", "Kafka")
        .with_config(BOOTSTRAP_SERVERS, "127.0.0.1:1")
        .with_config("connectionTimeout", "200");
    kafka.initialize(&param).unwrap();
    assert_eq!(kafka.name(), "Kafka");
    assert!(!kafka.test_connectivity());
    kafka.close().unwrap();
}

#[test]
fn test_provider_is_exported() {
    let providers = crate::providers();
    assert!(providers.iter().any(|p| p.matches("kafka")));
    assert!(dlink_connector_declaration.is_compatible());
}
