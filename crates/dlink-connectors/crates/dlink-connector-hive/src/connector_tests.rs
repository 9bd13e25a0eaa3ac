use super::*;
use std::net::TcpListener;

use dlink_core::{LinkError, Parameter, TableConnector};
use pretty_assertions::assert_eq;

fn param(uri: &str) -> Parameter {
    Parameter::new("Hive", "Hive")
        .with_config(METASTORE_URI, uri)
        .with_config("connectionTimeout", "500")
}

#[test]
fn test_metastore_uri_is_required() {
    let mut hive = HiveConnector::new();
    let err = hive.initialize(&Parameter::new("Hive", "Hive")).unwrap_err();
    assert!(matches!(err, LinkError::Configuration(_)));
    assert!(err.to_string().contains(METASTORE_URI));
}

#[test]
fn test_connectivity_follows_metastore_listener() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let mut hive = HiveConnector::new();
    hive.initialize(&param(&format!("thrift://127.0.0.1:{}", port)))
        .unwrap();
    assert_eq!(hive.endpoints().len(), 1);
    assert!(hive.test_connectivity());

    drop(listener);
    assert!(!hive.test_connectivity());
}

#[test]
fn test_any_reachable_metastore_is_enough() {
    let closed = TcpListener::bind("127.0.0.1:0").unwrap();
    let closed_port = closed.local_addr().unwrap().port();
    drop(closed);
    let open = TcpListener::bind("127.0.0.1:0").unwrap();
    let open_port = open.local_addr().unwrap().port();

    let mut hive = HiveConnector::new();
    hive.initialize(&param(&format!(
        "thrift://127.0.0.1:{},thrift://127.0.0.1:{}",
        closed_port, open_port
    )))
    .unwrap();
    assert!(hive.test_connectivity());
}

#[test]
fn test_listings_are_not_supported() {
    let mut hive = HiveConnector::new();
    hive.initialize(&param("thrift://meta:9083")).unwrap();
    assert!(matches!(hive.list_databases(), Err(LinkError::NotSupported(_))));
    assert!(matches!(hive.list_tables("ods"), Err(LinkError::NotSupported(_))));
    hive.close().unwrap();
    assert!(!hive.test_connectivity());
}

#[test]
fn test_provider_is_exported() {
    let providers = crate::providers();
    assert!(providers.iter().any(|p| p.matches("HIVE")));
    assert!(dlink_connector_declaration.is_compatible());
}
