use super::*;

use dlink_core::{CompilerConfig, Connection, DriverDescriptor, LinkError, TableMapping};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::generator::METASTORE_URI;

fn jdbc_source() -> (Connection, DriverDescriptor) {
    let connection = Connection {
        id: 1,
        connector: "MySQL".into(),
        ..Connection::default()
    };
    (connection, DriverDescriptor::table("MySQL", "JDBC-MySQL"))
}

fn hive_target(config: &[(&str, &str)]) -> (Connection, DriverDescriptor) {
    let mut connection = Connection {
        id: 2,
        connector: "Hive".into(),
        host: Some("hive.internal".into()),
        port: Some(9083),
        ..Connection::default()
    };
    for (key, value) in config {
        connection.config.insert(key.to_string(), value.to_string());
    }
    (connection, DriverDescriptor::table("Hive", "Hive"))
}

fn job() -> JobDescriptor {
    JobDescriptor::new(5, "to_hive").with_mapping(TableMapping::new("shop", "orders", "ods", "orders"))
}

#[test]
fn test_hive_sink_stages_inline_files() {
    let staging = tempfile::tempdir().unwrap();
    let config = CompilerConfig {
        staging_dir: Some(staging.path().to_path_buf()),
        ..CompilerConfig::default()
    };
    let (source, source_descriptor) = jdbc_source();
    let (target, target_descriptor) = hive_target(&[
        (METASTORE_URI, "thrift://hive.internal:9083"),
        ("hive_site_path", "<configuration/>"),
        ("fs.defaultFS", "hdfs://nn:8020"),
    ]);

    let document = Compiler::new(config)
        .compile(&job(), &source, &source_descriptor, &target, &target_descriptor)
        .unwrap();
    let sink = &document.sink[0];

    assert_eq!(sink.plugin(), Some("Hive"));
    assert_eq!(sink.get_str("source_stage_ref"), Some("TableSource_orders_5"));
    assert_eq!(sink.get_str("table_name"), Some("ods.orders"));
    assert_eq!(sink.get_str(METASTORE_URI), Some("thrift://hive.internal:9083"));

    let staged = std::path::Path::new(sink.get_str("hive_site_path").unwrap());
    assert!(staged.starts_with(staging.path()));
    assert!(staged.extension().is_some_and(|ext| ext == "xml"));
    assert_eq!(std::fs::read_to_string(staged).unwrap(), "<configuration/>");

    let hadoop = sink.get("hive.hadoop.conf").unwrap();
    assert_eq!(hadoop["fs.defaultFS"], json!("hdfs://nn:8020"));
    assert_eq!(hadoop["type"], json!("Hive"));
    for excluded in [METASTORE_URI, "hive_site_path", "host", "port"] {
        assert!(hadoop.get(excluded).is_none(), "{} leaked into hadoop conf", excluded);
    }
}

#[test]
fn test_hive_sink_requires_metastore() {
    let (source, source_descriptor) = jdbc_source();
    let (target, target_descriptor) = hive_target(&[]);
    let err = Compiler::default()
        .compile(&job(), &source, &source_descriptor, &target, &target_descriptor)
        .unwrap_err();
    assert!(matches!(err, LinkError::Configuration(_)));
    assert!(err.to_string().contains(METASTORE_URI));
}

#[test]
fn test_hive_cannot_be_a_source() {
    let (source, source_descriptor) = hive_target(&[(METASTORE_URI, "thrift://m:9083")]);
    let (target, target_descriptor) = jdbc_source();
    let err = Compiler::default()
        .compile(&job(), &source, &source_descriptor, &target, &target_descriptor)
        .unwrap_err();
    assert!(matches!(err, LinkError::Configuration(_)));
    assert!(err.to_string().contains("'Hive' cannot be used as a source"));
}

#[test]
fn test_failed_sink_leaves_no_staged_files() {
    use crate::generator::HiveGenerator;

    let staging = tempfile::tempdir().unwrap();
    let config = CompilerConfig {
        staging_dir: Some(staging.path().to_path_buf()),
        ..CompilerConfig::default()
    };
    let (source, source_descriptor) = jdbc_source();
    let (target, target_descriptor) = hive_target(&[
        (METASTORE_URI, "thrift://hive.internal:9083"),
        ("hive_site_path", "<configuration/>"),
        ("hdfs_site_path", "<configuration/>"),
    ]);
    let job = job().with_mapping(TableMapping::new("shop", "customers", "ods", "customers"));
    let mut ctx = GenerationContext::new(
        &job,
        Endpoint::new(&source, &source_descriptor),
        Endpoint::new(&target, &target_descriptor),
        &config,
        &NoVirtualTables,
    );
    // Only the first mapping has an upstream stage
    ctx.allocate_source_name("orders").unwrap();

    let err = HiveGenerator.generate_sink(&mut ctx).unwrap_err();
    assert!(matches!(err, LinkError::Configuration(_)));
    assert!(err.to_string().contains("customers"));
    assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
}

#[test]
fn test_mappings_share_one_set_of_staged_files() {
    let staging = tempfile::tempdir().unwrap();
    let config = CompilerConfig {
        staging_dir: Some(staging.path().to_path_buf()),
        ..CompilerConfig::default()
    };
    let (source, source_descriptor) = jdbc_source();
    let (target, target_descriptor) = hive_target(&[
        (METASTORE_URI, "thrift://hive.internal:9083"),
        ("krb5_path", "[libdefaults]"),
    ]);
    let job = job().with_mapping(TableMapping::new("shop", "customers", "ods", "customers"));

    let document = Compiler::new(config)
        .compile(&job, &source, &source_descriptor, &target, &target_descriptor)
        .unwrap();

    assert_eq!(document.sink.len(), 2);
    assert_eq!(document.sink[0].get("krb5_path"), document.sink[1].get("krb5_path"));
    assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 1);
}
