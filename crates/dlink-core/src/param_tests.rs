//! Tests for Parameter and Connection

use super::*;
use pretty_assertions::assert_eq;

fn kafka_connection() -> Connection {
    let mut conn = Connection {
        id: 7,
        name: "events".to_string(),
        connector: "Kafka".to_string(),
        host: Some("kafka-1".to_string()),
        port: Some(9092),
        user: Some("svc".to_string()),
        password: Some("s3cret".to_string()),
        ..Connection::default()
    };
    conn.config.insert("broker".to_string(), "kafka-1:9092".to_string());
    conn
}

#[test]
fn test_debug_never_prints_password() {
    let param = Parameter::new("MySQL", "JDBC-MySQL").with_credentials("root", "hunter2");
    let rendered = format!("{:?}", param);
    assert!(!rendered.contains("hunter2"));
    assert!(rendered.contains("***"));

    let rendered = format!("{:?}", kafka_connection());
    assert!(!rendered.contains("s3cret"));
}

#[test]
fn test_require_names_missing_key() {
    let param = Parameter::new("MySQL", "JDBC-MySQL").with_config("url", "  ");
    let err = param.require("url").unwrap_err();
    assert!(matches!(err, LinkError::Configuration(_)));
    assert!(err.to_string().contains("'url'"));
    assert!(err.to_string().contains("MySQL"));
}

#[test]
fn test_flag_defaults() {
    let param = Parameter::new("FTP", FILE_KIND).with_config("passiveMode", "FALSE");
    assert!(!param.flag("passiveMode", true));
    assert!(param.flag("binaryMode", true));
    assert!(param.is_file());
}

#[test]
fn test_properties_rename_broker() {
    let descriptor = DriverDescriptor::table("Kafka", "Kafka");
    let props = kafka_connection().properties(&descriptor);
    assert_eq!(props.get("bootstrap.servers").map(String::as_str), Some("kafka-1:9092"));
    assert!(!props.contains_key("broker"));
    assert_eq!(props.get("port").map(String::as_str), Some("9092"));
    assert_eq!(props.get("type").map(String::as_str), Some("Kafka"));
}

#[test]
fn test_properties_carry_descriptor_driver() {
    let descriptor =
        DriverDescriptor::table("MySQL", "JDBC-MySQL").with_property("driver", "com.mysql.cj.jdbc.Driver");
    let conn = Connection {
        connector: "MySQL".to_string(),
        ..Connection::default()
    };
    let props = conn.properties(&descriptor);
    assert_eq!(props.get("driver").map(String::as_str), Some("com.mysql.cj.jdbc.Driver"));
}

#[test]
fn test_to_parameter_search_path() {
    let mut descriptor = DriverDescriptor::table("MySQL", "JDBC-MySQL");
    let param = kafka_connection().to_parameter(&descriptor);
    assert_eq!(param.search_path.as_deref(), Some("MySQL"));
    assert_eq!(param.kind, "JDBC-MySQL");

    descriptor.search_path = Some("mysql-8.0".to_string());
    let param = kafka_connection().to_parameter(&descriptor);
    assert_eq!(param.search_path.as_deref(), Some("mysql-8.0"));

    let param = kafka_connection().to_parameter(&DriverDescriptor::file("SFTP"));
    assert!(param.is_file());
}
