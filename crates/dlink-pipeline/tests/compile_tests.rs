//! End-to-end compilation of jobs across connector families

use std::sync::Arc;

use dlink_core::{
    CompilerConfig, Connection, DriverDescriptor, FieldMapping, LinkError, StageKeys, TableMapping,
    WriteMode,
};
use dlink_pipeline::{
    Compiler, JobDescriptor, JobMode, PLUGIN_KEY, StaticCatalog, VirtualField, VirtualTable,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn connection(id: i64, connector: &str) -> Connection {
    Connection {
        id,
        name: format!("conn-{}", id),
        connector: connector.to_string(),
        host: Some("db.internal".into()),
        port: Some(3306),
        user: Some("etl".into()),
        password: Some("secret".into()),
        ..Connection::default()
    }
}

fn mysql() -> DriverDescriptor {
    DriverDescriptor::table("MySQL", "JDBC-MySQL").with_property("driver", "com.mysql.cj.jdbc.Driver")
}

fn kafka() -> DriverDescriptor {
    let mut descriptor = DriverDescriptor::table("Kafka", "Kafka");
    descriptor.is_stream = true;
    descriptor.virtual_table = true;
    descriptor
}

fn orders_mapping() -> TableMapping {
    TableMapping::new("shop", "orders", "dw", "orders_copy").with_fields(vec![
        FieldMapping::new("name", "name"),
        FieldMapping::new("id", "order_id").primary_key(),
    ])
}

#[test]
fn test_jdbc_to_jdbc_document() {
    let mut source = connection(1, "MySQL");
    source.config.insert("url".into(), "jdbc:mysql://db.internal:3306/shop".into());
    let target = connection(2, "MySQL");
    let job = JobDescriptor::new(9, "orders")
        .with_mapping(orders_mapping().with_filter("status = 'paid'").with_write_mode(WriteMode::Upsert));

    let document = Compiler::default()
        .compile(&job, &source, &mysql(), &target, &mysql())
        .unwrap();

    assert_eq!(document.env.mode, JobMode::Batch);
    assert_eq!(document.env.name, "9_orders");
    assert!(document.transform.is_empty());

    let read = &document.source[0];
    assert_eq!(read.plugin(), Some("Jdbc"));
    assert_eq!(read.get_str("url"), Some("jdbc:mysql://db.internal:3306/shop"));
    assert_eq!(read.get_str("driver"), Some("com.mysql.cj.jdbc.Driver"));
    assert_eq!(read.get_str("result_stage_name"), Some("TableSource_orders_9"));
    assert_eq!(
        read.get_str("query"),
        Some("SELECT `id` AS `order_id`,`name` FROM shop.orders WHERE status = 'paid'")
    );
    assert_eq!(read.get("parallelism"), Some(&json!(1)));

    let write = &document.sink[0];
    assert_eq!(write.get_str("source_stage_ref"), Some("TableSource_orders_9"));
    assert_eq!(write.get_str("database"), Some("dw"));
    assert_eq!(write.get_str("table"), Some("orders_copy"));
    assert_eq!(write.get("enable_upsert"), Some(&json!(true)));
    assert_eq!(write.get("primary_keys"), Some(&json!(["order_id"])));
    assert_eq!(write.get("batch_size"), Some(&json!(1000)));
    assert_eq!(write.get("max_commit_attempts"), Some(&json!(3)));
    assert_eq!(write.get("max_retries"), Some(&json!(1)));
}

#[test]
fn test_document_sections_serialize_in_order() {
    let job = JobDescriptor::new(1, "j").with_mapping(TableMapping::new("a", "t", "b", "t"));
    let c = connection(1, "MySQL");
    let document = Compiler::default().compile(&job, &c, &mysql(), &c, &mysql()).unwrap();
    let text = document.to_json().unwrap();

    let positions: Vec<usize> = ["\"env\"", "\"source\"", "\"transform\"", "\"sink\""]
        .iter()
        .map(|section| text.find(section).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert!(text.contains("\"job.mode\":\"BATCH\""));
    assert!(text.contains(&format!("\"{}\":\"Jdbc\"", PLUGIN_KEY)));
}

#[test]
fn test_upsert_requested_without_keys_is_disabled() {
    let mapping = TableMapping::new("a", "t", "b", "t")
        .with_fields(vec![FieldMapping::new("v", "v")])
        .with_write_mode(WriteMode::Upsert);
    let job = JobDescriptor::new(1, "j").with_mapping(mapping);
    let c = connection(1, "MySQL");
    let document = Compiler::default().compile(&job, &c, &mysql(), &c, &mysql()).unwrap();

    assert_eq!(document.sink[0].get("enable_upsert"), Some(&json!(false)));
    assert!(document.sink[0].get("primary_keys").is_none());
}

#[test]
fn test_unknown_family_fails_before_generation() {
    let job = JobDescriptor::new(1, "j").with_mapping(orders_mapping());
    let c = connection(1, "Mongo");
    let mongo = DriverDescriptor::table("MongoDB", "Document-Mongo");
    let err = Compiler::default()
        .compile(&job, &c, &mongo, &c, &mysql())
        .unwrap_err();
    assert!(matches!(err, LinkError::Configuration(_)));
    assert!(err.to_string().contains("MongoDB"));
}

#[test]
fn test_job_without_mappings_is_rejected() {
    let c = connection(1, "MySQL");
    let err = Compiler::default()
        .compile(&JobDescriptor::new(3, "empty"), &c, &mysql(), &c, &mysql())
        .unwrap_err();
    assert!(matches!(err, LinkError::Configuration(_)));
}

#[test]
fn test_same_source_table_twice_is_rejected() {
    let job = JobDescriptor::new(1, "j")
        .with_mapping(orders_mapping())
        .with_mapping(orders_mapping());
    let c = connection(1, "MySQL");
    let err = Compiler::default().compile(&job, &c, &mysql(), &c, &mysql()).unwrap_err();
    assert!(matches!(err, LinkError::Configuration(_)));
}

#[test]
fn test_sink_only_descriptor_cannot_read() {
    let job = JobDescriptor::new(1, "j").with_mapping(orders_mapping());
    let c = connection(1, "MySQL");
    let write_only = mysql().with_roles(false, true);
    let err = Compiler::default()
        .compile(&job, &c, &write_only, &c, &mysql())
        .unwrap_err();
    assert!(err.to_string().contains("cannot be used as a source"));
}

#[test]
fn test_cdc_source_renames_url_and_user() {
    let mut source = connection(1, "MySQL-CDC");
    source.config.insert("url".into(), "jdbc:mysql://db.internal:3306".into());
    let cdc = DriverDescriptor::table("MySQL-CDC", "MySQL-CDC");
    let job = JobDescriptor::new(4, "cdc")
        .with_mode(JobMode::Streaming)
        .with_mapping(orders_mapping());
    let target = connection(2, "MySQL");

    let document = Compiler::default()
        .compile(&job, &source, &cdc, &target, &mysql())
        .unwrap();
    let read = &document.source[0];

    assert_eq!(document.env.mode, JobMode::Streaming);
    assert_eq!(read.plugin(), Some("MySQL-CDC"));
    assert_eq!(read.get_str("base-url"), Some("jdbc:mysql://db.internal:3306"));
    assert_eq!(read.get_str("username"), Some("etl"));
    assert_eq!(read.get_str("url"), Some("jdbc:mysql://db.internal:3306"));
    assert_eq!(read.get("table-names"), Some(&json!(["shop.orders"])));
    assert_eq!(document.sink[0].get_str("source_stage_ref"), Some("TableSource_orders_4"));
}

#[test]
fn test_cdc_cannot_be_a_sink() {
    let job = JobDescriptor::new(1, "j").with_mapping(orders_mapping());
    let c = connection(1, "MySQL");
    let cdc = DriverDescriptor::table("MySQL-CDC", "MySQL-CDC");
    let err = Compiler::default().compile(&job, &c, &mysql(), &c, &cdc).unwrap_err();
    assert!(err.to_string().contains("cannot be used as a sink"));
}

fn kafka_catalog(source_table: VirtualTable) -> Arc<StaticCatalog> {
    Arc::new(
        StaticCatalog::default()
            .with_virtual_table(1, "default", "clicks", source_table)
            .with_virtual_table(2, "default", "clicks_out", VirtualTable::new("json").with_config("topic", "clicks_out")),
    )
}

#[test]
fn test_kafka_text_to_jdbc() {
    let table = VirtualTable::new("text")
        .with_config("topic", "clicks")
        .with_field(VirtualField::new("user", "0", "string"))
        .with_field(VirtualField::new("url", "2", "string"));
    let mut source = connection(1, "Kafka");
    source.config.insert("broker".into(), "kafka:9092".into());
    let job = JobDescriptor::new(8, "clicks").with_mapping(
        TableMapping::new("default", "clicks", "dw", "clicks").with_fields(vec![
            FieldMapping::new("user", "user_name"),
            FieldMapping::new("url", "url"),
        ]),
    );

    let document = Compiler::default()
        .with_virtual_tables(kafka_catalog(table))
        .compile(&job, &source, &kafka(), &connection(2, "MySQL"), &mysql())
        .unwrap();

    let read = &document.source[0];
    assert_eq!(read.get_str("bootstrap.servers"), Some("kafka:9092"));
    assert_eq!(read.get_str("topic"), Some("clicks"));
    assert_eq!(read.get_str("format"), Some("text"));
    let columns: Vec<&String> = read.get("schema").unwrap()["fields"]
        .as_object()
        .unwrap()
        .keys()
        .collect();
    assert_eq!(columns, vec!["user", "_unused_1", "url"]);

    assert_eq!(document.transform.len(), 1);
    let project = &document.transform[0];
    assert_eq!(project.plugin(), Some("Sql"));
    assert_eq!(project.get_str("source_stage_ref"), Some("TableSource_clicks_8"));
    assert_eq!(project.get_str("result_stage_name"), Some("TableTransform_clicks_8"));
    assert_eq!(
        project.get_str("query"),
        Some("SELECT user AS user_name, url FROM TableSource_clicks_8")
    );

    assert_eq!(document.sink[0].get_str("source_stage_ref"), Some("TableTransform_clicks_8"));
}

#[test]
fn test_kafka_json_extracts_then_renames() {
    let table = VirtualTable::new("json")
        .with_field(VirtualField::new("user", "$.user.id", "bigint"))
        .with_field(VirtualField::new("page", "$.page", "string"));
    let config = CompilerConfig {
        json_source_field: "payload".to_string(),
        ..CompilerConfig::default()
    };
    let job = JobDescriptor::new(3, "events").with_mapping(
        TableMapping::new("default", "clicks", "default", "clicks_out")
            .with_fields(vec![FieldMapping::new("user", "uid")]),
    );

    let document = Compiler::new(config)
        .with_virtual_tables(kafka_catalog(table))
        .compile(&job, &connection(1, "Kafka"), &kafka(), &connection(2, "Kafka"), &kafka())
        .unwrap();

    assert_eq!(
        document.source[0].get("schema"),
        Some(&json!({"fields": {"payload": "string"}}))
    );

    let [extract, rename] = document.transform.as_slice() else {
        panic!("expected two transform stages, got {}", document.transform.len());
    };
    assert_eq!(extract.plugin(), Some("JsonPath"));
    assert_eq!(extract.get_str("source_stage_ref"), Some("TableSource_clicks_3"));
    assert_eq!(extract.get_str("result_stage_name"), Some("TableExtract_clicks_3"));
    assert_eq!(
        extract.get("columns"),
        Some(&json!([{
            "src_field": "payload",
            "path": "$.user.id",
            "dest_field": "user",
            "dest_type": "bigint"
        }]))
    );

    assert_eq!(rename.plugin(), Some("FieldMapper"));
    assert_eq!(rename.get_str("source_stage_ref"), Some("TableExtract_clicks_3"));
    assert_eq!(rename.get("field_mapper"), Some(&json!({"user": "uid"})));

    let write = &document.sink[0];
    assert_eq!(write.plugin(), Some("Kafka"));
    assert_eq!(write.get_str("topic"), Some("clicks_out"));
    assert_eq!(write.get_str("format"), Some("json"));
    assert_eq!(write.get_str("source_stage_ref"), Some("TableTransform_clicks_3"));
}

#[test]
fn test_kafka_without_virtual_table_fails() {
    let job = JobDescriptor::new(1, "j").with_mapping(TableMapping::new("default", "clicks", "dw", "t"));
    let err = Compiler::default()
        .compile(&job, &connection(1, "Kafka"), &kafka(), &connection(2, "MySQL"), &mysql())
        .unwrap_err();
    assert!(matches!(err, LinkError::NotFound(_)));
}

#[test]
fn test_custom_stage_keys() {
    let config = CompilerConfig {
        stage_keys: StageKeys {
            input: "source_table_name".into(),
            output: "result_table_name".into(),
        },
        ..CompilerConfig::default()
    };
    let job = JobDescriptor::new(2, "j").with_mapping(TableMapping::new("a", "t", "b", "t"));
    let c = connection(1, "MySQL");
    let document = Compiler::new(config).compile(&job, &c, &mysql(), &c, &mysql()).unwrap();

    assert_eq!(document.source[0].get_str("result_table_name"), Some("TableSource_t_2"));
    assert_eq!(document.sink[0].get_str("source_table_name"), Some("TableSource_t_2"));
    assert!(document.sink[0].get("source_stage_ref").is_none());
}

#[test]
fn test_compile_job_resolves_through_catalog() {
    let catalog = StaticCatalog::default()
        .with_connection(connection(1, "MySQL"))
        .with_connection(connection(2, "mysql"))
        .with_descriptor(mysql());
    let job = JobDescriptor::new(6, "j")
        .with_connections(1, 2)
        .with_mapping(orders_mapping());

    let document = Compiler::default().compile_job(&catalog, &job).unwrap();
    assert_eq!(document.sink[0].get_str("database"), Some("dw"));

    let missing = job.clone().with_connections(1, 99);
    assert!(matches!(
        Compiler::default().compile_job(&catalog, &missing),
        Err(LinkError::NotFound(_))
    ));
}
