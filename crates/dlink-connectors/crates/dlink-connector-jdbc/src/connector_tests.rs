use super::*;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use dlink_core::{LinkError, Parameter, TableConnector};
use pretty_assertions::assert_eq;

use crate::listing_tests::FakeBackend;

/// Delegates to a shared fake so the test can inspect it afterwards
struct Shared(Arc<FakeBackend>);

#[async_trait::async_trait]
impl CatalogBackend for Shared {
    async fn catalogs(&self) -> dlink_core::Result<Vec<String>> {
        self.0.catalogs().await
    }

    async fn schemas(&self) -> dlink_core::Result<Vec<String>> {
        self.0.schemas().await
    }

    async fn tables(&self, scope: &Scope, pattern: &str) -> dlink_core::Result<Vec<TableRow>> {
        self.0.tables(scope, pattern).await
    }

    async fn primary_keys(&self, scope: &Scope, table: &str) -> dlink_core::Result<Vec<String>> {
        self.0.primary_keys(scope, table).await
    }

    async fn columns(
        &self,
        scope: &Scope,
        table: &str,
        pattern: &str,
    ) -> dlink_core::Result<Vec<ColumnRow>> {
        self.0.columns(scope, table, pattern).await
    }

    async fn ping(&self) -> bool {
        self.0.ping().await
    }

    async fn close(&self) -> dlink_core::Result<()> {
        self.0.close().await
    }
}

#[test]
fn test_listing_through_connector() {
    let fake = Arc::new(FakeBackend {
        catalogs: vec!["postgres".into(), "shop".into()],
        ..FakeBackend::with_tables(&[(Some("public"), "orders")])
    });
    let mut connector = JdbcConnector::with_backend(
        "PostgreSQL",
        Vendor::Postgres,
        Box::new(Shared(Arc::clone(&fake))),
    );

    assert_eq!(connector.list_databases().unwrap(), vec!["shop".to_string()]);
    assert_eq!(connector.list_tables("shop").unwrap(), vec!["orders".to_string()]);
    assert!(connector.test_connectivity());

    connector.close().unwrap();
    assert!(fake.closed.load(Ordering::SeqCst));
    assert!(!connector.test_connectivity());
    assert!(connector.list_databases().is_err());
}

#[test]
fn test_uninitialized_connector_fails_cleanly() {
    let mut connector = JdbcConnector::new("MySQL", Vendor::MySql);
    assert_eq!(connector.name(), "MySQL");
    assert!(!connector.test_connectivity());
    let err = connector.list_tables("shop").unwrap_err();
    assert!(matches!(err, LinkError::Connectivity(_)));
    assert!(connector.close().is_ok());
}

#[test]
fn test_sqlserver_listing_through_connector() {
    let fake = Arc::new(FakeBackend {
        catalogs: vec!["master".into(), "tempdb".into(), "Sales".into()],
        primary_keys: vec!["OrderID".into()],
        columns: vec![
            ColumnRow {
                name: "OrderID".into(),
                type_name: "int".into(),
                nullable: false,
            },
            ColumnRow {
                name: "Note".into(),
                type_name: "nvarchar".into(),
                nullable: true,
            },
        ],
        ..FakeBackend::with_tables(&[(Some("dbo"), "Orders"), (Some("audit"), "Log")])
    });
    let mut connector = JdbcConnector::with_backend(
        "SQLServer-CDC",
        Vendor::SqlServer,
        Box::new(Shared(Arc::clone(&fake))),
    );

    assert_eq!(connector.list_databases().unwrap(), vec!["Sales".to_string()]);
    assert_eq!(
        connector.list_tables("Sales").unwrap(),
        vec!["dbo.Orders".to_string(), "audit.Log".to_string()]
    );
    let fields = connector.list_columns("Sales", "dbo.Orders").unwrap();
    assert_eq!(fields.len(), 2);
    assert!(fields[0].primary_key);
    assert!(!fields[1].primary_key);
    assert_eq!(
        fake.scopes.lock().last().cloned(),
        Some((Scope::catalog("Sales").with_schema("dbo"), "Orders".to_string()))
    );
}

#[test]
fn test_vendors_without_backend_are_not_supported() {
    for (name, vendor) in [("Oracle", Vendor::Oracle), ("DM", Vendor::Dm)] {
        let mut connector = JdbcConnector::new(name, vendor);
        let param = Parameter::new(name, format!("JDBC-{}", name))
            .with_config("url", "jdbc:mysql://localhost:3306/x");
        let err = connector.initialize(&param).unwrap_err();
        assert!(matches!(err, LinkError::NotSupported(_)), "{}: {}", name, err);
    }
}

#[test]
fn test_sqlserver_initialize_reaches_the_server() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut connector = JdbcConnector::new("SQLServer", Vendor::SqlServer);
    let param = Parameter::new("SQLServer", "JDBC-SQLServer")
        .with_credentials("sa", "secret")
        .with_config(
            "url",
            format!("jdbc:sqlserver://127.0.0.1:{};databaseName=Sales", port),
        )
        .with_config("connectionTimeout", "500");
    let err = connector.initialize(&param).unwrap_err();
    assert!(matches!(err, LinkError::Connectivity(_)), "{}", err);
    assert!(!err.to_string().contains("secret"));
}

#[test]
fn test_missing_url_is_configuration_error() {
    let mut connector = JdbcConnector::new("MySQL", Vendor::MySql);
    let err = connector
        .initialize(&Parameter::new("MySQL", "JDBC-MySQL"))
        .unwrap_err();
    assert!(matches!(err, LinkError::Configuration(_)));
}

#[test]
fn test_providers_cover_relational_connectors() {
    let providers = crate::providers();
    for name in ["mysql", "TiDB", "PostgreSQL", "KingbaseES", "Oracle", "DM", "SQLServer", "JDBC"] {
        assert!(providers.iter().any(|p| p.matches(name)), "{}", name);
    }
    assert!(providers.iter().all(|p| !p.is_file()));
    assert!(dlink_connector_declaration.is_compatible());
}
