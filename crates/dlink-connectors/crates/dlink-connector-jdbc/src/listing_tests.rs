use super::*;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dlink_core::{Result, TableField};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

/// Canned metadata that records the scopes it was queried with
#[derive(Default)]
pub(crate) struct FakeBackend {
    pub catalogs: Vec<String>,
    pub schemas: Vec<String>,
    pub tables: Vec<TableRow>,
    pub primary_keys: Vec<String>,
    pub columns: Vec<ColumnRow>,
    pub scopes: Mutex<Vec<(Scope, String)>>,
    pub closed: AtomicBool,
}

impl FakeBackend {
    pub fn with_tables(tables: &[(Option<&str>, &str)]) -> Self {
        Self {
            tables: tables
                .iter()
                .map(|(schema, name)| TableRow {
                    schema: schema.map(str::to_string),
                    name: name.to_string(),
                })
                .collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl CatalogBackend for FakeBackend {
    async fn catalogs(&self) -> Result<Vec<String>> {
        Ok(self.catalogs.clone())
    }

    async fn schemas(&self) -> Result<Vec<String>> {
        Ok(self.schemas.clone())
    }

    async fn tables(&self, scope: &Scope, pattern: &str) -> Result<Vec<TableRow>> {
        self.scopes.lock().push((scope.clone(), pattern.to_string()));
        Ok(self.tables.clone())
    }

    async fn primary_keys(&self, _scope: &Scope, _table: &str) -> Result<Vec<String>> {
        Ok(self.primary_keys.clone())
    }

    async fn columns(&self, scope: &Scope, table: &str, _pattern: &str) -> Result<Vec<ColumnRow>> {
        self.scopes.lock().push((scope.clone(), table.to_string()));
        Ok(self.columns.clone())
    }

    async fn ping(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[tokio::test]
async fn test_system_databases_filtered() {
    let backend = FakeBackend {
        catalogs: names(&["information_schema", "Shop", "mysql", "metrics_schema"]),
        ..FakeBackend::default()
    };
    let mysql = list_databases(Vendor::MySql, &backend).await.unwrap();
    assert_eq!(mysql, names(&["Shop", "metrics_schema"]));

    let tidb = list_databases(Vendor::TiDb, &backend).await.unwrap();
    assert_eq!(tidb, names(&["Shop"]));
}

#[tokio::test]
async fn test_schema_vendors_list_schemas() {
    let backend = FakeBackend {
        catalogs: names(&["ignored"]),
        schemas: names(&["SYS", "SCOTT", "SALES"]),
        ..FakeBackend::default()
    };
    let databases = list_databases(Vendor::Oracle, &backend).await.unwrap();
    assert_eq!(databases, names(&["SALES"]));
}

#[tokio::test]
async fn test_tables_qualified_without_fixed_schema() {
    let backend = FakeBackend::with_tables(&[(Some("dbo"), "orders"), (Some("audit"), "log")]);
    let tables = list_tables(Vendor::SqlServer, &backend, "shop", None).await.unwrap();
    assert_eq!(tables, names(&["dbo.orders", "audit.log"]));

    let scopes = backend.scopes.lock();
    assert_eq!(scopes[0], (Scope::catalog("shop"), "%".to_string()));
}

#[tokio::test]
async fn test_tables_unqualified_with_fixed_schema() {
    let backend = FakeBackend::with_tables(&[(Some("public"), "orders")]);
    let tables = list_tables(Vendor::Postgres, &backend, "shop", Some("ord%"))
        .await
        .unwrap();
    assert_eq!(tables, names(&["orders"]));
    assert_eq!(backend.scopes.lock()[0].1, "ord%");
}

#[tokio::test]
async fn test_tables_without_schema_rows_stay_bare() {
    let backend = FakeBackend::with_tables(&[(None, "orders")]);
    let tables = list_tables(Vendor::MySql, &backend, "shop", None).await.unwrap();
    assert_eq!(tables, names(&["orders"]));
}

#[tokio::test]
async fn test_columns_flag_primary_keys() {
    let backend = FakeBackend {
        primary_keys: names(&["id"]),
        columns: vec![
            ColumnRow {
                name: "id".into(),
                type_name: "bigint".into(),
                nullable: false,
            },
            ColumnRow {
                name: "name".into(),
                type_name: "varchar(64)".into(),
                nullable: true,
            },
        ],
        ..FakeBackend::default()
    };
    let fields = list_columns(Vendor::MySql, &backend, "shop", "users", None)
        .await
        .unwrap();
    assert_eq!(
        fields,
        vec![
            TableField {
                name: "id".into(),
                data_type: "bigint".into(),
                nullable: false,
                primary_key: true,
            },
            TableField::new("name", "varchar(64)"),
        ]
    );
}

#[tokio::test]
async fn test_qualified_table_name_sets_schema() {
    let backend = FakeBackend::default();
    list_columns(Vendor::SqlServer, &backend, "shop", "dbo.orders", None)
        .await
        .unwrap();
    let scopes = backend.scopes.lock();
    assert_eq!(
        scopes[0],
        (Scope::catalog("shop").with_schema("dbo"), "orders".to_string())
    );
}
