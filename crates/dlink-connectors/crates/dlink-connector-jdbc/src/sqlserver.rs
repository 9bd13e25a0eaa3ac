//! SQL Server metadata backend (SQLServer, SQLServer-CDC)
//!
//! One TDS session serves every catalog. Queries against another database
//! use three-part names (`[db].INFORMATION_SCHEMA.TABLES`).

use async_trait::async_trait;
use dlink_core::{LinkError, Result};
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, Row};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::catalog::{CatalogBackend, ColumnRow, Scope, TableRow};
use crate::target::JdbcTarget;

type TdsClient = Client<Compat<TcpStream>>;

pub struct SqlServerBackend {
    endpoint: String,
    client: Mutex<Option<TdsClient>>,
}

impl SqlServerBackend {
    #[tracing::instrument(skip(target), fields(endpoint = %target.endpoint()))]
    pub async fn connect(target: &JdbcTarget) -> Result<Self> {
        let config = tds_config(target);
        let endpoint = target.endpoint();

        let connect = async {
            let tcp = TcpStream::connect(config.get_addr()).await?;
            tcp.set_nodelay(true)?;
            let client = Client::connect(config, tcp.compat_write())
                .await
                .map_err(|e| LinkError::Connectivity(e.to_string()))?;
            Ok::<_, LinkError>(client)
        };
        let client = match tokio::time::timeout(target.connect_timeout(), connect).await {
            Ok(Ok(client)) => client,
            Ok(Err(e)) => {
                return Err(LinkError::Connectivity(format!(
                    "failed to connect to {}: {}",
                    endpoint, e
                )));
            }
            Err(_) => {
                return Err(LinkError::Connectivity(format!(
                    "timed out connecting to {}",
                    endpoint
                )));
            }
        };
        tracing::info!(endpoint = %endpoint, database = ?target.database, "SQL Server connection established");
        Ok(Self {
            endpoint,
            client: Mutex::new(Some(client)),
        })
    }

    async fn rows(&self, what: &str, sql: &str, params: &[&str]) -> Result<Vec<Row>> {
        let mut guard = self.client.lock().await;
        let client = guard.as_mut().ok_or_else(|| {
            LinkError::Connectivity(format!("SQL Server connection to {} is closed", self.endpoint))
        })?;
        let params: Vec<&dyn tiberius::ToSql> =
            params.iter().map(|p| p as &dyn tiberius::ToSql).collect();
        let stream = client
            .query(sql, &params[..])
            .await
            .map_err(|e| query_error(what, e))?;
        stream
            .into_first_result()
            .await
            .map_err(|e| query_error(what, e))
    }
}

/// TDS settings for `target`.
///
/// `encrypt` and `trustServerCertificate` follow the JDBC driver's options.
pub(crate) fn tds_config(target: &JdbcTarget) -> Config {
    let mut config = Config::new();
    config.host(&target.host);
    config.port(target.port);
    if let Some(database) = &target.database {
        config.database(database);
    }
    if let Some(name) = target.option("applicationName") {
        config.application_name(name);
    }
    if target.flag("trustServerCertificate") {
        config.trust_cert();
    }
    let encryption = match target.option("encrypt").map(str::to_ascii_lowercase).as_deref() {
        Some("false") => EncryptionLevel::Off,
        Some("true") | Some("mandatory") | Some("strict") => EncryptionLevel::Required,
        _ => EncryptionLevel::On,
    };
    config.encryption(encryption);
    config.authentication(AuthMethod::sql_server(
        target.user.as_deref().unwrap_or_default(),
        target.password.as_deref().unwrap_or_default(),
    ));
    config
}

fn query_error(what: &str, e: tiberius::error::Error) -> LinkError {
    LinkError::Other(format!("failed to {}: {}", what, e))
}

/// `[catalog].` prefix for three-part names, empty for the session database
fn catalog_prefix(scope: &Scope) -> String {
    match &scope.catalog {
        Some(catalog) => format!("[{}].", catalog.replace(']', "]]")),
        None => String::new(),
    }
}

fn text(row: &Row, idx: usize) -> Result<String> {
    row.try_get::<&str, _>(idx)
        .map_err(|e| LinkError::Other(format!("unexpected SQL Server column type: {}", e)))
        .map(|value| value.unwrap_or_default().to_string())
}

#[async_trait]
impl CatalogBackend for SqlServerBackend {
    async fn catalogs(&self) -> Result<Vec<String>> {
        let rows = self
            .rows("list databases", "SELECT name FROM sys.databases ORDER BY name", &[])
            .await?;
        rows.iter().map(|row| text(row, 0)).collect()
    }

    async fn schemas(&self) -> Result<Vec<String>> {
        let rows = self
            .rows("list schemas", "SELECT name FROM sys.schemas ORDER BY name", &[])
            .await?;
        rows.iter().map(|row| text(row, 0)).collect()
    }

    async fn tables(&self, scope: &Scope, pattern: &str) -> Result<Vec<TableRow>> {
        let mut sql = format!(
            "SELECT TABLE_SCHEMA, TABLE_NAME FROM {}INFORMATION_SCHEMA.TABLES \
             WHERE TABLE_NAME LIKE @P1 AND TABLE_TYPE IN ('BASE TABLE', 'VIEW')",
            catalog_prefix(scope)
        );
        let mut params = vec![pattern];
        if let Some(schema) = scope.schema.as_deref() {
            sql.push_str(" AND TABLE_SCHEMA = @P2");
            params.push(schema);
        }
        sql.push_str(" ORDER BY TABLE_SCHEMA, TABLE_NAME");

        let rows = self.rows("list tables", &sql, &params).await?;
        rows.iter()
            .map(|row| {
                Ok(TableRow {
                    schema: Some(text(row, 0)?),
                    name: text(row, 1)?,
                })
            })
            .collect()
    }

    async fn primary_keys(&self, scope: &Scope, table: &str) -> Result<Vec<String>> {
        let prefix = catalog_prefix(scope);
        let mut sql = format!(
            "SELECT kcu.COLUMN_NAME FROM {p}INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc \
             JOIN {p}INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu \
             ON tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME AND tc.TABLE_SCHEMA = kcu.TABLE_SCHEMA \
             WHERE tc.CONSTRAINT_TYPE = 'PRIMARY KEY' AND kcu.TABLE_NAME = @P1",
            p = prefix
        );
        let mut params = vec![table];
        if let Some(schema) = scope.schema.as_deref() {
            sql.push_str(" AND kcu.TABLE_SCHEMA = @P2");
            params.push(schema);
        }
        sql.push_str(" ORDER BY kcu.ORDINAL_POSITION");

        let rows = self.rows("list primary keys", &sql, &params).await?;
        rows.iter().map(|row| text(row, 0)).collect()
    }

    async fn columns(&self, scope: &Scope, table: &str, pattern: &str) -> Result<Vec<ColumnRow>> {
        let mut sql = format!(
            "SELECT COLUMN_NAME, DATA_TYPE, IS_NULLABLE FROM {}INFORMATION_SCHEMA.COLUMNS \
             WHERE TABLE_NAME = @P1 AND COLUMN_NAME LIKE @P2",
            catalog_prefix(scope)
        );
        let mut params = vec![table, pattern];
        if let Some(schema) = scope.schema.as_deref() {
            sql.push_str(" AND TABLE_SCHEMA = @P3");
            params.push(schema);
        }
        sql.push_str(" ORDER BY ORDINAL_POSITION");

        let rows = self.rows("list columns", &sql, &params).await?;
        rows.iter()
            .map(|row| {
                Ok(ColumnRow {
                    name: text(row, 0)?,
                    type_name: text(row, 1)?,
                    nullable: text(row, 2)?.eq_ignore_ascii_case("YES"),
                })
            })
            .collect()
    }

    async fn ping(&self) -> bool {
        self.rows("ping", "SELECT 1", &[]).await.is_ok()
    }

    async fn close(&self) -> Result<()> {
        match self.client.lock().await.take() {
            Some(client) => client
                .close()
                .await
                .map_err(|e| query_error("close SQL Server connection", e)),
            None => Ok(()),
        }
    }
}
