//! MySQL-wire metadata backend (MySQL, TiDB)

use async_trait::async_trait;
use dlink_core::{LinkError, Result};
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts, SslOpts};

use crate::catalog::{CatalogBackend, ColumnRow, Scope, TableRow};
use crate::target::JdbcTarget;

pub struct MySqlBackend {
    pool: Pool,
}

impl MySqlBackend {
    /// Open a small pool and verify one connection can be acquired
    pub async fn connect(target: &JdbcTarget) -> Result<Self> {
        tracing::info!(endpoint = %target.endpoint(), database = ?target.database, "connecting to MySQL-wire server");

        let pool = Pool::new(mysql_opts(target)?);
        let probe = tokio::time::timeout(target.connect_timeout(), pool.get_conn()).await;
        match probe {
            Ok(Ok(_conn)) => {}
            Ok(Err(e)) => {
                return Err(LinkError::Connectivity(format!(
                    "failed to connect to {}: {}",
                    target.endpoint(),
                    e
                )));
            }
            Err(_) => {
                return Err(LinkError::Connectivity(format!(
                    "timed out connecting to {}",
                    target.endpoint()
                )));
            }
        }
        Ok(Self { pool })
    }

    async fn conn(&self) -> Result<Conn> {
        self.pool
            .get_conn()
            .await
            .map_err(|e| LinkError::Connectivity(format!("failed to get MySQL connection: {}", e)))
    }
}

/// Pool options for `target`.
///
/// `useSSL` and `sslMode` follow Connector/J: `REQUIRED` encrypts without
/// verifying the server, the `VERIFY_*` modes verify it.
pub(crate) fn mysql_opts(target: &JdbcTarget) -> Result<Opts> {
    let constraints = PoolConstraints::new(1, 2).ok_or_else(|| {
        LinkError::Configuration("invalid MySQL pool constraints (min=1, max=2)".into())
    })?;
    let mut builder = OptsBuilder::from_opts(Opts::default())
        .ip_or_hostname(target.host.as_str())
        .tcp_port(target.port)
        .db_name(target.database.as_deref())
        .user(target.user.as_deref())
        .pass(target.password.as_deref())
        .pool_opts(PoolOpts::default().with_constraints(constraints));

    let ssl_mode = match target.option("sslMode") {
        Some(mode) => mode.to_ascii_uppercase(),
        None if target.flag("useSSL") => "REQUIRED".to_string(),
        None => "DISABLED".to_string(),
    };
    builder = match ssl_mode.as_str() {
        "DISABLED" | "PREFERRED" => builder,
        "REQUIRED" => builder.ssl_opts(SslOpts::default().with_danger_accept_invalid_certs(true)),
        "VERIFY_CA" | "VERIFY_IDENTITY" => builder.ssl_opts(SslOpts::default()),
        other => {
            return Err(LinkError::Configuration(format!(
                "unknown MySQL sslMode '{}'",
                other
            )));
        }
    };
    Ok(builder.into())
}

fn query_error(what: &str, e: mysql_async::Error) -> LinkError {
    LinkError::Other(format!("failed to {}: {}", what, e))
}

#[async_trait]
impl CatalogBackend for MySqlBackend {
    async fn catalogs(&self) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        conn.query::<String, _>("SHOW DATABASES")
            .await
            .map_err(|e| query_error("list databases", e))
    }

    async fn schemas(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn tables(&self, scope: &Scope, pattern: &str) -> Result<Vec<TableRow>> {
        let mut conn = self.conn().await?;
        let names: Vec<String> = conn
            .exec(
                "SELECT TABLE_NAME FROM information_schema.TABLES \
                 WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME LIKE ? \
                 AND TABLE_TYPE IN ('BASE TABLE', 'VIEW') \
                 ORDER BY TABLE_NAME",
                (scope.database(), pattern),
            )
            .await
            .map_err(|e| query_error("list tables", e))?;
        Ok(names
            .into_iter()
            .map(|name| TableRow { schema: None, name })
            .collect())
    }

    async fn primary_keys(&self, scope: &Scope, table: &str) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        conn.exec(
            "SELECT COLUMN_NAME FROM information_schema.KEY_COLUMN_USAGE \
             WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ? \
             AND CONSTRAINT_NAME = 'PRIMARY' \
             ORDER BY ORDINAL_POSITION",
            (scope.database(), table),
        )
        .await
        .map_err(|e| query_error("list primary keys", e))
    }

    async fn columns(&self, scope: &Scope, table: &str, pattern: &str) -> Result<Vec<ColumnRow>> {
        let mut conn = self.conn().await?;
        let rows: Vec<(String, String, String)> = conn
            .exec(
                "SELECT COLUMN_NAME, COLUMN_TYPE, IS_NULLABLE FROM information_schema.COLUMNS \
                 WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ? AND COLUMN_NAME LIKE ? \
                 ORDER BY ORDINAL_POSITION",
                (scope.database(), table, pattern),
            )
            .await
            .map_err(|e| query_error("list columns", e))?;
        Ok(rows
            .into_iter()
            .map(|(name, type_name, nullable)| ColumnRow {
                name,
                type_name,
                nullable: nullable.eq_ignore_ascii_case("YES"),
            })
            .collect())
    }

    async fn ping(&self) -> bool {
        match self.conn().await {
            Ok(mut conn) => conn.ping().await.is_ok(),
            Err(_) => false,
        }
    }

    async fn close(&self) -> Result<()> {
        self.pool
            .clone()
            .disconnect()
            .await
            .map_err(|e| query_error("close MySQL pool", e))
    }
}
