//! PostgreSQL-wire metadata backend (PostgreSQL, KingbaseES)
//!
//! A PostgreSQL session is bound to one database, so a client is opened per
//! catalog on first use and kept until the backend is closed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dlink_core::{LinkError, Result};
use parking_lot::Mutex;
use tokio_postgres::config::SslMode;
use tokio_postgres::{Client, Config, NoTls};

use crate::catalog::{CatalogBackend, ColumnRow, Scope, TableRow};
use crate::target::JdbcTarget;

const MAINTENANCE_DATABASE: &str = "postgres";

pub struct PostgresBackend {
    config: Config,
    endpoint: String,
    database: String,
    clients: Mutex<HashMap<String, Arc<Client>>>,
}

impl PostgresBackend {
    /// Connect to the target's database, or the maintenance database when
    /// the URL names none
    pub async fn connect(target: &JdbcTarget) -> Result<Self> {
        let config = pg_config(target)?;

        let backend = Self {
            config,
            endpoint: target.endpoint(),
            database: target
                .database
                .clone()
                .unwrap_or_else(|| MAINTENANCE_DATABASE.to_string()),
            clients: Mutex::new(HashMap::new()),
        };
        backend.client(None).await?;
        tracing::info!(endpoint = %backend.endpoint, database = %backend.database, "PostgreSQL-wire connection established");
        Ok(backend)
    }

    async fn client(&self, catalog: Option<&str>) -> Result<Arc<Client>> {
        let database = catalog.unwrap_or(&self.database).to_string();
        if let Some(client) = self.clients.lock().get(&database) {
            if !client.is_closed() {
                return Ok(Arc::clone(client));
            }
        }

        let mut config = self.config.clone();
        config.dbname(&database);
        let (client, connection) = config.connect(NoTls).await.map_err(|e| {
            LinkError::Connectivity(format!(
                "failed to connect to {}/{}: {}",
                self.endpoint, database, e
            ))
        })?;
        let endpoint = self.endpoint.clone();
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(endpoint = %endpoint, error = %e, "PostgreSQL connection error");
            }
        });

        let client = Arc::new(client);
        self.clients.lock().insert(database, Arc::clone(&client));
        Ok(client)
    }

    async fn strings(&self, catalog: Option<&str>, sql: &str, what: &str) -> Result<Vec<String>> {
        let client = self.client(catalog).await?;
        let rows = client.query(sql, &[]).await.map_err(|e| query_error(what, e))?;
        Ok(rows.iter().map(|row| row.get::<_, String>(0)).collect())
    }
}

fn query_error(what: &str, e: tokio_postgres::Error) -> LinkError {
    LinkError::Other(format!("failed to {}: {}", what, e))
}

/// Session settings for `target`.
///
/// `sslmode` follows pgJDBC. Sessions are unencrypted, so modes that demand
/// TLS are refused instead of being silently downgraded.
pub(crate) fn pg_config(target: &JdbcTarget) -> Result<Config> {
    let mut config = Config::new();
    config
        .host(&target.host)
        .port(target.port)
        .connect_timeout(target.connect_timeout());
    if let Some(user) = &target.user {
        config.user(user);
    }
    if let Some(password) = &target.password {
        config.password(password);
    }
    if let Some(name) = target.option("ApplicationName") {
        config.application_name(name);
    }
    let ssl_mode = match target.option("sslmode").map(str::to_ascii_lowercase).as_deref() {
        None | Some("disable") => SslMode::Disable,
        Some("allow") | Some("prefer") => SslMode::Prefer,
        Some(mode) => {
            return Err(LinkError::NotSupported(format!(
                "sslmode '{}' needs TLS, which the PostgreSQL backend does not provide",
                mode
            )));
        }
    };
    config.ssl_mode(ssl_mode);
    Ok(config)
}

#[async_trait]
impl CatalogBackend for PostgresBackend {
    async fn catalogs(&self) -> Result<Vec<String>> {
        self.strings(
            None,
            "SELECT datname::text FROM pg_database \
             WHERE datallowconn AND NOT datistemplate ORDER BY datname",
            "list databases",
        )
        .await
    }

    async fn schemas(&self) -> Result<Vec<String>> {
        self.strings(
            None,
            "SELECT schema_name::text FROM information_schema.schemata ORDER BY schema_name",
            "list schemas",
        )
        .await
    }

    async fn tables(&self, scope: &Scope, pattern: &str) -> Result<Vec<TableRow>> {
        let client = self.client(scope.catalog.as_deref()).await?;
        let rows = match &scope.schema {
            Some(schema) => {
                client
                    .query(
                        "SELECT table_schema::text, table_name::text FROM information_schema.tables \
                         WHERE table_schema = $1 AND table_name LIKE $2 \
                         AND table_type IN ('BASE TABLE', 'VIEW') \
                         ORDER BY table_name",
                        &[schema, &pattern],
                    )
                    .await
            }
            None => {
                client
                    .query(
                        "SELECT table_schema::text, table_name::text FROM information_schema.tables \
                         WHERE table_schema NOT IN ('pg_catalog', 'information_schema') \
                         AND table_name LIKE $1 AND table_type IN ('BASE TABLE', 'VIEW') \
                         ORDER BY table_schema, table_name",
                        &[&pattern],
                    )
                    .await
            }
        }
        .map_err(|e| query_error("list tables", e))?;

        Ok(rows
            .iter()
            .map(|row| TableRow {
                schema: Some(row.get(0)),
                name: row.get(1),
            })
            .collect())
    }

    async fn primary_keys(&self, scope: &Scope, table: &str) -> Result<Vec<String>> {
        let client = self.client(scope.catalog.as_deref()).await?;
        let schema = scope.schema.as_deref().unwrap_or("public");
        let rows = client
            .query(
                "SELECT kcu.column_name::text \
                 FROM information_schema.table_constraints tc \
                 JOIN information_schema.key_column_usage kcu \
                   ON tc.constraint_name = kcu.constraint_name \
                  AND tc.table_schema = kcu.table_schema \
                 WHERE tc.constraint_type = 'PRIMARY KEY' \
                   AND tc.table_schema = $1 AND tc.table_name = $2 \
                 ORDER BY kcu.ordinal_position",
                &[&schema, &table],
            )
            .await
            .map_err(|e| query_error("list primary keys", e))?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    async fn columns(&self, scope: &Scope, table: &str, pattern: &str) -> Result<Vec<ColumnRow>> {
        let client = self.client(scope.catalog.as_deref()).await?;
        let schema = scope.schema.as_deref().unwrap_or("public");
        let rows = client
            .query(
                "SELECT column_name::text, data_type::text, is_nullable::text \
                 FROM information_schema.columns \
                 WHERE table_schema = $1 AND table_name = $2 AND column_name LIKE $3 \
                 ORDER BY ordinal_position",
                &[&schema, &table, &pattern],
            )
            .await
            .map_err(|e| query_error("list columns", e))?;
        Ok(rows
            .iter()
            .map(|row| ColumnRow {
                name: row.get(0),
                type_name: row.get(1),
                nullable: row.get::<_, String>(2).eq_ignore_ascii_case("YES"),
            })
            .collect())
    }

    async fn ping(&self) -> bool {
        match self.client(None).await {
            Ok(client) => client.simple_query("SELECT 1").await.is_ok(),
            Err(_) => false,
        }
    }

    async fn close(&self) -> Result<()> {
        // Dropping the clients ends their connection tasks
        self.clients.lock().clear();
        Ok(())
    }
}
