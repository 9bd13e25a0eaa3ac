//! The table connector shared by every relational vendor

use dlink_core::{LinkError, Parameter, Result, TableConnector, TableField};

use crate::catalog::CatalogBackend;
use crate::listing;
use crate::mysql::MySqlBackend;
use crate::postgres::PostgresBackend;
use crate::sqlserver::SqlServerBackend;
use crate::runtime::block_on;
use crate::target::{JdbcTarget, Wire};
use crate::vendor::Vendor;

pub struct JdbcConnector {
    name: &'static str,
    vendor: Vendor,
    backend: Option<Box<dyn CatalogBackend>>,
}

impl JdbcConnector {
    pub fn new(name: &'static str, vendor: Vendor) -> Self {
        Self {
            name,
            vendor,
            backend: None,
        }
    }

    /// A connector already attached to `backend`
    pub fn with_backend(name: &'static str, vendor: Vendor, backend: Box<dyn CatalogBackend>) -> Self {
        Self {
            name,
            vendor,
            backend: Some(backend),
        }
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    fn backend(&self) -> Result<&dyn CatalogBackend> {
        self.backend.as_deref().ok_or_else(|| {
            LinkError::Connectivity(format!("connector '{}' is not initialized", self.name))
        })
    }

    async fn open(target: &JdbcTarget) -> Result<Box<dyn CatalogBackend>> {
        match &target.wire {
            Wire::MySql => Ok(Box::new(MySqlBackend::connect(target).await?)),
            Wire::Postgres => Ok(Box::new(PostgresBackend::connect(target).await?)),
            Wire::SqlServer => Ok(Box::new(SqlServerBackend::connect(target).await?)),
            Wire::Unsupported(name) => Err(LinkError::NotSupported(format!(
                "no native backend for JDBC sub-protocol '{}'",
                name
            ))),
        }
    }
}

impl TableConnector for JdbcConnector {
    fn name(&self) -> &str {
        self.name
    }

    #[tracing::instrument(skip(self, param), fields(connector = %self.name, endpoint = %param.endpoint()))]
    fn initialize(&mut self, param: &Parameter) -> Result<()> {
        if matches!(self.vendor, Vendor::Oracle | Vendor::Dm) {
            return Err(LinkError::NotSupported(format!(
                "{} metadata access has no native backend",
                self.vendor
            )));
        }
        let target = JdbcTarget::from_param(param)?;
        let ignored = target.ignored_options();
        if !ignored.is_empty() {
            tracing::warn!(connector = %self.name, options = ?ignored, "connection options have no native equivalent and are ignored");
        }
        let backend = block_on(Self::open(&target))??;
        tracing::info!(connector = %self.name, endpoint = %target.endpoint(), "connected");
        self.backend = Some(backend);
        Ok(())
    }

    fn list_databases(&mut self) -> Result<Vec<String>> {
        block_on(listing::list_databases(self.vendor, self.backend()?))?
    }

    fn list_tables_matching(&mut self, database: &str, pattern: Option<&str>) -> Result<Vec<String>> {
        block_on(listing::list_tables(self.vendor, self.backend()?, database, pattern))?
    }

    fn list_columns_matching(
        &mut self,
        database: &str,
        table: &str,
        pattern: Option<&str>,
    ) -> Result<Vec<TableField>> {
        block_on(listing::list_columns(
            self.vendor,
            self.backend()?,
            database,
            table,
            pattern,
        ))?
    }

    fn test_connectivity(&mut self) -> bool {
        let Ok(backend) = self.backend() else {
            return false;
        };
        match block_on(backend.ping()) {
            Ok(alive) => alive,
            Err(e) => {
                tracing::warn!(connector = %self.name, error = %e, "connectivity probe failed");
                false
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        match self.backend.take() {
            Some(backend) => block_on(backend.close())?,
            None => Ok(()),
        }
    }
}
