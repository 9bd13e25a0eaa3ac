//! Metadata access seam between the listing rules and a live database

use async_trait::async_trait;
use dlink_core::Result;

/// Catalog and schema a metadata query is restricted to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub catalog: Option<String>,
    pub schema: Option<String>,
}

impl Scope {
    pub fn catalog(catalog: impl Into<String>) -> Self {
        Self {
            catalog: Some(catalog.into()),
            schema: None,
        }
    }

    pub fn schema(schema: impl Into<String>) -> Self {
        Self {
            catalog: None,
            schema: Some(schema.into()),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// The name MySQL-wire servers call a database
    pub fn database(&self) -> Option<&str> {
        self.catalog.as_deref().or(self.schema.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub schema: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow {
    pub name: String,
    pub type_name: String,
    pub nullable: bool,
}

/// Raw metadata queries. Patterns use SQL `LIKE` syntax.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    async fn catalogs(&self) -> Result<Vec<String>>;

    async fn schemas(&self) -> Result<Vec<String>>;

    /// Tables and views in `scope` whose name matches `pattern`
    async fn tables(&self, scope: &Scope, pattern: &str) -> Result<Vec<TableRow>>;

    async fn primary_keys(&self, scope: &Scope, table: &str) -> Result<Vec<String>>;

    async fn columns(&self, scope: &Scope, table: &str, pattern: &str) -> Result<Vec<ColumnRow>>;

    async fn ping(&self) -> bool;

    async fn close(&self) -> Result<()>;
}
