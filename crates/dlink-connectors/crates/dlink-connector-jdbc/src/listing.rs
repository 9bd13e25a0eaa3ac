//! Vendor-independent listing over a [`CatalogBackend`]

use dlink_core::{Result, TableField};

use crate::catalog::{CatalogBackend, Scope, TableRow};
use crate::vendor::{DatabaseListing, Vendor};

const ANY: &str = "%";

/// Databases visible to the user, without the vendor's system databases
#[tracing::instrument(skip(backend))]
pub async fn list_databases(vendor: Vendor, backend: &dyn CatalogBackend) -> Result<Vec<String>> {
    let names = match vendor.database_listing() {
        DatabaseListing::Catalogs => backend.catalogs().await?,
        DatabaseListing::Schemas => backend.schemas().await?,
    };
    Ok(names
        .into_iter()
        .filter(|name| !vendor.is_system_database(name))
        .collect())
}

/// Tables of `database`. Names are `schema.table` when the vendor searches
/// every schema of the database.
#[tracing::instrument(skip(backend))]
pub async fn list_tables(
    vendor: Vendor,
    backend: &dyn CatalogBackend,
    database: &str,
    pattern: Option<&str>,
) -> Result<Vec<String>> {
    let scope = vendor.scope(database);
    let rows = backend.tables(&scope, pattern.unwrap_or(ANY)).await?;
    Ok(rows.into_iter().map(|row| qualified_name(&scope, row)).collect())
}

fn qualified_name(scope: &Scope, row: TableRow) -> String {
    match (&scope.schema, row.schema) {
        (None, Some(schema)) => format!("{}.{}", schema, row.name),
        _ => row.name,
    }
}

/// Columns of `table`, flagged with primary key membership.
///
/// `table` may carry the `schema.` prefix [`list_tables`] adds.
#[tracing::instrument(skip(backend))]
pub async fn list_columns(
    vendor: Vendor,
    backend: &dyn CatalogBackend,
    database: &str,
    table: &str,
    pattern: Option<&str>,
) -> Result<Vec<TableField>> {
    let mut scope = vendor.scope(database);
    let mut table = table;
    if scope.schema.is_none() {
        if let Some((schema, name)) = table.split_once('.') {
            scope.schema = Some(schema.to_string());
            table = name;
        }
    }

    let primary_keys = backend.primary_keys(&scope, table).await?;
    let columns = backend.columns(&scope, table, pattern.unwrap_or(ANY)).await?;
    Ok(columns
        .into_iter()
        .map(|column| {
            let primary_key = primary_keys.contains(&column.name);
            TableField {
                name: column.name,
                data_type: column.type_name,
                nullable: column.nullable,
                primary_key,
            }
        })
        .collect())
}
