//! Relational database connectors
//!
//! Every vendor shares one listing algorithm over a [`CatalogBackend`] and
//! differs only in its [`Vendor`] rules. MySQL-wire, PostgreSQL-wire and
//! SQL Server are reachable; Oracle and DM fail at `initialize`.
//!
//! This crate builds as a loadable connector unit and exports its providers
//! through [`dlink_core::export_connectors!`].

mod catalog;
mod connector;
mod listing;
mod mysql;
mod postgres;
mod runtime;
mod sqlserver;
mod target;
mod vendor;

#[cfg(test)]
mod connector_tests;
#[cfg(test)]
mod listing_tests;
#[cfg(test)]
mod target_tests;
#[cfg(test)]
mod vendor_tests;

pub use catalog::{CatalogBackend, ColumnRow, Scope, TableRow};
pub use connector::JdbcConnector;
pub use listing::{list_columns, list_databases, list_tables};
pub use mysql::MySqlBackend;
pub use postgres::PostgresBackend;
pub use sqlserver::SqlServerBackend;
pub use target::{EXCLUDED_OPTIONS, JdbcTarget, Wire};
pub use vendor::{DatabaseListing, Vendor};

use dlink_core::{ConnectorProvider, TableConnector, connector_names};

macro_rules! vendor_factory {
    ($fn_name:ident, $name:expr, $vendor:expr) => {
        fn $fn_name() -> Box<dyn TableConnector> {
            Box::new(JdbcConnector::new($name, $vendor))
        }
    };
}

vendor_factory!(mysql, connector_names::MYSQL, Vendor::MySql);
vendor_factory!(mysql_cdc, connector_names::MYSQL_CDC, Vendor::MySql);
vendor_factory!(tidb, connector_names::TIDB, Vendor::TiDb);
vendor_factory!(postgresql, connector_names::POSTGRESQL, Vendor::Postgres);
vendor_factory!(kingbase, connector_names::KINGBASE, Vendor::Kingbase);
vendor_factory!(oracle, connector_names::ORACLE, Vendor::Oracle);
vendor_factory!(dm, connector_names::DM, Vendor::Dm);
vendor_factory!(sqlserver, connector_names::SQLSERVER, Vendor::SqlServer);
vendor_factory!(sqlserver_cdc, connector_names::SQLSERVER_CDC, Vendor::SqlServer);
vendor_factory!(jdbc, connector_names::JDBC, Vendor::Generic);

/// Providers declared by this unit
pub fn providers() -> Vec<ConnectorProvider> {
    vec![
        ConnectorProvider::table(connector_names::MYSQL, mysql),
        ConnectorProvider::table(connector_names::MYSQL_CDC, mysql_cdc),
        ConnectorProvider::table(connector_names::TIDB, tidb),
        ConnectorProvider::table(connector_names::POSTGRESQL, postgresql),
        ConnectorProvider::table(connector_names::KINGBASE, kingbase),
        ConnectorProvider::table(connector_names::ORACLE, oracle),
        ConnectorProvider::table(connector_names::DM, dm),
        ConnectorProvider::table(connector_names::SQLSERVER, sqlserver),
        ConnectorProvider::table(connector_names::SQLSERVER_CDC, sqlserver_cdc),
        ConnectorProvider::table(connector_names::JDBC, jdbc),
    ]
}

dlink_core::export_connectors!(providers);
