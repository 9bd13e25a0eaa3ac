//! Per-vendor namespace rules

use std::fmt;

use dlink_core::connector_names;

use crate::catalog::Scope;

/// Where a vendor's "databases" come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseListing {
    Catalogs,
    /// Schemas (users) stand in for databases
    Schemas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    MySql,
    TiDb,
    Postgres,
    Kingbase,
    Oracle,
    Dm,
    SqlServer,
    Generic,
}

impl Vendor {
    pub fn from_name(name: &str) -> Option<Self> {
        let vendor = match name.to_ascii_lowercase().as_str() {
            "mysql" | "mysql-cdc" => Vendor::MySql,
            "tidb" => Vendor::TiDb,
            "postgresql" | "postgres" => Vendor::Postgres,
            "kingbasees" | "kingbase" => Vendor::Kingbase,
            "oracle" => Vendor::Oracle,
            "dm" => Vendor::Dm,
            "sqlserver" | "sqlserver-cdc" => Vendor::SqlServer,
            "jdbc" => Vendor::Generic,
            _ => return None,
        };
        Some(vendor)
    }

    pub fn connector_name(&self) -> &'static str {
        match self {
            Vendor::MySql => connector_names::MYSQL,
            Vendor::TiDb => connector_names::TIDB,
            Vendor::Postgres => connector_names::POSTGRESQL,
            Vendor::Kingbase => connector_names::KINGBASE,
            Vendor::Oracle => connector_names::ORACLE,
            Vendor::Dm => connector_names::DM,
            Vendor::SqlServer => connector_names::SQLSERVER,
            Vendor::Generic => connector_names::JDBC,
        }
    }

    /// Databases hidden from listings, lowercase
    pub fn system_databases(&self) -> &'static [&'static str] {
        match self {
            Vendor::MySql => &["information_schema", "mysql", "performance_schema", "sys"],
            Vendor::TiDb => &[
                "information_schema",
                "mysql",
                "performance_schema",
                "sys",
                "metrics_schema",
            ],
            Vendor::Postgres => &[
                "information_schema",
                "pg_catalog",
                "pg_toast",
                "pg_temp_1",
                "pg_toast_temp_1",
                "postgres",
                "template0",
                "template1",
            ],
            Vendor::Kingbase => &[
                "information_schema",
                "pg_catalog",
                "pg_toast",
                "pg_temp_1",
                "pg_toast_temp_1",
                "template0",
                "template1",
                "sys_catalog",
                "kingbase",
                "security",
            ],
            Vendor::Oracle => &[
                "sys",
                "system",
                "sysaux",
                "temp",
                "users",
                "undotbs1",
                "apex_030200",
                "ctxsys",
                "dbsnmp",
                "dip",
                "flows_files",
                "hr",
                "mdsys",
                "oracle_ocm",
                "outln",
                "scott",
                "wmsys",
                "xdb",
                "xs$null",
            ],
            Vendor::Dm => &[
                "sys",
                "sysdba",
                "sysauditor",
                "ctisys",
                "syslogger",
                "sysopr",
                "dmsample",
                "dmhr",
                "bookshop",
                "production",
            ],
            Vendor::SqlServer => &[
                "master",
                "model",
                "msdb",
                "tempdb",
                "resource",
                "distribution",
                "reportserver",
                "reportservertempdb",
            ],
            Vendor::Generic => &[],
        }
    }

    pub fn is_system_database(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.system_databases().contains(&name.as_str())
    }

    pub fn database_listing(&self) -> DatabaseListing {
        match self {
            Vendor::Oracle | Vendor::Dm => DatabaseListing::Schemas,
            _ => DatabaseListing::Catalogs,
        }
    }

    /// Catalog and schema to search when `database` is selected.
    ///
    /// A scope without a schema searches every schema of the catalog.
    pub fn scope(&self, database: &str) -> Scope {
        match self {
            Vendor::MySql | Vendor::TiDb | Vendor::Kingbase | Vendor::SqlServer => {
                Scope::catalog(database)
            }
            Vendor::Postgres => Scope::catalog(database).with_schema("public"),
            Vendor::Oracle | Vendor::Dm => Scope::schema(database.to_uppercase()),
            Vendor::Generic => Scope::schema(database),
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.connector_name())
    }
}
