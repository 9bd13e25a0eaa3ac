//! SQL identifier quoting per vendor family
//!
//! Generated queries quote identifiers the way the source vendor expects.
//!
//! # Example
//!
//! ```
//! use dlink_core::SqlDialect;
//!
//! assert_eq!(SqlDialect::MySql.quote_identifier("id"), "`id`");
//! assert_eq!(SqlDialect::Postgres.quote_identifier("id"), "\"id\"");
//! assert_eq!(SqlDialect::SqlServer.quote_identifier("id"), "[id]");
//! assert_eq!(SqlDialect::Generic.quote_identifier("id"), "id");
//! ```

use crate::DriverDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlDialect {
    /// MySQL, MariaDB and TiDB
    MySql,
    /// PostgreSQL, KingbaseES, Oracle and DM
    Postgres,
    SqlServer,
    #[default]
    Generic,
}

impl SqlDialect {
    /// Recognize a vendor from a connector or family name.
    ///
    /// Names are split on `-` and `_` so family markers such as `JDBC-MySQL`
    /// or `SQLServer-CDC` resolve to their vendor.
    pub fn from_name(name: &str) -> Self {
        name.split(['-', '_', ' '])
            .find_map(|token| match token.to_ascii_lowercase().as_str() {
                "mysql" | "mariadb" | "tidb" => Some(SqlDialect::MySql),
                "postgres" | "postgresql" | "kingbase" | "kingbasees" | "oracle" | "dm" => {
                    Some(SqlDialect::Postgres)
                }
                "sqlserver" | "mssql" => Some(SqlDialect::SqlServer),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Dialect for a connector, from its name first and then its family marker
    pub fn for_descriptor(descriptor: &DriverDescriptor) -> Self {
        match Self::from_name(&descriptor.name) {
            SqlDialect::Generic => Self::from_name(&descriptor.family),
            dialect => dialect,
        }
    }

    /// Quote an identifier, doubling any embedded closing delimiter
    pub fn quote_identifier(&self, ident: &str) -> String {
        match self {
            SqlDialect::MySql => format!("`{}`", ident.replace('`', "``")),
            SqlDialect::Postgres => format!("\"{}\"", ident.replace('"', "\"\"")),
            SqlDialect::SqlServer => format!("[{}]", ident.replace(']', "]]")),
            SqlDialect::Generic => ident.to_string(),
        }
    }

    /// Quote a string literal using single quotes
    pub fn quote_string(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }
}
