//! Connector descriptors and well-known connector names

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Names of the connectors shipped with dlink.
pub mod connector_names {
    pub const DM: &str = "DM";
    pub const KINGBASE: &str = "KingbaseES";
    pub const MYSQL: &str = "MySQL";
    pub const ORACLE: &str = "Oracle";
    pub const POSTGRESQL: &str = "PostgreSQL";
    pub const SQLSERVER: &str = "SQLServer";
    pub const TIDB: &str = "TiDB";
    pub const MYSQL_CDC: &str = "MySQL-CDC";
    pub const SQLSERVER_CDC: &str = "SQLServer-CDC";
    pub const JDBC: &str = "JDBC";
    pub const HIVE: &str = "Hive";
    pub const KAFKA: &str = "Kafka";
    pub const LOCAL_FILE: &str = "LocalFile";
    pub const FTP: &str = "FTP";
    pub const SFTP: &str = "SFTP";
}

fn default_true() -> bool {
    true
}

/// Connector metadata as returned by descriptor lookup.
///
/// `family` is the plugin family marker the stage generators dispatch on,
/// e.g. `JDBC-MySQL`, `MySQL-CDC`, `Hive` or `Kafka`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverDescriptor {
    pub name: String,
    pub family: String,
    #[serde(default)]
    pub is_file_capable: bool,
    #[serde(default = "default_true")]
    pub uses_isolated_classpath: bool,
    #[serde(default = "default_true")]
    pub supports_source: bool,
    #[serde(default = "default_true")]
    pub supports_sink: bool,
    #[serde(default)]
    pub is_stream: bool,
    /// Whether tables of this connector are described by virtual-table metadata
    #[serde(default)]
    pub virtual_table: bool,
    /// Version directory under the connector directory
    #[serde(default)]
    pub search_path: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl DriverDescriptor {
    /// Descriptor for an isolated, bidirectional table connector
    pub fn table(name: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            family: family.into(),
            is_file_capable: false,
            uses_isolated_classpath: true,
            supports_source: true,
            supports_sink: true,
            is_stream: false,
            virtual_table: false,
            search_path: None,
            properties: BTreeMap::new(),
        }
    }

    /// Descriptor for a file connector, which is never loaded in isolation
    pub fn file(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            family: name.clone(),
            is_file_capable: true,
            uses_isolated_classpath: false,
            ..Self::table(name, String::new())
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_roles(mut self, source: bool, sink: bool) -> Self {
        self.supports_source = source;
        self.supports_sink = sink;
        self
    }

    pub fn family_is(&self, marker: &str) -> bool {
        self.family.eq_ignore_ascii_case(marker)
    }

    pub fn family_starts_with(&self, marker: &str) -> bool {
        self.family
            .get(..marker.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(marker))
    }

    pub fn family_ends_with(&self, marker: &str) -> bool {
        self.family.len() >= marker.len()
            && self
                .family
                .get(self.family.len() - marker.len()..)
                .is_some_and(|tail| tail.eq_ignore_ascii_case(marker))
    }
}
