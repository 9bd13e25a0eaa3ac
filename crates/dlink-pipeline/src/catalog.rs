//! Metadata collaborators the compiler reads from
//!
//! Connections, connector descriptors and virtual tables live outside the
//! compiler. [`StaticCatalog`] serves all three from one JSON document.

use std::path::Path;

use dlink_core::{Connection, DriverDescriptor, LinkError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Connection and descriptor lookup
pub trait ConnectionCatalog {
    fn connection(&self, id: i64) -> Result<Connection>;

    /// Descriptor of the connector named `name`, matched case-insensitively
    fn descriptor(&self, name: &str) -> Result<DriverDescriptor>;
}

/// Virtual-table metadata lookup for connectors without a physical schema
pub trait VirtualTableLookup {
    fn virtual_table(&self, connection_id: i64, database: &str, table: &str) -> Result<VirtualTable>;
}

/// Message format declared by a virtual table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Text,
    Json,
}

/// One field of a virtual table.
///
/// `path` is a column index for `text` payloads and a JSON path for `json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualField {
    pub name: String,
    pub path: String,
    #[serde(rename = "type", default = "default_field_type")]
    pub data_type: String,
}

fn default_field_type() -> String {
    "string".to_string()
}

impl VirtualField {
    pub fn new(name: impl Into<String>, path: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            data_type: data_type.into(),
        }
    }

    /// The path as a column position
    pub fn position(&self) -> Option<usize> {
        self.path.trim().parse().ok()
    }
}

/// Schema-less table description attached to a connection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualTable {
    /// Connector properties of the table, including `format`
    #[serde(default)]
    pub format_config: IndexMap<String, Value>,
    #[serde(default)]
    pub fields: Vec<VirtualField>,
}

impl VirtualTable {
    pub fn new(format: &str) -> Self {
        let mut format_config = IndexMap::new();
        format_config.insert("format".to_string(), Value::String(format.to_string()));
        Self {
            format_config,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: VirtualField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.format_config.insert(key.into(), value.into());
        self
    }

    /// The declared payload format; `json` when unset
    pub fn format(&self) -> Result<PayloadFormat> {
        match self.format_config.get("format").and_then(Value::as_str) {
            None => Ok(PayloadFormat::Json),
            Some(format) if format.eq_ignore_ascii_case("json") => Ok(PayloadFormat::Json),
            Some(format) if format.eq_ignore_ascii_case("text") => Ok(PayloadFormat::Text),
            Some(other) => Err(LinkError::Configuration(format!(
                "unsupported virtual table format '{}'",
                other
            ))),
        }
    }

    pub fn field(&self, name: &str) -> Option<&VirtualField> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }
}

/// A virtual table registered in a [`StaticCatalog`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualTableEntry {
    pub connection_id: i64,
    pub database: String,
    pub table: String,
    #[serde(flatten)]
    pub table_def: VirtualTable,
}

/// In-memory metadata catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticCatalog {
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub descriptors: Vec<DriverDescriptor>,
    #[serde(default)]
    pub virtual_tables: Vec<VirtualTableEntry>,
}

impl StaticCatalog {
    pub fn from_json_str(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&contents)?;
        tracing::debug!(
            path = %path.display(),
            connections = catalog.connections.len(),
            descriptors = catalog.descriptors.len(),
            "loaded metadata catalog"
        );
        Ok(catalog)
    }

    pub fn with_connection(mut self, connection: Connection) -> Self {
        self.connections.push(connection);
        self
    }

    pub fn with_descriptor(mut self, descriptor: DriverDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn with_virtual_table(
        mut self,
        connection_id: i64,
        database: impl Into<String>,
        table: impl Into<String>,
        table_def: VirtualTable,
    ) -> Self {
        self.virtual_tables.push(VirtualTableEntry {
            connection_id,
            database: database.into(),
            table: table.into(),
            table_def,
        });
        self
    }
}

impl ConnectionCatalog for StaticCatalog {
    fn connection(&self, id: i64) -> Result<Connection> {
        self.connections
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| LinkError::NotFound(format!("connection {} does not exist", id)))
    }

    fn descriptor(&self, name: &str) -> Result<DriverDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| LinkError::NotFound(format!("no connector descriptor named '{}'", name)))
    }
}

impl VirtualTableLookup for StaticCatalog {
    fn virtual_table(&self, connection_id: i64, database: &str, table: &str) -> Result<VirtualTable> {
        self.virtual_tables
            .iter()
            .find(|v| v.connection_id == connection_id && v.database == database && v.table == table)
            .map(|v| v.table_def.clone())
            .ok_or_else(|| {
                LinkError::NotFound(format!(
                    "no virtual table {}.{} on connection {}",
                    database, table, connection_id
                ))
            })
    }
}

/// Lookup used when a job touches no virtual-table connector
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVirtualTables;

impl VirtualTableLookup for NoVirtualTables {
    fn virtual_table(&self, connection_id: i64, database: &str, table: &str) -> Result<VirtualTable> {
        Err(LinkError::NotFound(format!(
            "no virtual table {}.{} on connection {}",
            database, table, connection_id
        )))
    }
}
