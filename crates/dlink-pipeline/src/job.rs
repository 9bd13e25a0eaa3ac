//! Job descriptors submitted for compilation

use dlink_core::TableMapping;
use serde::{Deserialize, Serialize};

use crate::stage::{JobEnv, JobMode};

/// A sync job: where data comes from, where it goes and how tables map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptor {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub mode: JobMode,
    /// Source connection id, resolved through a connection catalog
    #[serde(default)]
    pub source_connection_id: i64,
    #[serde(default)]
    pub target_connection_id: i64,
    #[serde(default)]
    pub table_mappings: Vec<TableMapping>,
}

impl JobDescriptor {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: JobMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_connections(mut self, source: i64, target: i64) -> Self {
        self.source_connection_id = source;
        self.target_connection_id = target;
        self
    }

    pub fn with_mapping(mut self, mapping: TableMapping) -> Self {
        self.table_mappings.push(mapping);
        self
    }

    /// `<id>_<name>`
    pub fn qualified_name(&self) -> String {
        format!("{}_{}", self.id, self.name)
    }

    pub fn env(&self) -> JobEnv {
        JobEnv {
            mode: self.mode,
            name: self.qualified_name(),
        }
    }
}
