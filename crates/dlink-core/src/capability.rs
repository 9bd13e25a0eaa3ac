//! Capability contracts implemented by connectors
//!
//! A connector implements exactly one of [`TableConnector`] or
//! [`FileConnector`]. Calls take `&mut self`, so one instance is never driven
//! from two threads at once.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::{Parameter, Result};

/// Column metadata reported by table connectors
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableField {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub primary_key: bool,
}

impl TableField {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            primary_key: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }
}

/// Database, warehouse and queue connectors.
pub trait TableConnector: Send {
    /// Stable connector name, matched case-insensitively during discovery
    fn name(&self) -> &str;

    /// Connect using the given parameter. Errors propagate; a connector whose
    /// initialization failed must not be used.
    fn initialize(&mut self, param: &Parameter) -> Result<()>;

    fn list_databases(&mut self) -> Result<Vec<String>>;

    fn list_tables(&mut self, database: &str) -> Result<Vec<String>> {
        self.list_tables_matching(database, None)
    }

    /// List tables whose name matches a SQL `LIKE` pattern
    fn list_tables_matching(&mut self, database: &str, pattern: Option<&str>)
        -> Result<Vec<String>>;

    fn list_columns(&mut self, database: &str, table: &str) -> Result<Vec<TableField>> {
        self.list_columns_matching(database, table, None)
    }

    fn list_columns_matching(
        &mut self,
        database: &str,
        table: &str,
        pattern: Option<&str>,
    ) -> Result<Vec<TableField>>;

    /// Probe the live connection. Failures are reported as `false`.
    fn test_connectivity(&mut self) -> bool;

    fn close(&mut self) -> Result<()>;
}

/// Local and remote filesystem connectors.
pub trait FileConnector: Send {
    fn name(&self) -> &str;

    fn initialize(&mut self, param: &Parameter) -> Result<()>;

    fn list_files(&mut self, dir: &str) -> Result<Vec<String>> {
        self.list_files_recursive(dir, None, false)
    }

    fn list_files_matching(&mut self, dir: &str, pattern: Option<&str>) -> Result<Vec<String>> {
        self.list_files_recursive(dir, pattern, false)
    }

    /// List files under `dir`, filtered by a shell wildcard applied to file
    /// names only. Returned paths are relative to `dir`.
    fn list_files_recursive(
        &mut self,
        dir: &str,
        pattern: Option<&str>,
        recursive: bool,
    ) -> Result<Vec<String>>;

    fn open_read(&mut self, path: &str) -> Result<Box<dyn Read + Send>>;

    fn open_write(&mut self, path: &str) -> Result<Box<dyn Write + Send>>;

    fn test_connectivity(&mut self) -> bool;

    fn close(&mut self) -> Result<()>;
}
