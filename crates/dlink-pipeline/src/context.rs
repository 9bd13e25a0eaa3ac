//! Per-compile generation state
//!
//! The context hands out stage names and tracks which stage reads from
//! which. A fresh context is built for every compile and dropped after it.

use std::collections::HashSet;

use dlink_core::{CompilerConfig, Connection, DriverDescriptor, LinkError, Result, StageKeys};
use indexmap::IndexMap;

use crate::catalog::VirtualTableLookup;
use crate::job::JobDescriptor;

const SOURCE_PREFIX: &str = "source_";
const TRANSFORM_PREFIX: &str = "transform_";
const EXTRACT_PREFIX: &str = "extract_";

/// One side of a job: a connection and the descriptor of its connector
#[derive(Debug, Clone, Copy)]
pub struct Endpoint<'a> {
    pub connection: &'a Connection,
    pub descriptor: &'a DriverDescriptor,
}

impl<'a> Endpoint<'a> {
    pub fn new(connection: &'a Connection, descriptor: &'a DriverDescriptor) -> Self {
        Self {
            connection,
            descriptor,
        }
    }

    /// Flat connection properties passed through to stages
    pub fn properties(&self) -> IndexMap<String, String> {
        self.connection.properties(self.descriptor)
    }

    pub fn connection_id(&self) -> i64 {
        self.connection.id
    }
}

pub struct GenerationContext<'a> {
    job: &'a JobDescriptor,
    source: Endpoint<'a>,
    target: Endpoint<'a>,
    config: &'a CompilerConfig,
    virtual_tables: &'a dyn VirtualTableLookup,
    /// Logical name (`source_<table>`, `transform_<table>`) to allocated stage name
    stage_names: IndexMap<String, String>,
    consumed: HashSet<String>,
    current: Option<String>,
}

impl<'a> GenerationContext<'a> {
    pub fn new(
        job: &'a JobDescriptor,
        source: Endpoint<'a>,
        target: Endpoint<'a>,
        config: &'a CompilerConfig,
        virtual_tables: &'a dyn VirtualTableLookup,
    ) -> Self {
        Self {
            job,
            source,
            target,
            config,
            virtual_tables,
            stage_names: IndexMap::new(),
            consumed: HashSet::new(),
            current: None,
        }
    }

    pub fn job(&self) -> &'a JobDescriptor {
        self.job
    }

    pub fn source(&self) -> Endpoint<'a> {
        self.source
    }

    pub fn target(&self) -> Endpoint<'a> {
        self.target
    }

    pub fn config(&self) -> &'a CompilerConfig {
        self.config
    }

    pub fn keys(&self) -> &'a StageKeys {
        &self.config.stage_keys
    }

    pub fn virtual_tables(&self) -> &'a dyn VirtualTableLookup {
        self.virtual_tables
    }

    /// Allocate `TableSource_<table>_<jobId>`
    pub fn allocate_source_name(&mut self, table: &str) -> Result<String> {
        let name = format!("TableSource_{}_{}", table, self.job.id);
        self.allocate(SOURCE_PREFIX, table, name)
    }

    /// Allocate `TableTransform_<table>_<jobId>`
    pub fn allocate_transform_name(&mut self, table: &str) -> Result<String> {
        let name = format!("TableTransform_{}_{}", table, self.job.id);
        self.allocate(TRANSFORM_PREFIX, table, name)
    }

    /// Allocate the name of an intermediate transform that feeds the final one
    pub fn allocate_extract_name(&mut self, table: &str) -> Result<String> {
        let name = format!("TableExtract_{}_{}", table, self.job.id);
        self.allocate(EXTRACT_PREFIX, table, name)
    }

    fn allocate(&mut self, prefix: &str, table: &str, name: String) -> Result<String> {
        let logical = format!("{}{}", prefix, table);
        if let Some(existing) = self.stage_names.get(&logical) {
            return Err(LinkError::Configuration(format!(
                "stage '{}' is already allocated for table '{}' in job {}",
                existing, table, self.job.id
            )));
        }
        tracing::trace!(logical = %logical, stage = %name, "allocated stage name");
        self.stage_names.insert(logical, name.clone());
        self.current = Some(name.clone());
        Ok(name)
    }

    /// The stage a downstream stage for `table` should read from: the
    /// transform when one was allocated, else the source.
    pub fn resolve_prev_stage_name(&self, table: &str) -> Option<&str> {
        self.stage_names
            .get(&format!("{}{}", TRANSFORM_PREFIX, table))
            .or_else(|| self.stage_names.get(&format!("{}{}", SOURCE_PREFIX, table)))
            .map(String::as_str)
    }

    /// The most recently allocated stage name
    pub fn current_stage_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Claim `name` as the input of one downstream stage.
    ///
    /// A stage feeds at most one consumer; a second claim is an error.
    pub fn consume(&mut self, name: &str) -> Result<()> {
        if !self.consumed.insert(name.to_string()) {
            return Err(LinkError::Configuration(format!(
                "stage '{}' is already the input of another stage",
                name
            )));
        }
        Ok(())
    }

    /// Resolve and claim the input for a stage processing `table`
    pub fn take_input(&mut self, table: &str) -> Result<String> {
        let name = self
            .resolve_prev_stage_name(table)
            .map(str::to_string)
            .ok_or_else(|| {
                LinkError::Configuration(format!(
                    "no upstream stage was generated for table '{}'",
                    table
                ))
            })?;
        self.consume(&name)?;
        Ok(name)
    }

    pub fn stage_names(&self) -> &IndexMap<String, String> {
        &self.stage_names
    }
}
