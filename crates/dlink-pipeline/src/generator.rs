//! Stage generators and dispatch
//!
//! Each generator covers one connector family and turns the job's table
//! mappings into stages. The registry picks the generator for a descriptor.

mod cdc;
mod hive;
mod jdbc;
mod kafka;

pub use cdc::CdcGenerator;
pub use hive::{HIVE_FILE_KEYS, HiveGenerator, METASTORE_URI};
pub use jdbc::{JdbcGenerator, select_query, where_clause};
pub use kafka::{KafkaGenerator, MAX_TEXT_COLUMNS, PLACEHOLDER_PREFIX, text_schema};

use dlink_core::{DriverDescriptor, LinkError, Result};

use crate::context::GenerationContext;
use crate::stage::Stage;

pub trait StageGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    fn supports(&self, descriptor: &DriverDescriptor) -> bool;

    /// Whether this generator can produce the read side of a job
    fn emits_source(&self) -> bool {
        true
    }

    /// Whether this generator can produce the write side of a job
    fn emits_sink(&self) -> bool {
        true
    }

    fn generate_source(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Stage>>;

    fn generate_transform(&self, _ctx: &mut GenerationContext<'_>) -> Result<Vec<Stage>> {
        Ok(Vec::new())
    }

    fn generate_sink(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Stage>>;
}

/// Ordered generator list; the first generator that supports a descriptor wins.
pub struct GeneratorRegistry {
    generators: Vec<Box<dyn StageGenerator>>,
}

impl GeneratorRegistry {
    pub fn empty() -> Self {
        Self {
            generators: Vec::new(),
        }
    }

    pub fn register(mut self, generator: impl StageGenerator + 'static) -> Self {
        self.generators.push(Box::new(generator));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    pub fn select(&self, descriptor: &DriverDescriptor) -> Result<&dyn StageGenerator> {
        self.generators
            .iter()
            .find(|g| g.supports(descriptor))
            .map(|g| g.as_ref())
            .ok_or_else(|| {
                LinkError::Configuration(format!(
                    "no stage generator supports connector '{}' (family '{}')",
                    descriptor.name, descriptor.family
                ))
            })
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::empty()
            .register(JdbcGenerator)
            .register(CdcGenerator)
            .register(HiveGenerator)
            .register(KafkaGenerator)
    }
}

/// `db.table`, or just `table` when the database is blank
pub(crate) fn qualified_table(database: &str, table: &str) -> String {
    if database.trim().is_empty() {
        table.to_string()
    } else {
        format!("{}.{}", database, table)
    }
}
