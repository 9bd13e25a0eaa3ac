//! dlink pipeline compiler
//!
//! Turns a job (table mappings between a source and a target connection)
//! into a pipeline document with ordered `env`, `source`, `transform` and
//! `sink` sections.
//!
//! # Example
//!
//! ```
//! use dlink_core::{Connection, DriverDescriptor, FieldMapping, TableMapping};
//! use dlink_pipeline::{Compiler, JobDescriptor};
//!
//! let mysql = DriverDescriptor::table("MySQL", "JDBC-MySQL");
//! let connection = Connection {
//!     id: 1,
//!     connector: "MySQL".into(),
//!     ..Connection::default()
//! };
//! let job = JobDescriptor::new(7, "orders").with_mapping(
//!     TableMapping::new("shop", "orders", "dw", "orders")
//!         .with_fields(vec![FieldMapping::new("id", "id").primary_key()]),
//! );
//!
//! let document = Compiler::default()
//!     .compile(&job, &connection, &mysql, &connection, &mysql)
//!     .unwrap();
//! assert_eq!(document.env.name, "7_orders");
//! assert_eq!(
//!     document.source[0].get_str("query"),
//!     Some("SELECT `id` FROM shop.orders")
//! );
//! ```

pub mod catalog;
mod compiler;
mod context;
pub mod generator;
mod job;
mod stage;

#[cfg(test)]
mod hive_tests;

pub use catalog::{
    ConnectionCatalog, NoVirtualTables, PayloadFormat, StaticCatalog, VirtualField, VirtualTable,
    VirtualTableLookup,
};
pub use compiler::Compiler;
pub use context::{Endpoint, GenerationContext};
pub use generator::{GeneratorRegistry, StageGenerator};
pub use job::JobDescriptor;
pub use stage::{JobEnv, JobMode, PLUGIN_KEY, PipelineDocument, Stage};
