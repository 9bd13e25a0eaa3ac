//! dlink core - contracts and data model shared across dlink crates
//!
//! This crate defines:
//!
//! - `TableConnector` / `FileConnector` - the two connector capability contracts
//! - `Parameter` - the only input a connector receives at initialization
//! - `ConnectorProvider` / `ConnectorDeclaration` - the provider discovery boundary
//! - `TableMapping` / `FieldMapping` - the mapping model the compiler consumes
//! - `SqlDialect` - identifier quoting per vendor
//! - `LinkConfig` - runtime configuration

mod capability;
pub mod config;
mod descriptor;
mod dialect;
mod error;
mod mapping;
mod param;
mod provider;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod param_tests;

pub use capability::*;
pub use config::{CompilerConfig, LinkConfig, LoaderConfig, LogSettings, StageKeys};
pub use descriptor::*;
pub use dialect::*;
pub use error::*;
pub use mapping::*;
pub use param::*;
pub use provider::*;
