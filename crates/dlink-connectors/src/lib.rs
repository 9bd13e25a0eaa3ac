//! dlink connectors - connector registry and isolated loader
//!
//! Table connectors ship as loadable archives under
//! `<home>/lib/connector/<name>` and are resolved inside an isolated context
//! per connector name. File connectors are linked in.

// File connectors
#[cfg(feature = "file")]
pub use dlink_connector_file as file;

pub mod ambient;
mod archive;
mod isolation;
mod loader;
mod resolver;
mod scoped;

#[cfg(test)]
mod archive_tests;

pub use archive::{archive_dir, list_archives};
pub use isolation::{DEFAULT_SHARED_PREFIXES, IsolatedContext, ResolutionPolicy};
pub use loader::{Connector, ConnectorLoader};
pub use resolver::{
    ArchiveLoader, HostResolver, ModuleResolver, SharedLibrary, SharedLibraryLoader, StaticModule,
    Symbol,
};
pub use scoped::ScopedTableConnector;

/// Re-export commonly used types from dlink-core
pub use dlink_core::{
    FileConnector, LinkError, Parameter, Result, TableConnector, TableField,
};
