//! Provider discovery boundary
//!
//! Connectors linked into the host register through `inventory`. Loadable
//! connector units export a [`ConnectorDeclaration`] under
//! [`DECLARATION_SYMBOL`] via [`export_connectors!`].

use std::fmt;

use crate::{FileConnector, TableConnector};

pub type TableFactory = fn() -> Box<dyn TableConnector>;
pub type FileFactory = fn() -> Box<dyn FileConnector>;

/// Version of the contract crate a connector unit was built against.
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compiler that built the contract crate. Trait objects cross the unit
/// boundary with the Rust ABI, so both sides must agree on it.
pub const RUSTC_VERSION: &str = env!("DLINK_RUSTC_VERSION");

/// Symbol every loadable connector unit exports.
pub const DECLARATION_SYMBOL: &str = "dlink_connector_declaration";

#[derive(Clone, Copy)]
pub enum ProviderKind {
    Table(TableFactory),
    File(FileFactory),
}

/// A named constructor for one connector implementation.
#[derive(Clone, Copy)]
pub struct ConnectorProvider {
    pub name: &'static str,
    pub kind: ProviderKind,
}

impl ConnectorProvider {
    pub const fn table(name: &'static str, factory: TableFactory) -> Self {
        Self {
            name,
            kind: ProviderKind::Table(factory),
        }
    }

    pub const fn file(name: &'static str, factory: FileFactory) -> Self {
        Self {
            name,
            kind: ProviderKind::File(factory),
        }
    }

    /// Case-insensitive name match
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, ProviderKind::File(_))
    }
}

impl fmt::Debug for ConnectorProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorProvider")
            .field("name", &self.name)
            .field("file", &self.is_file())
            .finish()
    }
}

inventory::collect!(ConnectorProvider);

/// Providers linked into the current binary
pub fn linked_providers() -> Vec<ConnectorProvider> {
    inventory::iter::<ConnectorProvider>
        .into_iter()
        .copied()
        .collect()
}

/// Entry point exported by a loadable connector unit.
#[repr(C)]
pub struct ConnectorDeclaration {
    pub core_version: &'static str,
    pub rustc_version: &'static str,
    pub providers: fn() -> Vec<ConnectorProvider>,
}

impl ConnectorDeclaration {
    /// Same contract version, same compiler
    pub fn is_compatible(&self) -> bool {
        self.incompatibility().is_none()
    }

    /// Why this unit cannot be used by the host, if it cannot
    pub fn incompatibility(&self) -> Option<String> {
        if self.core_version != CORE_VERSION {
            return Some(format!(
                "built against dlink-core {}, host runs {}",
                self.core_version, CORE_VERSION
            ));
        }
        if self.rustc_version != RUSTC_VERSION {
            return Some(format!(
                "built by '{}', host was built by '{}'",
                self.rustc_version, RUSTC_VERSION
            ));
        }
        None
    }
}

/// Export a loadable unit's providers under [`DECLARATION_SYMBOL`].
///
/// ```ignore
/// fn providers() -> Vec<ConnectorProvider> { vec![...] }
/// dlink_core::export_connectors!(providers);
/// ```
#[macro_export]
macro_rules! export_connectors {
    ($providers:path) => {
        #[allow(non_upper_case_globals)]
        #[unsafe(no_mangle)]
        pub static dlink_connector_declaration: $crate::ConnectorDeclaration =
            $crate::ConnectorDeclaration {
                core_version: $crate::CORE_VERSION,
                rustc_version: $crate::RUSTC_VERSION,
                providers: $providers,
            };
    };
}
