//! Symbol resolution over loadable modules
//!
//! A [`ModuleResolver`] is one unit symbols and connector providers can be
//! resolved from: a shared library on disk, the host process, or an
//! in-memory module.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use dlink_core::{
    ConnectorDeclaration, ConnectorProvider, DECLARATION_SYMBOL, LinkError, Result,
    linked_providers,
};

/// A resolved symbol and the module it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub origin: String,
    pub address: usize,
}

/// One module symbols and providers are resolved from.
pub trait ModuleResolver: Send + Sync {
    /// Identifier recorded as the origin of resolved symbols
    fn origin(&self) -> &str;

    fn find_symbol(&self, name: &str) -> Option<Symbol>;

    /// Connector providers this module declares
    fn providers(&self) -> Result<Vec<ConnectorProvider>>;
}

/// A connector archive opened with `libloading`.
pub struct SharedLibrary {
    origin: String,
    library: libloading::Library,
}

impl SharedLibrary {
    pub fn open(path: &Path) -> Result<Self> {
        tracing::debug!(archive = %path.display(), "opening connector archive");
        // SAFETY: loading runs the archive's initializers. Archives under the
        // connector directory are installed by the operator and trusted.
        let library = unsafe { libloading::Library::new(path) }.map_err(|e| {
            LinkError::Isolation(format!("failed to load archive {}: {}", path.display(), e))
        })?;
        Ok(Self {
            origin: path.display().to_string(),
            library,
        })
    }
}

impl ModuleResolver for SharedLibrary {
    fn origin(&self) -> &str {
        &self.origin
    }

    fn find_symbol(&self, name: &str) -> Option<Symbol> {
        // SAFETY: the address is only reported, never called through here.
        let symbol = unsafe { self.library.get::<*const ()>(name.as_bytes()) }.ok()?;
        Some(Symbol {
            name: name.to_string(),
            origin: self.origin.clone(),
            address: *symbol as usize,
        })
    }

    fn providers(&self) -> Result<Vec<ConnectorProvider>> {
        // SAFETY: units export the declaration through `export_connectors!`,
        // which fixes its type. The library outlives this call.
        let declaration: &ConnectorDeclaration = unsafe {
            match self
                .library
                .get::<*const ConnectorDeclaration>(DECLARATION_SYMBOL.as_bytes())
            {
                Ok(symbol) => {
                    let declaration: *const ConnectorDeclaration = *symbol;
                    &*declaration
                }
                // Dependency archives carry no declaration
                Err(_) => return Ok(Vec::new()),
            }
        };
        if let Some(reason) = declaration.incompatibility() {
            return Err(LinkError::Isolation(format!(
                "archive {} is incompatible with this host: {}",
                self.origin, reason
            )));
        }
        Ok((declaration.providers)())
    }
}

impl fmt::Debug for SharedLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedLibrary")
            .field("origin", &self.origin)
            .finish()
    }
}

/// The host process: the shared runtime every isolated context falls back to.
///
/// Its providers are the connectors linked into the binary.
pub struct HostResolver {
    process: Option<libloading::Library>,
}

impl HostResolver {
    pub fn new() -> Self {
        #[cfg(unix)]
        let process = Some(libloading::os::unix::Library::this().into());
        #[cfg(windows)]
        let process = libloading::os::windows::Library::this().ok().map(Into::into);
        #[cfg(not(any(unix, windows)))]
        let process = None;
        Self { process }
    }
}

impl Default for HostResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleResolver for HostResolver {
    fn origin(&self) -> &str {
        "host"
    }

    fn find_symbol(&self, name: &str) -> Option<Symbol> {
        let process = self.process.as_ref()?;
        // SAFETY: the address is only reported, never called through here.
        let symbol = unsafe { process.get::<*const ()>(name.as_bytes()) }.ok()?;
        Some(Symbol {
            name: name.to_string(),
            origin: self.origin().to_string(),
            address: *symbol as usize,
        })
    }

    fn providers(&self) -> Result<Vec<ConnectorProvider>> {
        Ok(linked_providers())
    }
}

/// A module assembled in memory, for statically linked connector units.
#[derive(Default)]
pub struct StaticModule {
    origin: String,
    symbols: HashMap<String, usize>,
    providers: Vec<ConnectorProvider>,
}

impl StaticModule {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    pub fn with_symbol(mut self, name: impl Into<String>, address: usize) -> Self {
        self.symbols.insert(name.into(), address);
        self
    }

    pub fn with_provider(mut self, provider: ConnectorProvider) -> Self {
        self.providers.push(provider);
        self
    }

    /// A module exposing the providers of a linked unit's declaration
    pub fn from_declaration(origin: impl Into<String>, declaration: &ConnectorDeclaration) -> Self {
        Self {
            origin: origin.into(),
            symbols: HashMap::new(),
            providers: (declaration.providers)(),
        }
    }
}

impl ModuleResolver for StaticModule {
    fn origin(&self) -> &str {
        &self.origin
    }

    fn find_symbol(&self, name: &str) -> Option<Symbol> {
        self.symbols.get(name).map(|address| Symbol {
            name: name.to_string(),
            origin: self.origin.clone(),
            address: *address,
        })
    }

    fn providers(&self) -> Result<Vec<ConnectorProvider>> {
        Ok(self.providers.clone())
    }
}

/// Opens archive files into modules.
pub trait ArchiveLoader: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn ModuleResolver>>;
}

/// Opens archives as shared libraries
#[derive(Debug, Default, Clone, Copy)]
pub struct SharedLibraryLoader;

impl ArchiveLoader for SharedLibraryLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn ModuleResolver>> {
        Ok(Box::new(SharedLibrary::open(path)?))
    }
}

/// Open every archive, failing on the first that cannot be loaded
pub(crate) fn open_all(
    loader: &dyn ArchiveLoader,
    paths: &[PathBuf],
) -> Result<Vec<Box<dyn ModuleResolver>>> {
    paths.iter().map(|path| loader.open(path)).collect()
}
