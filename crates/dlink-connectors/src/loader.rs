//! Connector registry and loader
//!
//! The loader owns one isolated context per table connector name. Contexts
//! are built on first use and stay cached until [`ConnectorLoader::release`].
//! File connectors are linked into the host and never loaded in isolation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dlink_core::{
    FileConnector, LinkConfig, LinkError, Parameter, ProviderKind, Result, TableConnector,
};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::ambient::{self, run_in_context};
use crate::archive::{archive_dir, list_archives};
use crate::isolation::{IsolatedContext, ResolutionPolicy};
use crate::resolver::{ArchiveLoader, HostResolver, ModuleResolver, SharedLibraryLoader, open_all};
use crate::scoped::ScopedTableConnector;

type ContextCell = Arc<OnceCell<Arc<IsolatedContext>>>;

/// A resolved, initialized connector
pub enum Connector {
    Table(ScopedTableConnector),
    File(Box<dyn FileConnector>),
}

impl Connector {
    pub fn name(&self) -> &str {
        match self {
            Connector::Table(c) => c.name(),
            Connector::File(c) => c.name(),
        }
    }

    pub fn test_connectivity(&mut self) -> bool {
        match self {
            Connector::Table(c) => c.test_connectivity(),
            Connector::File(c) => c.test_connectivity(),
        }
    }

    pub fn close(&mut self) -> Result<()> {
        match self {
            Connector::Table(c) => c.close(),
            Connector::File(c) => c.close(),
        }
    }
}

/// Registry of isolated contexts keyed by connector name.
pub struct ConnectorLoader {
    connector_root: PathBuf,
    extensions: Vec<String>,
    policy: ResolutionPolicy,
    host: Arc<dyn ModuleResolver>,
    archive_loader: Arc<dyn ArchiveLoader>,
    contexts: Mutex<HashMap<String, ContextCell>>,
}

impl ConnectorLoader {
    /// A loader reading shared-library archives under `connector_root`
    pub fn new(connector_root: impl Into<PathBuf>) -> Self {
        let defaults = dlink_core::LoaderConfig::default();
        Self {
            connector_root: connector_root.into(),
            extensions: defaults.archive_extensions,
            policy: ResolutionPolicy::default(),
            host: Arc::new(HostResolver::new()),
            archive_loader: Arc::new(SharedLibraryLoader),
            contexts: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &LinkConfig) -> Self {
        let mut loader = Self::new(config.connector_root());
        loader.extensions = config.loader.archive_extensions.clone();
        loader.policy = ResolutionPolicy::with_extra(config.loader.shared_prefixes.iter().cloned());
        loader
    }

    pub fn with_host(mut self, host: Arc<dyn ModuleResolver>) -> Self {
        self.host = host;
        self
    }

    pub fn with_archive_loader(mut self, loader: Arc<dyn ArchiveLoader>) -> Self {
        self.archive_loader = loader;
        self
    }

    pub fn with_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn connector_root(&self) -> &Path {
        &self.connector_root
    }

    /// The isolated context for `name`, built on first use.
    ///
    /// Concurrent first callers block on a single construction and all
    /// observe the same instance. A failed construction is not cached.
    #[tracing::instrument(skip(self), fields(connector = %name))]
    pub fn context(&self, name: &str, search_path: Option<&str>) -> Result<Arc<IsolatedContext>> {
        let cell = {
            let mut contexts = self.contexts.lock();
            Arc::clone(contexts.entry(cache_key(name)).or_default())
        };
        let context = cell.get_or_try_init(|| self.build_context(name, search_path))?;
        Ok(Arc::clone(context))
    }

    fn build_context(&self, name: &str, search_path: Option<&str>) -> Result<Arc<IsolatedContext>> {
        let dir = archive_dir(&self.connector_root, name, search_path);
        let archive_paths = list_archives(&dir, &self.extensions)?;
        let archives = open_all(self.archive_loader.as_ref(), &archive_paths)?;
        let parent: Arc<dyn ModuleResolver> = match ambient::current() {
            Some(current) => current,
            None => Arc::clone(&self.host),
        };
        tracing::info!(
            connector = %name,
            dir = %dir.display(),
            archives = archive_paths.len(),
            parent = %parent.origin(),
            "building isolated connector context"
        );
        Ok(Arc::new(IsolatedContext::new(
            name,
            archive_paths,
            archives,
            parent,
            self.policy.clone(),
        )))
    }

    /// Drop the cached context for `name`. Connectors already handed out
    /// keep their context alive until they are dropped.
    pub fn release(&self, name: &str) -> bool {
        let released = self.contexts.lock().remove(&cache_key(name)).is_some();
        if released {
            tracing::info!(connector = %name, "released connector context");
        }
        released
    }

    /// Names with a built context
    pub fn cached(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .contexts
            .lock()
            .iter()
            .filter_map(|(name, cell)| cell.get().map(|_| name.clone()))
            .collect();
        names.sort();
        names
    }

    /// Resolve and initialize the connector `param` names
    pub fn resolve(&self, param: &Parameter) -> Result<Connector> {
        if param.is_file() {
            self.file_connector(param).map(Connector::File)
        } else {
            self.table_connector(param).map(Connector::Table)
        }
    }

    /// Resolve a table connector inside its isolated context and initialize it
    #[tracing::instrument(skip(self, param), fields(connector = %param.name))]
    pub fn table_connector(&self, param: &Parameter) -> Result<ScopedTableConnector> {
        let context = self.context(&param.name, param.search_path.as_deref())?;
        let provider = context.find_provider(&param.name)?;
        let ProviderKind::Table(factory) = provider.kind else {
            return Err(LinkError::Configuration(format!(
                "connector '{}' is file-capable, not table-capable",
                param.name
            )));
        };
        let inner = run_in_context(&context, factory);
        let mut connector = ScopedTableConnector::new(inner, context);
        connector.initialize(param)?;
        tracing::debug!(connector = %param.name, endpoint = %param.endpoint(), "table connector initialized");
        Ok(connector)
    }

    /// Resolve a file connector linked into the host and initialize it
    #[tracing::instrument(skip(self, param), fields(connector = %param.name))]
    pub fn file_connector(&self, param: &Parameter) -> Result<Box<dyn FileConnector>> {
        let factory = self
            .host
            .providers()?
            .into_iter()
            .find_map(|provider| match provider.kind {
                ProviderKind::File(factory) if provider.matches(&param.name) => Some(factory),
                _ => None,
            })
            .ok_or_else(|| {
                LinkError::NotFound(format!("no file connector found with name '{}'", param.name))
            })?;
        let mut connector = factory();
        connector.initialize(param)?;
        Ok(connector)
    }

    /// Resolve, initialize and probe a connector.
    ///
    /// Every failure is reported as `false` and logged without credentials.
    pub fn test_connectivity(&self, param: &Parameter) -> bool {
        let mut connector = match self.resolve(param) {
            Ok(connector) => connector,
            Err(e) => {
                tracing::warn!(
                    connector = %param.name,
                    endpoint = %param.endpoint(),
                    error = %e,
                    "connector could not be initialized"
                );
                return false;
            }
        };
        let reachable = connector.test_connectivity();
        if let Err(e) = connector.close() {
            tracing::warn!(connector = %param.name, error = %e, "failed to close connector");
        }
        tracing::info!(connector = %param.name, endpoint = %param.endpoint(), reachable, "connectivity tested");
        reachable
    }
}

fn cache_key(name: &str) -> String {
    name.to_ascii_lowercase()
}
