//! Isolated load contexts
//!
//! A context owns the archives of one connector and falls back to a parent
//! module. Names under a shared prefix always come from the parent so a
//! connector never brings its own copy of the runtime the host and the
//! connector exchange values through.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use dlink_core::{ConnectorProvider, LinkError, Result};
use parking_lot::RwLock;

use crate::resolver::{ModuleResolver, Symbol};

/// Prefixes always resolved from the parent
pub const DEFAULT_SHARED_PREFIXES: &[&str] = &[
    "std::",
    "core::",
    "alloc::",
    "__rust_",
    "rust_",
    "tracing::",
    "tracing_core::",
    "log::",
    "serde::",
    "serde_json::",
    "dlink_core::",
];

/// Parent-first prefix rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionPolicy {
    shared_prefixes: Vec<String>,
}

impl ResolutionPolicy {
    /// A policy with exactly the given prefixes
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            shared_prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// The built-in prefixes plus `extra`
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut policy = Self::default();
        for prefix in extra {
            let prefix = prefix.into();
            if !policy.shared_prefixes.contains(&prefix) {
                policy.shared_prefixes.push(prefix);
            }
        }
        policy
    }

    pub fn is_shared(&self, name: &str) -> bool {
        self.shared_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }

    pub fn shared_prefixes(&self) -> &[String] {
        &self.shared_prefixes
    }
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SHARED_PREFIXES.iter().copied())
    }
}

/// Resolution boundary around one connector's archives.
pub struct IsolatedContext {
    name: String,
    archive_paths: Vec<PathBuf>,
    archives: Vec<Box<dyn ModuleResolver>>,
    parent: Arc<dyn ModuleResolver>,
    policy: ResolutionPolicy,
    /// Symbols already defined by this context's archives
    loaded: RwLock<HashMap<String, Symbol>>,
}

impl IsolatedContext {
    pub fn new(
        name: impl Into<String>,
        archive_paths: Vec<PathBuf>,
        archives: Vec<Box<dyn ModuleResolver>>,
        parent: Arc<dyn ModuleResolver>,
        policy: ResolutionPolicy,
    ) -> Self {
        Self {
            name: name.into(),
            archive_paths,
            archives,
            parent,
            policy,
            loaded: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn archive_paths(&self) -> &[PathBuf] {
        &self.archive_paths
    }

    pub fn policy(&self) -> &ResolutionPolicy {
        &self.policy
    }

    /// Resolve a name.
    ///
    /// Shared names go to the parent only. Everything else is looked up in
    /// the archives first, then the parent.
    pub fn resolve(&self, name: &str) -> Result<Symbol> {
        if self.policy.is_shared(name) {
            return self.parent.find_symbol(name).ok_or_else(|| self.missing(name));
        }

        if let Some(symbol) = self.loaded.read().get(name) {
            return Ok(symbol.clone());
        }

        if let Some(symbol) = self.archives.iter().find_map(|a| a.find_symbol(name)) {
            let mut loaded = self.loaded.write();
            // A racing caller may have defined it first; keep that definition.
            let symbol = loaded.entry(name.to_string()).or_insert(symbol);
            return Ok(symbol.clone());
        }

        self.parent.find_symbol(name).ok_or_else(|| self.missing(name))
    }

    fn missing(&self, name: &str) -> LinkError {
        LinkError::Isolation(format!(
            "'{}' not found in the {} archive(s) of connector '{}' or in {}",
            name,
            self.archives.len(),
            self.name,
            self.parent.origin()
        ))
    }

    /// Every provider visible through this context, archives first
    pub fn providers(&self) -> Result<Vec<ConnectorProvider>> {
        let mut providers = Vec::new();
        for archive in &self.archives {
            providers.extend(archive.providers()?);
        }
        providers.extend(self.parent.providers()?);
        Ok(providers)
    }

    /// The provider registered under `connector`, compared case-insensitively
    pub fn find_provider(&self, connector: &str) -> Result<ConnectorProvider> {
        let providers = self.providers()?;
        tracing::debug!(
            connector = %connector,
            visible = providers.len(),
            "searching connector providers"
        );
        providers
            .into_iter()
            .find(|provider| provider.matches(connector))
            .ok_or_else(|| {
                LinkError::NotFound(format!(
                    "no connector found with name '{}' in {:?}",
                    connector, self.archive_paths
                ))
            })
    }
}

impl fmt::Debug for IsolatedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsolatedContext")
            .field("name", &self.name)
            .field("archive_paths", &self.archive_paths)
            .field("parent", &self.parent.origin())
            .field("policy", &self.policy)
            .finish()
    }
}

impl ModuleResolver for IsolatedContext {
    fn origin(&self) -> &str {
        &self.name
    }

    fn find_symbol(&self, name: &str) -> Option<Symbol> {
        self.resolve(name).ok()
    }

    fn providers(&self) -> Result<Vec<ConnectorProvider>> {
        IsolatedContext::providers(self)
    }
}
