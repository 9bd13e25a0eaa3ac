//! Shell wildcard matching on file names

use dlink_core::{LinkError, Result};
use globset::{GlobBuilder, GlobMatcher};

/// A wildcard applied to a file's name, never to its directory.
///
/// An absent, blank or `*` pattern matches every file.
#[derive(Debug, Clone)]
pub struct NameFilter {
    matcher: Option<GlobMatcher>,
}

impl NameFilter {
    pub fn new(pattern: Option<&str>) -> Result<Self> {
        let pattern = pattern.map(str::trim).filter(|p| !p.is_empty() && *p != "*");
        let matcher = match pattern {
            Some(pattern) => Some(
                GlobBuilder::new(pattern)
                    .literal_separator(true)
                    .build()
                    .map_err(|e| {
                        LinkError::Configuration(format!("invalid file pattern '{}': {}", pattern, e))
                    })?
                    .compile_matcher(),
            ),
            None => None,
        };
        Ok(Self { matcher })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.matcher
            .as_ref()
            .is_none_or(|matcher| matcher.is_match(file_name))
    }

    pub fn matches_all(&self) -> bool {
        self.matcher.is_none()
    }
}
