//! Connector archive directory layout

use std::path::{Path, PathBuf};

use dlink_core::{LinkError, Result};

/// Directory holding a connector's archives.
///
/// An absolute `search_path` that exists is used as is. Otherwise the
/// directory is `<connector_root>/<search_path or name>`.
pub fn archive_dir(connector_root: &Path, name: &str, search_path: Option<&str>) -> PathBuf {
    let search_path = search_path.map(str::trim).filter(|p| !p.is_empty());
    if let Some(path) = search_path {
        let candidate = Path::new(path);
        if candidate.is_absolute() && candidate.exists() {
            return candidate.to_path_buf();
        }
    }
    connector_root.join(search_path.unwrap_or(name))
}

/// Archives directly inside `dir`, sorted by path.
///
/// A missing directory or one without archives is a configuration error.
pub fn list_archives(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(LinkError::Configuration(format!(
            "connector directory does not exist: {}",
            dir.display()
        )));
    }

    let mut archives = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_archive_extension(&path, extensions) {
            archives.push(path);
        }
    }

    if archives.is_empty() {
        return Err(LinkError::Configuration(format!(
            "no archives found in connector directory: {}",
            dir.display()
        )));
    }
    archives.sort();
    tracing::debug!(dir = %dir.display(), count = archives.len(), "found connector archives");
    Ok(archives)
}

fn has_archive_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}
