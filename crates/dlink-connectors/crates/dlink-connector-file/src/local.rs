//! Local filesystem connector

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use dlink_core::{FileConnector, LinkError, Parameter, Result, connector_names};
use walkdir::WalkDir;

use crate::filter::NameFilter;

/// Reads and writes files on the host. Relative paths resolve against the
/// optional `rootDir` config key, or the process working directory.
#[derive(Debug, Default)]
pub struct LocalFileConnector {
    root: Option<PathBuf>,
}

impl LocalFileConnector {
    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl FileConnector for LocalFileConnector {
    fn name(&self) -> &str {
        connector_names::LOCAL_FILE
    }

    fn initialize(&mut self, param: &Parameter) -> Result<()> {
        self.root = param
            .config_value("rootDir")
            .map(str::trim)
            .filter(|root| !root.is_empty())
            .map(PathBuf::from);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn list_files_recursive(
        &mut self,
        dir: &str,
        pattern: Option<&str>,
        recursive: bool,
    ) -> Result<Vec<String>> {
        let root = self.resolve(dir);
        if !root.is_dir() {
            return Err(LinkError::Configuration(format!(
                "directory does not exist: {}",
                root.display()
            )));
        }

        let filter = NameFilter::new(pattern)?;
        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();
        for entry in WalkDir::new(&root)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| LinkError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                tracing::warn!(path = %entry.path().display(), "skipping file with non UTF-8 name");
                continue;
            };
            if !filter.matches(name) {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(&root) {
                files.push(relative_path(relative));
            }
        }
        tracing::debug!(dir = %root.display(), count = files.len(), "listed local files");
        Ok(files)
    }

    fn open_read(&mut self, path: &str) -> Result<Box<dyn Read + Send>> {
        let file = File::open(self.resolve(path))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn open_write(&mut self, path: &str) -> Result<Box<dyn Write + Send>> {
        let path = self.resolve(path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Box::new(BufWriter::new(File::create(path)?)))
    }

    fn test_connectivity(&mut self) -> bool {
        true
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// `/`-separated form of a relative path on every platform
fn relative_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
