//! Directory walking over remote filesystems that only expose a working
//! directory, a listing of it and `cd`.

use std::io::{self, Write};

use dlink_core::{LinkError, Result};

use crate::filter::NameFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

/// One entry of a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl RemoteEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }
}

/// Stateful remote filesystem session
pub trait RemoteFs {
    /// Absolute working directory
    fn pwd(&mut self) -> Result<String>;

    /// Change the working directory. `Ok(false)` when the directory does not
    /// exist or cannot be entered.
    fn cd(&mut self, dir: &str) -> Result<bool>;

    /// Entries of the working directory. May include `.` and `..`.
    fn list(&mut self) -> Result<Vec<RemoteEntry>>;
}

/// List files under `dir`, relative to it.
///
/// The session's working directory is restored before returning, on success
/// and on failure.
pub fn list_remote(
    fs: &mut dyn RemoteFs,
    dir: &str,
    pattern: Option<&str>,
    recursive: bool,
) -> Result<Vec<String>> {
    let filter = NameFilter::new(pattern)?;
    let start = fs.pwd()?;
    let outcome = list_from(fs, dir, &filter, recursive);
    restore(fs, &start);
    outcome
}

fn list_from(
    fs: &mut dyn RemoteFs,
    dir: &str,
    filter: &NameFilter,
    recursive: bool,
) -> Result<Vec<String>> {
    let dir = dir.trim();
    if !dir.is_empty() && !fs.cd(dir)? {
        return Err(LinkError::Configuration(format!(
            "remote directory does not exist: {}",
            dir
        )));
    }
    let root = fs.pwd()?;
    let mut found = Vec::new();
    collect(fs, &root, filter, recursive, &mut found)?;
    Ok(found
        .into_iter()
        .map(|path| relative_to(&root, &path))
        .collect())
}

fn collect(
    fs: &mut dyn RemoteFs,
    cwd: &str,
    filter: &NameFilter,
    recursive: bool,
    found: &mut Vec<String>,
) -> Result<()> {
    for entry in fs.list()? {
        if entry.name == "." || entry.name == ".." {
            continue;
        }
        let path = join_remote(cwd, &entry.name);
        match entry.kind {
            EntryKind::File if filter.matches(&entry.name) => found.push(path),
            EntryKind::Directory if recursive => {
                if !fs.cd(&path)? {
                    tracing::warn!(dir = %path, "skipping remote directory that cannot be entered");
                    continue;
                }
                let nested = collect(fs, &path, filter, recursive, found);
                restore(fs, cwd);
                nested?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn restore(fs: &mut dyn RemoteFs, dir: &str) {
    match fs.cd(dir) {
        Ok(true) => {}
        Ok(false) => tracing::warn!(dir = %dir, "could not restore remote working directory"),
        Err(e) => tracing::warn!(dir = %dir, error = %e, "could not restore remote working directory"),
    }
}

/// Join a remote directory and an entry name with `/`
pub fn join_remote(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

fn relative_to(root: &str, path: &str) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .trim_start_matches('/')
        .to_string()
}

type Upload = Box<dyn FnMut(&[u8]) -> io::Result<()> + Send>;

/// Writer for servers that only accept whole-file uploads.
///
/// Bytes are buffered and sent on `flush`, and on drop when unflushed data
/// remains. Each upload replaces the remote file with the full buffer.
pub struct BufferedUpload {
    path: String,
    buffer: Vec<u8>,
    dirty: bool,
    upload: Upload,
}

impl BufferedUpload {
    pub fn new(path: impl Into<String>, upload: Upload) -> Self {
        Self {
            path: path.into(),
            buffer: Vec::new(),
            dirty: true,
            upload,
        }
    }
}

impl Write for BufferedUpload {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        self.dirty = true;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.dirty {
            (self.upload)(&self.buffer)?;
            self.dirty = false;
        }
        Ok(())
    }
}

impl Drop for BufferedUpload {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::error!(path = %self.path, error = %e, "remote upload failed");
        }
    }
}
