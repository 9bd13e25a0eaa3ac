//! File-capable connectors: local filesystem, FTP and SFTP.
//!
//! These connectors are linked into the host and registered through
//! `inventory`, so they never run inside an isolated context.

mod filter;
mod ftp;
mod local;
mod remote;
mod sftp;

#[cfg(test)]
mod filter_tests;
#[cfg(test)]
mod local_tests;
#[cfg(test)]
mod remote_tests;
#[cfg(test)]
mod ftp_tests;
#[cfg(test)]
mod sftp_tests;

pub use filter::NameFilter;
pub use ftp::{ANONYMOUS_PASSWORD, ANONYMOUS_USER, FtpConnector, FtpSettings};
pub use local::LocalFileConnector;
pub use remote::{BufferedUpload, EntryKind, RemoteEntry, RemoteFs, join_remote, list_remote};
pub use sftp::{SftpConnector, SftpSettings};

use dlink_core::{ConnectorProvider, FileConnector, connector_names};

fn local_file() -> Box<dyn FileConnector> {
    Box::new(LocalFileConnector::default())
}

fn ftp() -> Box<dyn FileConnector> {
    Box::new(FtpConnector::default())
}

fn sftp() -> Box<dyn FileConnector> {
    Box::new(SftpConnector::default())
}

inventory::submit! { ConnectorProvider::file(connector_names::LOCAL_FILE, local_file) }
inventory::submit! { ConnectorProvider::file(connector_names::FTP, ftp) }
inventory::submit! { ConnectorProvider::file(connector_names::SFTP, sftp) }

/// File providers from this crate, for hosts that do not rely on `inventory`
pub fn providers() -> Vec<ConnectorProvider> {
    vec![
        ConnectorProvider::file(connector_names::LOCAL_FILE, local_file),
        ConnectorProvider::file(connector_names::FTP, ftp),
        ConnectorProvider::file(connector_names::SFTP, sftp),
    ]
}
