//! SFTP connector over `ssh2`

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use dlink_core::{FileConnector, LinkError, Parameter, Result, connector_names};
use ssh2::{CheckResult, KnownHostFileKind, Session, Sftp};

use crate::remote::{EntryKind, RemoteEntry, RemoteFs, join_remote, list_remote};

const DEFAULT_PORT: u16 = 22;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings read from a [`Parameter`]
#[derive(Clone, PartialEq, Eq)]
pub struct SftpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub private_key_path: Option<PathBuf>,
    pub private_key_passphrase: Option<String>,
    pub strict_host_key_checking: bool,
}

impl SftpSettings {
    pub fn from_param(param: &Parameter) -> Result<Self> {
        let host = param
            .host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| {
                LinkError::Configuration(format!("connector '{}' requires a host", param.name))
            })?
            .to_string();
        let user = param
            .user
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                LinkError::Configuration(format!("connector '{}' requires a user", param.name))
            })?;
        let non_blank = |key: &str| {
            param
                .config_value(key)
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        Ok(Self {
            host,
            port: param.port.unwrap_or(DEFAULT_PORT),
            user,
            password: param.password.clone(),
            private_key_path: non_blank("privateKeyPath").map(PathBuf::from),
            private_key_passphrase: non_blank("privateKeyPassphrase").map(str::to_string),
            strict_host_key_checking: param.flag("strictHostKeyChecking", false),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Debug for SftpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SftpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("private_key_path", &self.private_key_path)
            .field("strict_host_key_checking", &self.strict_host_key_checking)
            .finish()
    }
}

/// SFTP file connector.
///
/// The SFTP subsystem has no working directory of its own, so one is kept
/// client-side and relative paths resolve against it.
#[derive(Default)]
pub struct SftpConnector {
    session: Option<Session>,
    sftp: Option<Sftp>,
    cwd: String,
}

impl SftpConnector {
    fn sftp(&self) -> Result<&Sftp> {
        self.sftp
            .as_ref()
            .ok_or_else(|| LinkError::Connectivity("SFTP connector is not initialized".into()))
    }

    fn absolute(&self, path: &str) -> PathBuf {
        if path.starts_with('/') {
            PathBuf::from(path)
        } else {
            PathBuf::from(join_remote(&self.cwd, path))
        }
    }

    fn connect(settings: &SftpSettings) -> Result<Session> {
        let endpoint = settings.endpoint();
        let address = (settings.host.as_str(), settings.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| LinkError::Connectivity(format!("could not resolve SFTP host {}", endpoint)))?;
        let tcp = TcpStream::connect_timeout(&address, CONNECT_TIMEOUT).map_err(|e| {
            LinkError::Connectivity(format!("failed to connect to SFTP server {}: {}", endpoint, e))
        })?;

        let mut session = Session::new().map_err(ssh_error)?;
        session.set_tcp_stream(tcp);
        session.set_timeout(CONNECT_TIMEOUT.as_millis() as u32);
        session
            .handshake()
            .map_err(|e| LinkError::Connectivity(format!("SSH handshake with {} failed: {}", endpoint, e)))?;

        if settings.strict_host_key_checking {
            verify_host_key(&session, settings)?;
        }

        let auth = match &settings.private_key_path {
            Some(key) => session.userauth_pubkey_file(
                &settings.user,
                None,
                key,
                settings.private_key_passphrase.as_deref(),
            ),
            None => session.userauth_password(
                &settings.user,
                settings.password.as_deref().unwrap_or_default(),
            ),
        };
        if let Err(e) = auth {
            return Err(LinkError::Connectivity(format!(
                "SFTP authentication as '{}' failed on {}: {}",
                settings.user, endpoint, e
            )));
        }
        if !session.authenticated() {
            return Err(LinkError::Connectivity(format!(
                "SFTP authentication as '{}' was rejected by {}",
                settings.user, endpoint
            )));
        }
        Ok(session)
    }
}

fn verify_host_key(session: &Session, settings: &SftpSettings) -> Result<()> {
    let known_hosts_path = dirs::home_dir()
        .map(|home| home.join(".ssh").join("known_hosts"))
        .ok_or_else(|| LinkError::Configuration("cannot locate ~/.ssh/known_hosts".into()))?;
    let mut known_hosts = session.known_hosts().map_err(ssh_error)?;
    known_hosts
        .read_file(&known_hosts_path, KnownHostFileKind::OpenSSH)
        .map_err(|e| {
            LinkError::Configuration(format!(
                "failed to read {}: {}",
                known_hosts_path.display(),
                e
            ))
        })?;
    let (key, _) = session
        .host_key()
        .ok_or_else(|| LinkError::Connectivity(format!("{} sent no host key", settings.endpoint())))?;
    match known_hosts.check_port(&settings.host, settings.port, key) {
        CheckResult::Match => Ok(()),
        CheckResult::Mismatch => Err(LinkError::Connectivity(format!(
            "host key for {} does not match known_hosts",
            settings.endpoint()
        ))),
        CheckResult::NotFound | CheckResult::Failure => Err(LinkError::Connectivity(format!(
            "host {} is not in known_hosts",
            settings.endpoint()
        ))),
    }
}

impl FileConnector for SftpConnector {
    fn name(&self) -> &str {
        connector_names::SFTP
    }

    #[tracing::instrument(skip(self, param), fields(endpoint = %param.endpoint()))]
    fn initialize(&mut self, param: &Parameter) -> Result<()> {
        let settings = SftpSettings::from_param(param)?;
        let session = Self::connect(&settings)?;
        let sftp = session.sftp().map_err(ssh_error)?;
        let home = sftp.realpath(Path::new(".")).map_err(ssh_error)?;
        self.cwd = home.to_string_lossy().into_owned();
        self.sftp = Some(sftp);
        self.session = Some(session);
        tracing::info!(endpoint = %settings.endpoint(), cwd = %self.cwd, "connected to SFTP server");
        Ok(())
    }

    fn list_files_recursive(
        &mut self,
        dir: &str,
        pattern: Option<&str>,
        recursive: bool,
    ) -> Result<Vec<String>> {
        let sftp = self
            .sftp
            .as_ref()
            .ok_or_else(|| LinkError::Connectivity("SFTP connector is not initialized".into()))?;
        let mut fs = SftpFs {
            sftp,
            cwd: self.cwd.clone(),
        };
        list_remote(&mut fs, dir, pattern, recursive)
    }

    fn open_read(&mut self, path: &str) -> Result<Box<dyn Read + Send>> {
        let file = self.sftp()?.open(&self.absolute(path)).map_err(ssh_error)?;
        Ok(Box::new(file))
    }

    fn open_write(&mut self, path: &str) -> Result<Box<dyn Write + Send>> {
        let file = self.sftp()?.create(&self.absolute(path)).map_err(ssh_error)?;
        Ok(Box::new(file))
    }

    fn test_connectivity(&mut self) -> bool {
        match self.sftp() {
            Ok(sftp) => sftp.realpath(Path::new(".")).is_ok(),
            Err(_) => false,
        }
    }

    fn close(&mut self) -> Result<()> {
        self.sftp = None;
        if let Some(session) = self.session.take() {
            if let Err(e) = session.disconnect(None, "closing", None) {
                tracing::debug!(error = %e, "SSH disconnect failed");
            }
        }
        Ok(())
    }
}

/// Client-side working directory over an SFTP channel
struct SftpFs<'a> {
    sftp: &'a Sftp,
    cwd: String,
}

impl RemoteFs for SftpFs<'_> {
    fn pwd(&mut self) -> Result<String> {
        Ok(self.cwd.clone())
    }

    fn cd(&mut self, dir: &str) -> Result<bool> {
        let target = if dir.starts_with('/') {
            dir.to_string()
        } else {
            join_remote(&self.cwd, dir)
        };
        match self.sftp.stat(Path::new(&target)) {
            Ok(stat) if stat.is_dir() => {
                self.cwd = self
                    .sftp
                    .realpath(Path::new(&target))
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or(target);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn list(&mut self) -> Result<Vec<RemoteEntry>> {
        let entries = self.sftp.readdir(Path::new(&self.cwd)).map_err(ssh_error)?;
        Ok(entries
            .into_iter()
            .filter_map(|(path, stat)| {
                let name = path.file_name()?.to_string_lossy().into_owned();
                let kind = if stat.is_dir() {
                    EntryKind::Directory
                } else if stat.is_file() {
                    EntryKind::File
                } else {
                    EntryKind::Other
                };
                Some(RemoteEntry { name, kind })
            })
            .collect())
    }
}

fn ssh_error(error: ssh2::Error) -> LinkError {
    LinkError::Io(error.into())
}
