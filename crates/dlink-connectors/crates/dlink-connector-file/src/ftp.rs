//! FTP connector over `suppaftp`

use std::io::{Cursor, Read, Write};
use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use dlink_core::{FileConnector, LinkError, Parameter, Result, connector_names};
use parking_lot::Mutex;
use suppaftp::types::{FileType, FormatControl};
use suppaftp::{FtpStream, Mode};

use crate::remote::{BufferedUpload, EntryKind, RemoteEntry, RemoteFs, list_remote};

pub const ANONYMOUS_USER: &str = "anonymous";
pub const ANONYMOUS_PASSWORD: &str = "guest@dataround.io";

const DEFAULT_PORT: u16 = 21;
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Connection settings read from a [`Parameter`]
#[derive(Clone, PartialEq, Eq)]
pub struct FtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub passive: bool,
    pub binary: bool,
    pub timeout: Duration,
    pub encoding: String,
}

impl FtpSettings {
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
            .unwrap_or_else(|| ANONYMOUS_USER.to_string());
        let password = match param.password.clone().filter(|p| !p.is_empty()) {
            Some(password) => password,
            None if user.eq_ignore_ascii_case(ANONYMOUS_USER) => ANONYMOUS_PASSWORD.to_string(),
            None => String::new(),
        };
        let timeout_ms = match param.config_value("timeout") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                LinkError::Configuration(format!("invalid FTP timeout '{}'", raw))
            })?,
            None => DEFAULT_TIMEOUT_MS,
        };
        Ok(Self {
            host,
            port: param.port.unwrap_or(DEFAULT_PORT),
            user,
            password,
            passive: param.flag("passiveMode", true),
            binary: param.flag("binaryMode", true),
            timeout: Duration::from_millis(timeout_ms),
            encoding: param
                .config_value("encoding")
                .unwrap_or("UTF-8")
                .to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn address(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                LinkError::Connectivity(format!("could not resolve FTP host {}", self.endpoint()))
            })
    }
}

impl std::fmt::Debug for FtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("passive", &self.passive)
            .field("binary", &self.binary)
            .field("timeout", &self.timeout)
            .field("encoding", &self.encoding)
            .finish()
    }
}

/// FTP file connector. The control connection is shared with open upload
/// writers, which need it to send their buffer.
#[derive(Default)]
pub struct FtpConnector {
    settings: Option<FtpSettings>,
    stream: Option<Arc<Mutex<FtpStream>>>,
}

impl FtpConnector {
    fn stream(&self) -> Result<&Arc<Mutex<FtpStream>>> {
        self.stream
            .as_ref()
            .ok_or_else(|| LinkError::Connectivity("FTP connector is not initialized".into()))
    }

    fn connect(settings: &FtpSettings) -> Result<FtpStream> {
        let endpoint = settings.endpoint();
        let mut stream = FtpStream::connect_timeout(settings.address()?, settings.timeout)
            .map_err(|e| LinkError::Connectivity(format!("failed to connect to FTP server {}: {}", endpoint, e)))?;
        if let Err(e) = stream.get_ref().set_read_timeout(Some(settings.timeout)) {
            tracing::debug!(endpoint = %endpoint, error = %e, "could not set FTP read timeout");
        }
        stream
            .login(settings.user.as_str(), settings.password.as_str())
            .map_err(|e| {
                LinkError::Connectivity(format!(
                    "FTP login as '{}' failed on {}: {}",
                    settings.user, endpoint, e
                ))
            })?;
        stream.set_mode(if settings.passive { Mode::Passive } else { Mode::Active });
        let file_type = if settings.binary {
            FileType::Binary
        } else {
            FileType::Ascii(FormatControl::Default)
        };
        stream
            .transfer_type(file_type)
            .map_err(|e| LinkError::Connectivity(format!("FTP transfer type rejected by {}: {}", endpoint, e)))?;
        Ok(stream)
    }
}

impl FileConnector for FtpConnector {
    fn name(&self) -> &str {
        connector_names::FTP
    }

    #[tracing::instrument(skip(self, param), fields(endpoint = %param.endpoint()))]
    fn initialize(&mut self, param: &Parameter) -> Result<()> {
        let settings = FtpSettings::from_param(param)?;
        if !settings.encoding.eq_ignore_ascii_case("UTF-8") {
            tracing::warn!(encoding = %settings.encoding, "only UTF-8 file names are supported; ignoring encoding");
        }
        let stream = Self::connect(&settings)?;
        tracing::info!(endpoint = %settings.endpoint(), passive = settings.passive, "connected to FTP server");
        self.stream = Some(Arc::new(Mutex::new(stream)));
        self.settings = Some(settings);
        Ok(())
    }

    fn list_files_recursive(
        &mut self,
        dir: &str,
        pattern: Option<&str>,
        recursive: bool,
    ) -> Result<Vec<String>> {
        let mut stream = self.stream()?.lock();
        list_remote(&mut *stream, dir, pattern, recursive)
    }

    fn open_read(&mut self, path: &str) -> Result<Box<dyn Read + Send>> {
        let buffer: Cursor<Vec<u8>> = self
            .stream()?
            .lock()
            .retr_as_buffer(path)
            .map_err(|e| ftp_io(format!("failed to download '{}'", path), e))?;
        Ok(Box::new(buffer))
    }

    fn open_write(&mut self, path: &str) -> Result<Box<dyn Write + Send>> {
        let stream = Arc::clone(self.stream()?);
        let target = path.to_string();
        let upload = move |bytes: &[u8]| {
            stream
                .lock()
                .put_file(target.as_str(), &mut Cursor::new(bytes))
                .map(|_| ())
                .map_err(std::io::Error::other)
        };
        Ok(Box::new(BufferedUpload::new(path, Box::new(upload))))
    }

    fn test_connectivity(&mut self) -> bool {
        match self.stream() {
            Ok(stream) => stream.lock().noop().is_ok(),
            Err(_) => false,
        }
    }

    fn close(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.lock().quit() {
                tracing::debug!(error = %e, "FTP quit failed");
            }
        }
        self.settings = None;
        Ok(())
    }
}

impl RemoteFs for FtpStream {
    fn pwd(&mut self) -> Result<String> {
        FtpStream::pwd(self).map_err(|e| ftp_io("failed to read FTP working directory".into(), e))
    }

    fn cd(&mut self, dir: &str) -> Result<bool> {
        Ok(self.cwd(dir).is_ok())
    }

    fn list(&mut self) -> Result<Vec<RemoteEntry>> {
        let lines = FtpStream::list(self, None)
            .map_err(|e| ftp_io("failed to list FTP directory".into(), e))?;
        Ok(lines.iter().filter_map(|line| parse_list_line(line)).collect())
    }
}

/// Parse one `LIST` line in UNIX or DOS format
pub(crate) fn parse_list_line(line: &str) -> Option<RemoteEntry> {
    match suppaftp::list::File::from_str(line) {
        Ok(file) => {
            let kind = if file.is_directory() {
                EntryKind::Directory
            } else if file.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };
            Some(RemoteEntry {
                name: file.name().to_string(),
                kind,
            })
        }
        Err(e) => {
            tracing::debug!(line = %line, error = ?e, "skipping unparsable FTP listing line");
            None
        }
    }
}

fn ftp_io(context: String, error: suppaftp::FtpError) -> LinkError {
    LinkError::Io(std::io::Error::other(format!("{}: {}", context, error)))
}

