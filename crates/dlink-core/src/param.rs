//! Connection parameters handed to connectors at initialization

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{DriverDescriptor, LinkError, Result};

/// Parameter kind used for file-capable connectors.
pub const FILE_KIND: &str = "File";

/// Normalized connection descriptor.
///
/// This is the only input a connector receives. It is built per invocation
/// and never persisted.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// Connector name, matched case-insensitively against registered providers
    pub name: String,
    /// Connection type; `File` routes to the file-capable connectors
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Driver-specific keys (JDBC `url`, FTP `passiveMode`, Kafka `bootstrap.servers`)
    #[serde(default)]
    pub config: BTreeMap<String, String>,
    /// Archive directory override; absolute, or relative to the connector directory
    #[serde(default)]
    pub search_path: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = Some(host.into());
        self.port = Some(port);
        self
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    pub fn with_search_path(mut self, path: impl Into<String>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    /// Whether this parameter targets a file-capable connector
    pub fn is_file(&self) -> bool {
        self.kind.eq_ignore_ascii_case(FILE_KIND)
    }

    /// Get a config value
    pub fn config_value(&self, key: &str) -> Option<&str> {
        self.config.get(key).map(|s| s.as_str())
    }

    /// Get a non-blank config value or fail naming the missing key
    pub fn require(&self, key: &str) -> Result<&str> {
        match self.config_value(key) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(LinkError::Configuration(format!(
                "connector '{}' requires config key '{}'",
                self.name, key
            ))),
        }
    }

    /// Parse a boolean config value, falling back to `default` when absent
    pub fn flag(&self, key: &str, default: bool) -> bool {
        self.config_value(key)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(default)
    }

    /// Host and port rendered for log and error messages. Never includes credentials.
    pub fn endpoint(&self) -> String {
        match (&self.host, self.port) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.clone(),
            _ => "<unset>".to_string(),
        }
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("config_keys", &self.config.keys().collect::<Vec<_>>())
            .field("search_path", &self.search_path)
            .finish()
    }
}

/// Persisted connection record, as returned by connection metadata lookup.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: i64,
    pub name: String,
    /// Connector name this connection uses (e.g. `MySQL`, `Kafka`)
    pub connector: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("connector", &self.connector)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Build the connector parameter for this connection.
    ///
    /// The search path is the descriptor's version directory when set,
    /// otherwise the connector name.
    pub fn to_parameter(&self, descriptor: &DriverDescriptor) -> Parameter {
        let kind = if descriptor.is_file_capable {
            FILE_KIND.to_string()
        } else {
            descriptor.family.clone()
        };
        Parameter {
            name: descriptor.name.clone(),
            kind,
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
            config: self.config.clone(),
            search_path: Some(
                descriptor
                    .search_path
                    .clone()
                    .unwrap_or_else(|| descriptor.name.clone()),
            ),
        }
    }

    /// Flatten this connection into the key/value properties passed through to stages.
    ///
    /// `broker` is renamed to `bootstrap.servers`.
    pub fn properties(&self, descriptor: &DriverDescriptor) -> IndexMap<String, String> {
        let mut props: IndexMap<String, String> = IndexMap::new();
        for (key, value) in &self.config {
            if key == "broker" {
                props.insert("bootstrap.servers".to_string(), value.clone());
            } else {
                props.insert(key.clone(), value.clone());
            }
        }
        if let Some(driver) = descriptor.properties.get("driver") {
            props.insert("driver".to_string(), driver.clone());
        }
        props.insert("type".to_string(), descriptor.family.clone());
        if let Some(host) = &self.host {
            props.insert("host".to_string(), host.clone());
        }
        if let Some(port) = self.port {
            props.insert("port".to_string(), port.to_string());
        }
        if let Some(user) = &self.user {
            props.insert("user".to_string(), user.clone());
        }
        if let Some(password) = &self.password {
            props.insert("password".to_string(), password.clone());
        }
        props
    }
}
