//! JDBC URL parsing

use std::collections::BTreeMap;
use std::time::Duration;

use dlink_core::{LinkError, Parameter, Result};
use url::Url;

/// Config keys never forwarded to a backend as connection options
pub const EXCLUDED_OPTIONS: &[&str] = &[
    "driver",
    "url",
    "database",
    "databaseName",
    "username",
    "password",
    "libDir",
    "svcType",
];

const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Wire protocol named by a JDBC sub-protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wire {
    MySql,
    Postgres,
    SqlServer,
    Unsupported(String),
}

impl Wire {
    fn from_subprotocol(subprotocol: &str) -> Self {
        match subprotocol.to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" | "tidb" => Wire::MySql,
            "postgresql" | "postgres" | "kingbase8" | "kingbase" => Wire::Postgres,
            "sqlserver" => Wire::SqlServer,
            other => Wire::Unsupported(other.to_string()),
        }
    }

    pub fn default_port(&self) -> Option<u16> {
        match self {
            Wire::MySql => Some(3306),
            Wire::Postgres => Some(5432),
            Wire::SqlServer => Some(1433),
            Wire::Unsupported(_) => None,
        }
    }

    /// Options the backend for this wire applies
    pub fn applied_options(&self) -> &'static [&'static str] {
        match self {
            Wire::MySql => &["connectionTimeout", "useSSL", "sslMode"],
            Wire::Postgres => &["connectionTimeout", "ApplicationName", "sslmode"],
            Wire::SqlServer => &[
                "connectionTimeout",
                "applicationName",
                "encrypt",
                "trustServerCertificate",
            ],
            Wire::Unsupported(_) => &[],
        }
    }
}

/// Where and how a JDBC connector connects
#[derive(Clone, PartialEq, Eq)]
pub struct JdbcTarget {
    pub wire: Wire,
    pub host: String,
    pub port: u16,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    /// URL query parameters and connector config, minus [`EXCLUDED_OPTIONS`]
    pub options: BTreeMap<String, String>,
}

impl JdbcTarget {
    /// Build a target from the required `url` config key.
    ///
    /// Host, port and database come from the URL, falling back to the
    /// parameter's host and port. An unsupported sub-protocol is reported
    /// as `NotSupported` before anything else is parsed.
    pub fn from_param(param: &Parameter) -> Result<Self> {
        let raw = param.require("url")?.trim();
        let rest = raw.strip_prefix("jdbc:").unwrap_or(raw);
        let subprotocol = rest.split(':').next().unwrap_or_default();
        let wire = Wire::from_subprotocol(subprotocol);
        if let Wire::Unsupported(name) = &wire {
            return Err(LinkError::NotSupported(format!(
                "connector '{}' uses JDBC sub-protocol '{}' which has no native backend",
                param.name, name
            )));
        }

        // SQL Server URLs carry `;key=value` properties after the address
        let (address, properties) = match &wire {
            Wire::SqlServer => split_properties(rest),
            _ => (rest, Vec::new()),
        };

        let url = Url::parse(address).map_err(|e| {
            LinkError::Configuration(format!("connector '{}' has an invalid url: {}", param.name, e))
        })?;

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .or_else(|| param.host.clone())
            .ok_or_else(|| {
                LinkError::Configuration(format!("connector '{}' url names no host", param.name))
            })?;
        let port = url
            .port()
            .or(param.port)
            .or(wire.default_port())
            .unwrap_or_default();
        let database = url
            .path_segments()
            .and_then(|mut segments| segments.next())
            .filter(|db| !db.is_empty())
            .map(str::to_string)
            .or_else(|| {
                properties
                    .iter()
                    .find(|(key, _)| {
                        key.eq_ignore_ascii_case("databaseName") || key.eq_ignore_ascii_case("database")
                    })
                    .map(|(_, value)| value.clone())
            })
            .or_else(|| param.config_value("database").map(str::to_string));

        let mut options: BTreeMap<String, String> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        options.extend(properties);
        for (key, value) in &param.config {
            options.insert(key.clone(), value.clone());
        }
        options.retain(|key, _| !EXCLUDED_OPTIONS.contains(&key.as_str()));

        Ok(Self {
            wire,
            host,
            port,
            database,
            user: param.user.clone(),
            password: param.password.clone(),
            options,
        })
    }

    /// Option value by case-insensitive key
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.trim())
    }

    /// Whether a boolean option is set to `true`
    pub fn flag(&self, key: &str) -> bool {
        self.option(key).is_some_and(|value| value.eq_ignore_ascii_case("true"))
    }

    /// Options no backend setting corresponds to
    pub fn ignored_options(&self) -> Vec<&str> {
        let applied = self.wire.applied_options();
        self.options
            .keys()
            .map(String::as_str)
            .filter(|key| !applied.iter().any(|known| known.eq_ignore_ascii_case(key)))
            .collect()
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `connectionTimeout` in milliseconds, 5 seconds when absent or invalid
    pub fn connect_timeout(&self) -> Duration {
        let millis = self
            .options
            .get("connectionTimeout")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS);
        Duration::from_millis(millis)
    }
}

impl std::fmt::Debug for JdbcTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JdbcTarget")
            .field("wire", &self.wire)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("options", &self.options.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Split `sqlserver://host:port;a=b;c=d` into the address and its properties
fn split_properties(rest: &str) -> (&str, Vec<(String, String)>) {
    let mut parts = rest.split(';');
    let address = parts.next().unwrap_or_default();
    let properties = parts
        .filter_map(|part| part.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect();
    (address, properties)
}
