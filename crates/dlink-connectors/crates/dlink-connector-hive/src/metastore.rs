//! `metastore_uri` parsing and reachability

use std::fmt;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use dlink_core::{LinkError, Result};
use url::Url;

pub const METASTORE_URI: &str = "metastore_uri";

pub const DEFAULT_METASTORE_PORT: u16 = 9083;

/// One `thrift://host:port` metastore address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetastoreEndpoint {
    pub host: String,
    pub port: u16,
}

impl MetastoreEndpoint {
    /// Whether a TCP connection opens within `timeout`
    pub fn is_reachable(&self, timeout: Duration) -> bool {
        let addrs = match (self.host.as_str(), self.port).to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                tracing::debug!(endpoint = %self, error = %e, "metastore host did not resolve");
                return false;
            }
        };
        addrs
            .into_iter()
            .any(|addr| TcpStream::connect_timeout(&addr, timeout).is_ok())
    }
}

impl fmt::Display for MetastoreEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Parse a comma-separated list of `thrift://` metastore URIs
pub fn parse_metastore_uris(value: &str) -> Result<Vec<MetastoreEndpoint>> {
    let endpoints = value
        .split(',')
        .map(str::trim)
        .filter(|uri| !uri.is_empty())
        .map(parse_one)
        .collect::<Result<Vec<_>>>()?;
    if endpoints.is_empty() {
        return Err(LinkError::Configuration(format!(
            "'{}' names no metastore",
            METASTORE_URI
        )));
    }
    Ok(endpoints)
}

fn parse_one(uri: &str) -> Result<MetastoreEndpoint> {
    let url = Url::parse(uri)
        .map_err(|e| LinkError::Configuration(format!("invalid metastore uri '{}': {}", uri, e)))?;
    if url.scheme() != "thrift" {
        return Err(LinkError::Configuration(format!(
            "metastore uri '{}' must use the thrift scheme",
            uri
        )));
    }
    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| LinkError::Configuration(format!("metastore uri '{}' names no host", uri)))?;
    Ok(MetastoreEndpoint {
        host: host.to_string(),
        port: url.port().unwrap_or(DEFAULT_METASTORE_PORT),
    })
}
