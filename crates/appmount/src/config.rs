use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::path::Path;

use crate::error::{ServerError, ServerResult};

pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Addresses the server listens on, usually read from a JSON file.
///
/// Hosts may be IP literals or names; names resolve once, when the address
/// is requested.
///
/// ```json
/// { "host": "0.0.0.0", "port": 8080, "listeners": [{ "name": "admin", "port": 8081 }] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub listeners: Vec<ListenerConfig>,
}

/// A named listener; applications select it through their routing name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerConfig {
    pub name: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: 0,
            listeners: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> ServerResult<SocketAddr> {
        socket_addr(&self.host, self.port)
    }
}

impl ListenerConfig {
    pub fn addr(&self) -> ServerResult<SocketAddr> {
        socket_addr(&self.host, self.port)
    }
}

pub fn load_server_config(path: &Path) -> ServerResult<ServerConfig> {
    let data = std::fs::read_to_string(path).map_err(|error| {
        ServerError::Config(format!(
            "failed to read server config {}: {error}",
            path.display()
        ))
    })?;
    serde_json::from_str(&data).map_err(|error| {
        ServerError::Config(format!(
            "failed to parse server config {}: {error}",
            path.display()
        ))
    })
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

/// IP literals are used as-is; host names resolve to their first address.
fn socket_addr(host: &str, port: u16) -> ServerResult<SocketAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }
    (host, port)
        .to_socket_addrs()
        .map_err(|error| ServerError::Config(format!("invalid host {host}: {error}")))?
        .next()
        .ok_or_else(|| ServerError::Config(format!("host {host} has no addresses")))
}
