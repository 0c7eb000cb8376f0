//! Server configuration types
//!
//! Defines the configuration structures for the listener and the SOCKS5
//! session handler.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// SOCKS5 session configuration
    #[serde(default)]
    pub socks: SocksConfig,
}

impl Config {
    /// Validate the whole configuration
    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()?;
        self.socks.validate()
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

/// Listener configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address to bind the listening socket to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Port to listen on; the command line takes precedence
    #[serde(default)]
    pub port: Option<u16>,

    /// Socket options for accepted and outbound connections
    #[serde(default)]
    pub tcp: TcpConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: None,
            tcp: TcpConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Socket address to listen on, if a port is configured
    pub fn listen_addr(&self) -> Result<SocketAddr, String> {
        let ip: IpAddr = self
            .bind_addr
            .parse()
            .map_err(|_| format!("Invalid bind address: {}", self.bind_addr))?;
        match self.port {
            Some(port) => Ok(SocketAddr::new(ip, port)),
            None => Err("No listen port configured".to_string()),
        }
    }

    /// Validate the listener configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.port == Some(0) {
            return Err("Port 0 is out of range (1-65535)".to_string());
        }
        self.listen_addr().map(|_| ())
    }
}

fn default_keepalive_secs() -> u64 {
    20
}

fn default_keepalive_interval() -> u64 {
    8
}

fn default_nodelay() -> bool {
    true
}

/// TCP socket configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TcpConfig {
    /// Enable TCP_NODELAY
    #[serde(default = "default_nodelay")]
    pub nodelay: bool,

    /// TCP keepalive timeout in seconds
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,

    /// TCP keepalive interval in seconds
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval: u64,
}

impl Default for TcpConfig {
    fn default() -> Self {
        TcpConfig {
            nodelay: default_nodelay(),
            keepalive_secs: default_keepalive_secs(),
            keepalive_interval: default_keepalive_interval(),
        }
    }
}

fn default_resolve_timeout() -> u64 {
    5
}

fn default_connect_timeout() -> u64 {
    10
}

/// SOCKS5 session configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SocksConfig {
    /// Deadline for domain name resolution in seconds
    #[serde(default = "default_resolve_timeout")]
    pub resolve_timeout_secs: u64,

    /// Timeout for dialing the target in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for SocksConfig {
    fn default() -> Self {
        Self {
            resolve_timeout_secs: default_resolve_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl SocksConfig {
    /// Resolution deadline as a [`Duration`]
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }

    /// Dial timeout as a [`Duration`]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.resolve_timeout_secs == 0 {
            return Err("resolve_timeout_secs must be greater than zero".to_string());
        }
        if self.connect_timeout_secs == 0 {
            return Err("connect_timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }
}
