//! Outbound connection establishment
//!
//! Turns a parsed [`AddressDescriptor`] into a live TCP connection, or a
//! [`ConnectError`] that knows which reply code to send.

use super::resolver::{Resolve, SystemResolver};
use super::types::{Address, AddressDescriptor};
use crate::config::SocksConfig;
use crate::error::ConnectError;
use crate::transport::SocketOpts;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::debug;

/// Dials SOCKS5 destinations
#[derive(Debug, Clone)]
pub struct TargetConnector {
    resolver: Arc<dyn Resolve>,
    resolve_timeout: Duration,
    connect_timeout: Duration,
    socket_opts: SocketOpts,
}

impl Default for TargetConnector {
    fn default() -> Self {
        Self::new(Arc::new(SystemResolver), &SocksConfig::default())
    }
}

impl TargetConnector {
    /// Create a connector using the given resolver and timeouts
    pub fn new(resolver: Arc<dyn Resolve>, config: &SocksConfig) -> Self {
        TargetConnector {
            resolver,
            resolve_timeout: config.resolve_timeout(),
            connect_timeout: config.connect_timeout(),
            socket_opts: SocketOpts::default(),
        }
    }

    /// Set socket options applied to established connections
    pub fn with_socket_opts(mut self, opts: SocketOpts) -> Self {
        self.socket_opts = opts;
        self
    }

    /// Override the resolution and dial timeouts
    pub fn with_timeouts(mut self, resolve_timeout: Duration, connect_timeout: Duration) -> Self {
        self.resolve_timeout = resolve_timeout;
        self.connect_timeout = connect_timeout;
        self
    }

    /// Connect to `destination`
    ///
    /// Domain names are resolved first and only the first IPv4 address is
    /// dialed. Nothing is retried.
    pub async fn connect(&self, destination: &AddressDescriptor) -> Result<TcpStream, ConnectError> {
        let ip = match &destination.address {
            Address::Ipv4(ip) => *ip,
            Address::Domain(domain) => {
                let deadline = Instant::now() + self.resolve_timeout;
                let ips = self.resolver.resolve(domain, deadline).await?;
                ips.first()
                    .copied()
                    .ok_or_else(|| ConnectError::NoAddresses(domain.clone()))?
            }
        };
        let addr = SocketAddr::from((ip, destination.port));

        debug!("Connecting to target: {}", addr);

        let dial = TcpStream::connect(addr);
        let stream = match tokio::time::timeout(self.connect_timeout, dial).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(ConnectError::Dial { addr, source }),
            Err(_) => return Err(ConnectError::DialTimeout(addr)),
        };

        self.socket_opts.hint(&stream);

        Ok(stream)
    }
}
