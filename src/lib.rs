//! # tcp-proxy - SOCKS5 CONNECT proxy server
//!
//! tcp-proxy accepts SOCKS5 clients, negotiates the "no authentication"
//! method, parses a CONNECT request, dials the requested IPv4 address or
//! domain name and relays bytes in both directions until both sides are
//! done.
//!
//! ## Features
//!
//! - **CONNECT only**: BIND and UDP ASSOCIATE are answered with
//!   "command not supported"
//! - **IPv4 and domain destinations**: domains resolve to their first IPv4
//!   address, with bounded resolution and dial times
//! - **Half-close aware relay**: each direction shuts down independently
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tcp_proxy::config::load_config;
//! use tcp_proxy::server::run_server;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("config.toml")?;
//!     let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     run_server(config, shutdown_rx).await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! SOCKS5 Client -> tcp-proxy -> Target
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod server;
pub mod socks;
pub mod transport;

// Re-export commonly used items
pub use config::{load_config, Config};
pub use error::{ConnectError, ProxyError, ReplyCode, Socks5Error};
pub use server::{run_server, Server};

/// Version of the tcp-proxy library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "tcp-proxy");
    }
}
