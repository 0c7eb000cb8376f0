//! Test utilities for tcp-proxy
//!
//! This module provides common test utilities used across integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use tcp_proxy::config::Config;
use tcp_proxy::server::Server;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Port on loopback with nothing listening
pub async fn closed_port() -> u16 {
    let (listener, addr) = create_test_listener().await;
    drop(listener);
    addr.port()
}

/// Start an echo server that handles any number of connections
///
/// Each connection echoes until EOF, then half-closes its write side.
pub async fn spawn_echo_server() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut reader, mut writer) = stream.split();
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    addr
}

/// Running proxy bound to an ephemeral loopback port
pub struct TestProxy {
    /// Listening address
    pub addr: SocketAddr,
    shutdown_tx: broadcast::Sender<bool>,
}

impl TestProxy {
    /// Start a proxy with default settings
    pub async fn start() -> Self {
        Self::start_with(Config::default()).await
    }

    /// Start a proxy, overriding the listen address with loopback
    pub async fn start_with(mut config: Config) -> Self {
        config.server.bind_addr = "127.0.0.1".to_string();
        config.server.port = Some(0);

        let server = Server::bind(&config).await.unwrap();
        let addr = server.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        tokio::spawn(server.serve(shutdown_rx));

        TestProxy { addr, shutdown_tx }
    }

    /// Open a raw client connection
    pub async fn connect(&self) -> TcpStream {
        TcpStream::connect(self.addr).await.unwrap()
    }

    /// Open a client connection and complete method negotiation
    pub async fn connect_negotiated(&self) -> TcpStream {
        let mut stream = self.connect().await;
        stream
            .write_all(&socks5_mock::create_auth_request_no_auth())
            .await
            .unwrap();
        let mut resp = [0u8; 2];
        stream.read_exact(&mut resp).await.unwrap();
        assert_eq!(resp, [0x05, 0x00]);
        stream
    }

    /// Open a tunnel to `target` and check for a success reply
    pub async fn open_tunnel(&self, target: SocketAddr) -> TcpStream {
        let mut stream = self.connect_negotiated().await;
        let ip = match target {
            SocketAddr::V4(v4) => v4.ip().octets(),
            SocketAddr::V6(_) => panic!("IPv4 target expected"),
        };
        stream
            .write_all(&socks5_mock::create_connect_ipv4(ip, target.port()))
            .await
            .unwrap();
        let reply = read_reply(&mut stream).await;
        assert_eq!(reply[1], 0x00, "unexpected reply {:?}", reply);
        stream
    }

    /// Stop accepting connections
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Read a 10-byte SOCKS5 reply
pub async fn read_reply(stream: &mut TcpStream) -> [u8; 10] {
    let mut reply = [0u8; 10];
    stream.read_exact(&mut reply).await.unwrap();
    reply
}

/// Read until the proxy closes the connection
pub async fn read_until_closed(stream: &mut TcpStream) -> Vec<u8> {
    let mut rest = Vec::new();
    let _ = stream.read_to_end(&mut rest).await;
    rest
}

/// Mock SOCKS5 handshake data
pub mod socks5_mock {
    use tcp_proxy::socks::*;

    /// Create a no-auth method selection request
    pub fn create_auth_request_no_auth() -> Vec<u8> {
        vec![SOCKS5_VERSION, 1, SOCKS5_AUTH_METHOD_NONE]
    }

    /// Create a password auth method selection request
    pub fn create_auth_request_password() -> Vec<u8> {
        vec![SOCKS5_VERSION, 1, SOCKS5_AUTH_METHOD_PASSWORD]
    }

    /// Create a request with an arbitrary command to an IPv4 address
    pub fn create_command_ipv4(command: u8, ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut cmd = vec![SOCKS5_VERSION, command, SOCKS5_RESERVED, SOCKS5_ADDR_TYPE_IPV4];
        cmd.extend_from_slice(&ip);
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }

    /// Create a connect command to IPv4 address
    pub fn create_connect_ipv4(ip: [u8; 4], port: u16) -> Vec<u8> {
        create_command_ipv4(SOCKS5_CMD_TCP_CONNECT, ip, port)
    }

    /// Create a connect command to domain
    pub fn create_connect_domain(domain: &str, port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_DOMAIN,
            domain.len() as u8,
        ];
        cmd.extend_from_slice(domain.as_bytes());
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }
}
