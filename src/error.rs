//! Error types for tcp-proxy
//!
//! This module defines the error types used throughout the proxy and the
//! SOCKS5 reply code every protocol-level failure is classified into.

use crate::socks::SessionState;
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Main error type for tcp-proxy operations
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// SOCKS5 protocol error
    #[error("SOCKS5 error: {0}")]
    Socks5(#[from] Socks5Error),

    /// Outbound connection error
    #[error("Connect error: {0}")]
    Connect(#[from] ConnectError),
}

/// SOCKS5 handshake and request errors
#[derive(Error, Debug)]
pub enum Socks5Error {
    /// Unsupported SOCKS version
    #[error("Unsupported SOCKS version: {0}")]
    UnsupportedVersion(u8),

    /// Client offered zero authentication methods
    #[error("No authentication methods provided")]
    NoMethods,

    /// No acceptable authentication method
    #[error("No acceptable authentication method")]
    NoAcceptableMethod,

    /// Command other than CONNECT
    #[error("Command not supported: {0}")]
    CommandNotSupported(u8),

    /// Address type not supported
    #[error("Address type not supported: {0}")]
    AddressTypeNotSupported(u8),

    /// Domain name bytes are not valid UTF-8
    #[error("Invalid domain name: {0}")]
    InvalidDomain(String),

    /// Short read or write while talking to the client
    #[error("{context}: {source}")]
    Io {
        /// What was being read or written
        context: &'static str,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Session state machine was driven backwards or past a terminal state
    #[error("Invalid session transition: {from} -> {to}")]
    InvalidTransition {
        /// State the session was in
        from: SessionState,
        /// State that was requested
        to: SessionState,
    },
}

impl Socks5Error {
    /// Wrap an IO error with a short description of the failed step
    pub fn io(context: &'static str, source: io::Error) -> Self {
        Socks5Error::Io { context, source }
    }

    /// Reply code the client should receive for this error
    pub fn reply_code(&self) -> ReplyCode {
        match self {
            Socks5Error::AddressTypeNotSupported(_) => ReplyCode::AddressTypeNotSupported,
            Socks5Error::CommandNotSupported(_) => ReplyCode::CommandNotSupported,
            _ => ReplyCode::GeneralFailure,
        }
    }
}

/// Errors raised while establishing the outbound connection
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Domain lookup failed
    #[error("Failed to resolve {domain}: {source}")]
    Resolve {
        /// Domain that was looked up
        domain: String,
        /// Underlying resolver error
        #[source]
        source: io::Error,
    },

    /// Domain lookup did not finish before its deadline
    #[error("Resolution of {0} timed out")]
    ResolveTimeout(String),

    /// Domain lookup succeeded but returned no IPv4 addresses
    #[error("No IPv4 addresses found for {0}")]
    NoAddresses(String),

    /// TCP dial failed
    #[error("Failed to connect to {addr}: {source}")]
    Dial {
        /// Address that was dialed
        addr: SocketAddr,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// TCP dial did not finish before its timeout
    #[error("Connection timeout to {0}")]
    DialTimeout(SocketAddr),
}

impl ConnectError {
    /// Reply code the client should receive for this failure
    pub fn reply_code(&self) -> ReplyCode {
        match self {
            ConnectError::Resolve { .. }
            | ConnectError::ResolveTimeout(_)
            | ConnectError::NoAddresses(_) => ReplyCode::HostUnreachable,
            ConnectError::Dial { source, .. } => ReplyCode::from(source),
            ConnectError::DialTimeout(_) => ReplyCode::TtlExpired,
        }
    }
}

/// Reply codes for SOCKS5 protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReplyCode {
    /// Command succeeded
    Succeeded = 0x00,
    /// General SOCKS server failure
    GeneralFailure = 0x01,
    /// Connection not allowed by ruleset
    ConnectionNotAllowed = 0x02,
    /// Network unreachable
    NetworkUnreachable = 0x03,
    /// Host unreachable
    HostUnreachable = 0x04,
    /// Connection refused
    ConnectionRefused = 0x05,
    /// TTL expired
    TtlExpired = 0x06,
    /// Command not supported
    CommandNotSupported = 0x07,
    /// Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl From<ReplyCode> for u8 {
    fn from(code: ReplyCode) -> Self {
        code as u8
    }
}

impl From<&io::Error> for ReplyCode {
    fn from(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => ReplyCode::ConnectionRefused,
            io::ErrorKind::NetworkUnreachable | io::ErrorKind::NetworkDown => {
                ReplyCode::NetworkUnreachable
            }
            io::ErrorKind::HostUnreachable => ReplyCode::HostUnreachable,
            // transient conditions
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => {
                ReplyCode::TtlExpired
            }
            _ => ReplyCode::GeneralFailure,
        }
    }
}
