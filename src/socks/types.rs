//! SOCKS5 type definitions
//!
//! Defines the core types used in SOCKS5 protocol handling.

use super::consts::*;
use crate::error::Socks5Error;
use std::fmt;
use std::net::Ipv4Addr;

/// SOCKS5 command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocksCommand {
    /// TCP CONNECT - establish a TCP connection to target
    Connect,
    /// TCP BIND - not supported
    Bind,
    /// UDP ASSOCIATE - not supported
    UdpAssociate,
    /// Any other command byte
    Unknown(u8),
}

impl SocksCommand {
    /// Parse a command byte into SocksCommand
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            SOCKS5_CMD_TCP_CONNECT => SocksCommand::Connect,
            SOCKS5_CMD_TCP_BIND => SocksCommand::Bind,
            SOCKS5_CMD_UDP_ASSOCIATE => SocksCommand::UdpAssociate,
            other => SocksCommand::Unknown(other),
        }
    }

    /// Convert SocksCommand to byte
    pub fn to_byte(self) -> u8 {
        match self {
            SocksCommand::Connect => SOCKS5_CMD_TCP_CONNECT,
            SocksCommand::Bind => SOCKS5_CMD_TCP_BIND,
            SocksCommand::UdpAssociate => SOCKS5_CMD_UDP_ASSOCIATE,
            SocksCommand::Unknown(byte) => byte,
        }
    }
}

impl fmt::Display for SocksCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocksCommand::Connect => write!(f, "CONNECT"),
            SocksCommand::Bind => write!(f, "BIND"),
            SocksCommand::UdpAssociate => write!(f, "UDP ASSOCIATE"),
            SocksCommand::Unknown(byte) => write!(f, "UNKNOWN({:#04x})", byte),
        }
    }
}

/// Address types accepted in a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressType {
    /// Four raw octets
    Ipv4,
    /// Length-prefixed domain name
    DomainName,
}

impl TryFrom<u8> for AddressType {
    type Error = Socks5Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            SOCKS5_ADDR_TYPE_IPV4 => Ok(AddressType::Ipv4),
            SOCKS5_ADDR_TYPE_DOMAIN => Ok(AddressType::DomainName),
            other => Err(Socks5Error::AddressTypeNotSupported(other)),
        }
    }
}

/// Destination host of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// IPv4 literal
    Ipv4(Ipv4Addr),
    /// Domain name, resolved by the connector
    Domain(String),
}

/// Parsed destination: host plus port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressDescriptor {
    /// Destination host
    pub address: Address,
    /// Destination port
    pub port: u16,
}

impl AddressDescriptor {
    /// Create a descriptor for an IPv4 destination
    pub fn ipv4(ip: Ipv4Addr, port: u16) -> Self {
        Self {
            address: Address::Ipv4(ip),
            port,
        }
    }

    /// Create a descriptor for a domain destination
    pub fn domain(domain: impl Into<String>, port: u16) -> Self {
        Self {
            address: Address::Domain(domain.into()),
            port,
        }
    }
}

impl fmt::Display for AddressDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address {
            Address::Ipv4(ip) => write!(f, "{}:{}", ip, self.port),
            Address::Domain(domain) => write!(f, "{}:{}", domain, self.port),
        }
    }
}

/// A parsed SOCKS5 connection request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Requested command
    pub command: SocksCommand,
    /// Requested destination
    pub destination: AddressDescriptor,
}
