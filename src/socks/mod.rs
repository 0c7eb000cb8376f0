//! SOCKS5 module for tcp-proxy
//!
//! This module implements the server side of the SOCKS5 protocol, limited
//! to the CONNECT command, the "no authentication" method and the IPv4 and
//! domain name address types.

mod auth;
mod command;
mod connector;
mod consts;
mod handler;
mod resolver;
mod session;
mod tcp_relay;
mod types;

pub use auth::{negotiate_methods, read_version, AuthMethod};
pub use command::{encode_reply, parse_request, send_reply};
pub use connector::TargetConnector;
pub use consts::*;
pub use handler::SessionHandler;
pub use resolver::{Resolve, SystemResolver};
pub use session::{Session, SessionState};
pub use tcp_relay::{relay_tcp, RelayStats};
pub use types::{Address, AddressDescriptor, AddressType, Request, SocksCommand};
