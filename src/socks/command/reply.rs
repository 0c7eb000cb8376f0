//! SOCKS5 reply builder
//!
//! Constructs SOCKS5 reply messages. Every reply is exactly ten bytes and
//! always carries an IPv4 bound address, regardless of the request's
//! address type.

use crate::error::{ReplyCode, Socks5Error};
use crate::socks::consts::*;
use std::net::SocketAddr;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Encode a SOCKS5 reply
///
/// # SOCKS5 Reply Format
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' | X'01'|    4     |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// `bound_addr` is the local address of the outbound connection. It is
/// encoded only when it is IPv4; otherwise BND.ADDR and BND.PORT are zero.
pub fn encode_reply(code: ReplyCode, bound_addr: Option<SocketAddr>) -> [u8; SOCKS5_REPLY_LEN] {
    let mut reply = [0u8; SOCKS5_REPLY_LEN];
    reply[0] = SOCKS5_VERSION;
    reply[1] = code.into();
    reply[2] = SOCKS5_RESERVED;
    reply[3] = SOCKS5_ADDR_TYPE_IPV4;

    if let Some(SocketAddr::V4(addr)) = bound_addr {
        reply[4..8].copy_from_slice(&addr.ip().octets());
        reply[8..10].copy_from_slice(&addr.port().to_be_bytes());
    }

    reply
}

/// Encode and send a SOCKS5 reply
pub async fn send_reply<S>(
    stream: &mut S,
    code: ReplyCode,
    bound_addr: Option<SocketAddr>,
) -> Result<(), Socks5Error>
where
    S: AsyncWrite + Unpin,
{
    let reply = encode_reply(code, bound_addr);

    stream
        .write_all(&reply)
        .await
        .map_err(|e| Socks5Error::io("Failed to send reply", e))?;
    stream
        .flush()
        .await
        .map_err(|e| Socks5Error::io("Failed to send reply", e))
}
