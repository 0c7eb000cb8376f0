//! SOCKS5 request parser
//!
//! Parses SOCKS5 connection requests from the client.

use crate::error::Socks5Error;
use crate::socks::consts::*;
use crate::socks::types::{AddressDescriptor, AddressType, Request, SocksCommand};
use std::net::Ipv4Addr;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Parse a SOCKS5 request from the stream
///
/// # SOCKS5 Request Format
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// The command byte is not validated here; callers reject anything other
/// than CONNECT. The reserved byte is read and discarded.
///
/// On failure the returned error carries the reply code to send back via
/// [`Socks5Error::reply_code`].
pub async fn parse_request<S>(stream: &mut S) -> Result<Request, Socks5Error>
where
    S: AsyncRead + Unpin,
{
    let version = read_byte(stream, "Failed to read version").await?;
    if version != SOCKS5_VERSION {
        return Err(Socks5Error::UnsupportedVersion(version));
    }

    let command = SocksCommand::from_byte(read_byte(stream, "Failed to read command").await?);
    let _reserved = read_byte(stream, "Failed to read reserved byte").await?;
    let addr_type = AddressType::try_from(read_byte(stream, "Failed to read address type").await?)?;

    let destination = parse_address(stream, addr_type).await?;

    tracing::debug!("Parsed SOCKS5 request: {} to {}", command, destination);

    Ok(Request {
        command,
        destination,
    })
}

/// Parse the address and port portion of a SOCKS5 request
async fn parse_address<S>(
    stream: &mut S,
    addr_type: AddressType,
) -> Result<AddressDescriptor, Socks5Error>
where
    S: AsyncRead + Unpin,
{
    match addr_type {
        AddressType::Ipv4 => {
            let mut addr = [0u8; 4];
            stream
                .read_exact(&mut addr)
                .await
                .map_err(|e| Socks5Error::io("Failed to read IPv4 address", e))?;
            let port = read_port(stream).await?;

            Ok(AddressDescriptor::ipv4(Ipv4Addr::from(addr), port))
        }

        AddressType::DomainName => {
            // length is a single byte, so the buffer never exceeds 255 bytes
            let domain_len = read_byte(stream, "Failed to read domain length").await?;
            let mut domain_buf = vec![0u8; domain_len as usize];
            stream
                .read_exact(&mut domain_buf)
                .await
                .map_err(|e| Socks5Error::io("Failed to read domain", e))?;
            let port = read_port(stream).await?;

            let domain = String::from_utf8(domain_buf).map_err(|e| {
                Socks5Error::InvalidDomain(String::from_utf8_lossy(e.as_bytes()).into_owned())
            })?;

            Ok(AddressDescriptor::domain(domain, port))
        }
    }
}

async fn read_byte<S>(stream: &mut S, context: &'static str) -> Result<u8, Socks5Error>
where
    S: AsyncRead + Unpin,
{
    stream
        .read_u8()
        .await
        .map_err(|e| Socks5Error::io(context, e))
}

async fn read_port<S>(stream: &mut S) -> Result<u16, Socks5Error>
where
    S: AsyncRead + Unpin,
{
    stream
        .read_u16()
        .await
        .map_err(|e| Socks5Error::io("Failed to read port", e))
}
