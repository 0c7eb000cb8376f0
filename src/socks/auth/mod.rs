//! SOCKS5 authentication module
//!
//! Handles the method negotiation subphase. Only the "no authentication"
//! method is ever selected.

use super::consts::*;
use crate::error::Socks5Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Authentication method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// No authentication required
    None,
}

impl AuthMethod {
    /// Convert to SOCKS5 method byte
    pub fn to_byte(self) -> u8 {
        match self {
            AuthMethod::None => SOCKS5_AUTH_METHOD_NONE,
        }
    }

    /// Parse from SOCKS5 method byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            SOCKS5_AUTH_METHOD_NONE => Some(AuthMethod::None),
            _ => None,
        }
    }
}

/// Read and check the leading version byte of the handshake
///
/// A wrong version byte is rejected without a reply.
pub async fn read_version<S>(stream: &mut S) -> Result<(), Socks5Error>
where
    S: AsyncRead + Unpin,
{
    let version = stream
        .read_u8()
        .await
        .map_err(|e| Socks5Error::io("Failed to read version", e))?;
    if version != SOCKS5_VERSION {
        return Err(Socks5Error::UnsupportedVersion(version));
    }
    Ok(())
}

/// Read the offered methods and answer with the selected one
///
/// Reads `NMETHODS METHODS...` and answers `VER METHOD`. Every failure is
/// answered with `0xFF` before returning the error.
///
/// # Returns
///
/// The selected authentication method if successful
pub async fn negotiate_methods<S>(stream: &mut S) -> Result<AuthMethod, Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let num_methods = stream
        .read_u8()
        .await
        .map_err(|e| Socks5Error::io("Failed to read number of methods", e))?;
    if num_methods == 0 {
        send_method(stream, None).await?;
        return Err(Socks5Error::NoMethods);
    }

    let mut methods = vec![0u8; num_methods as usize];
    stream
        .read_exact(&mut methods)
        .await
        .map_err(|e| Socks5Error::io("Failed to read auth methods", e))?;

    let selected = select_auth_method(&methods);
    send_method(stream, selected).await?;

    selected.ok_or(Socks5Error::NoAcceptableMethod)
}

async fn send_method<S>(stream: &mut S, method: Option<AuthMethod>) -> Result<(), Socks5Error>
where
    S: AsyncWrite + Unpin,
{
    let method = method
        .map(AuthMethod::to_byte)
        .unwrap_or(SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE);

    stream
        .write_all(&[SOCKS5_VERSION, method])
        .await
        .map_err(|e| Socks5Error::io("Failed to send auth response", e))?;
    stream
        .flush()
        .await
        .map_err(|e| Socks5Error::io("Failed to send auth response", e))
}

fn select_auth_method(methods: &[u8]) -> Option<AuthMethod> {
    methods.iter().copied().find_map(AuthMethod::from_byte)
}
