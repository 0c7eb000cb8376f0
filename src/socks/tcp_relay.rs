//! TCP relay for SOCKS5 CONNECT command
//!
//! Copies bytes between the client and the target until both directions
//! have finished. Each direction half-closes its destination when its
//! source ends, so a peer that shuts down its write side still receives
//! everything the other side sends afterwards.

use std::fmt;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Byte counts for a finished relay
///
/// A direction that ended in an error reports zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Bytes written to the target
    pub client_to_target: u64,
    /// Bytes written to the client
    pub target_to_client: u64,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    ClientToTarget,
    TargetToClient,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ClientToTarget => write!(f, "client -> target"),
            Direction::TargetToClient => write!(f, "target -> client"),
        }
    }
}

/// Relay data bidirectionally between client and target
///
/// Both directions run concurrently and independently: an error in one
/// direction is logged and half-closes that direction's destination, but
/// never stops the other. Returns only once both directions are done.
/// Closing the streams afterwards is left to the caller.
pub async fn relay_tcp<A, B>(client: &mut A, target: &mut B) -> RelayStats
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    let (client_read, client_write) = tokio::io::split(client);
    let (target_read, target_write) = tokio::io::split(target);

    let (client_to_target, target_to_client) = tokio::join!(
        copy_half(client_read, target_write, Direction::ClientToTarget),
        copy_half(target_read, client_write, Direction::TargetToClient),
    );

    RelayStats {
        client_to_target,
        target_to_client,
    }
}

/// Copy until EOF or error, then shut down the destination's write side
async fn copy_half<R, W>(mut reader: R, mut writer: W, direction: Direction) -> u64
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let copied = match tokio::io::copy(&mut reader, &mut writer).await {
        Ok(bytes) => {
            debug!("{} finished: {} bytes", direction, bytes);
            bytes
        }
        Err(e) if is_ignorable_error(&e) => {
            debug!("{} closed: {}", direction, e);
            0
        }
        Err(e) => {
            warn!("{} error: {}", direction, e);
            0
        }
    };

    if let Err(e) = writer.shutdown().await {
        if e.kind() != io::ErrorKind::NotConnected {
            debug!("{} half-close failed: {}", direction, e);
        }
    }

    copied
}

/// Errors that are a normal way for a peer to go away
fn is_ignorable_error(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}
