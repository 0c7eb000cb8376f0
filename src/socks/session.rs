//! Per-connection session state
//!
//! A [`Session`] owns the client stream, the target stream once one is
//! established, and the protocol state. States only move forward, and a
//! session that reached [`SessionState::Closed`] or
//! [`SessionState::Failed`] cannot move again.

use crate::error::Socks5Error;
use std::fmt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::trace;

/// Protocol state of a session, in the order a successful session visits them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    /// Connection accepted, version byte not read yet
    AwaitVersion,
    /// Version accepted, reading offered methods
    AwaitAuthMethods,
    /// Method negotiation succeeded
    Authenticated,
    /// Waiting for the connection request
    AwaitRequest,
    /// Request parsed
    RequestParsed,
    /// Dialing the target
    Connecting,
    /// Target connection established
    Connected,
    /// Success reply sent, relaying data
    Relaying,
    /// Relay finished
    Closed,
    /// Session aborted
    Failed,
}

impl SessionState {
    /// Whether no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed)
    }

    /// Whether `next` is a legal transition from this state
    pub fn can_advance_to(self, next: SessionState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            SessionState::Failed => true,
            SessionState::Closed => self == SessionState::Relaying,
            _ => next > self,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single client connection and everything it owns
#[derive(Debug)]
pub struct Session<S> {
    pub(crate) client: S,
    pub(crate) target: Option<TcpStream>,
    state: SessionState,
}

impl<S> Session<S> {
    /// Start a session on a freshly accepted stream
    pub fn new(client: S) -> Self {
        Session {
            client,
            target: None,
            state: SessionState::AwaitVersion,
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Move to `next`, rejecting backward or post-terminal transitions
    pub fn advance(&mut self, next: SessionState) -> Result<(), Socks5Error> {
        if !self.state.can_advance_to(next) {
            return Err(Socks5Error::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        trace!("Session {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Mark the session failed unless it already ended
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            trace!("Session {} -> {}", self.state, SessionState::Failed);
            self.state = SessionState::Failed;
        }
    }
}

impl<S: AsyncWrite + Unpin> Session<S> {
    /// Close both connections
    ///
    /// Shutdown errors are ignored: the peer may already be gone.
    pub async fn close(mut self) {
        let _ = self.client.shutdown().await;
        if let Some(mut target) = self.target.take() {
            let _ = target.shutdown().await;
        }
    }
}
