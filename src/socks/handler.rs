//! Main SOCKS5 handler
//!
//! This module provides the per-connection entry point. It drives a
//! [`Session`] through method negotiation, request parsing, the outbound
//! connect and the relay, sending exactly one reply on every path where
//! the protocol defines one.

use super::auth::{negotiate_methods, read_version};
use super::command::{parse_request, send_reply};
use super::connector::TargetConnector;
use super::resolver::SystemResolver;
use super::session::{Session, SessionState};
use super::tcp_relay::{relay_tcp, RelayStats};
use super::types::SocksCommand;
use crate::config::Config;
use crate::error::{ProxyError, ReplyCode, Socks5Error};
use crate::transport::SocketOpts;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

/// Runs SOCKS5 sessions
///
/// Holds only immutable settings, so one handler can be cloned into every
/// connection task.
#[derive(Debug, Clone, Default)]
pub struct SessionHandler {
    connector: TargetConnector,
}

impl SessionHandler {
    /// Create a handler that dials through `connector`
    pub fn new(connector: TargetConnector) -> Self {
        SessionHandler { connector }
    }

    /// Create a handler from the application configuration
    pub fn from_config(config: &Config) -> Self {
        let connector = TargetConnector::new(Arc::new(SystemResolver), &config.socks)
            .with_socket_opts(SocketOpts::from_tcp_config(&config.server.tcp));
        Self::new(connector)
    }

    /// Handle SOCKS5 protocol on a stream
    ///
    /// Outcomes are only observable on the stream and in the logs. Both the
    /// client and the target connection are closed before this returns.
    ///
    /// # Protocol Flow
    ///
    /// 1. Method negotiation
    /// 2. Request parsing
    /// 3. Outbound connect
    /// 4. Success reply and relay
    pub async fn handle<S>(&self, stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut session = Session::new(stream);

        match self.run(&mut session).await {
            Ok(stats) => info!(
                "Session closed: {} bytes sent, {} bytes received",
                stats.client_to_target, stats.target_to_client
            ),
            Err(e) => {
                session.fail();
                warn!("Session failed: {}", e);
            }
        }

        session.close().await;
        debug!("Client connection closed");
    }

    async fn run<S>(&self, session: &mut Session<S>) -> Result<RelayStats, ProxyError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        // Step 1: Method negotiation. Failure replies are sent inside.
        read_version(&mut session.client).await?;
        session.advance(SessionState::AwaitAuthMethods)?;

        let method = negotiate_methods(&mut session.client).await?;
        session.advance(SessionState::Authenticated)?;
        debug!("Authentication completed with method: {:?}", method);

        // Step 2: Request
        session.advance(SessionState::AwaitRequest)?;
        let request = match parse_request(&mut session.client).await {
            Ok(request) => request,
            Err(e) => {
                reply_failure(session, e.reply_code()).await;
                return Err(e.into());
            }
        };
        session.advance(SessionState::RequestParsed)?;

        info!("SOCKS5 {} request to {}", request.command, request.destination);

        if request.command != SocksCommand::Connect {
            reply_failure(session, ReplyCode::CommandNotSupported).await;
            return Err(Socks5Error::CommandNotSupported(request.command.to_byte()).into());
        }

        // Step 3: Outbound connect
        session.advance(SessionState::Connecting)?;
        let mut target = match self.connector.connect(&request.destination).await {
            Ok(target) => target,
            Err(e) => {
                reply_failure(session, e.reply_code()).await;
                return Err(e.into());
            }
        };
        let bound_addr: Option<SocketAddr> = target.local_addr().ok();
        session.advance(SessionState::Connected)?;

        // Step 4: Success reply, then relay
        send_reply(&mut session.client, ReplyCode::Succeeded, bound_addr).await?;
        session.advance(SessionState::Relaying)?;

        info!("SOCKS5 tunnel established to {}", request.destination);

        let stats = relay_tcp(&mut session.client, &mut target).await;
        session.target = Some(target);
        session.advance(SessionState::Closed)?;

        Ok(stats)
    }
}

/// Send a failure reply, best effort
async fn reply_failure<S>(session: &mut Session<S>, code: ReplyCode)
where
    S: AsyncWrite + Unpin,
{
    debug!("Replying {:?}", code);
    if let Err(e) = send_reply(&mut session.client, code, None).await {
        debug!("Failed to send reply: {}", e);
    }
}
