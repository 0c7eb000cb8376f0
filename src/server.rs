//! Listener and accept loop
//!
//! Accepts client connections and runs one [`SessionHandler`] task per
//! connection until a shutdown signal arrives. Sessions already running
//! when the signal arrives finish on their own.

use crate::config::Config;
use crate::error::ProxyError;
use crate::socks::SessionHandler;
use crate::transport::SocketOpts;
use anyhow::{Context, Result};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, info_span, Instrument};

/// Pause after a failed accept, e.g. when the process is out of file descriptors
pub const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Bound SOCKS5 server
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    handler: SessionHandler,
    socket_opts: SocketOpts,
}

impl Server {
    /// Bind the listening socket described by `config`
    pub async fn bind(config: &Config) -> Result<Self> {
        let addr = config.server.listen_addr().map_err(ProxyError::Config)?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to listen on {}", addr))?;

        Ok(Server {
            listener,
            handler: SessionHandler::from_config(config),
            socket_opts: SocketOpts::from_tcp_config(&config.server.tcp),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to read listener address")
    }

    /// Accept connections until `shutdown_rx` fires
    pub async fn serve(self, mut shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
        info!("SOCKS5 server listening on {}", self.local_addr()?);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            accept_backoff(&e).await;
                            continue;
                        }
                    };
                    debug!("Accepted connection from {}", peer);
                    self.socket_opts.hint(&stream);

                    let handler = self.handler.clone();
                    tokio::spawn(
                        async move { handler.handle(stream).await }
                            .instrument(info_span!("session", peer = %peer)),
                    );
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping server");
                    break;
                }
            }
        }

        info!("Server stopped");
        Ok(())
    }
}

async fn accept_backoff(e: &io::Error) {
    error!("Failed to accept connection: {}", e);
    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
}

/// Bind and serve in one step
pub async fn run_server(config: Config, shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
    Server::bind(&config).await?.serve(shutdown_rx).await
}
