//! Domain name resolution
//!
//! The connector only needs "name to IPv4 addresses before a deadline",
//! expressed by the [`Resolve`] trait.

use crate::error::ConnectError;
use async_trait::async_trait;
use std::fmt::Debug;
use std::net::{IpAddr, Ipv4Addr};
use tokio::time::Instant;

/// Resolves domain names to IPv4 addresses
#[async_trait]
pub trait Resolve: Debug + Send + Sync {
    /// Resolve `domain`, giving up at `deadline`
    ///
    /// Addresses are returned in resolver order. An empty list is a valid
    /// answer; callers decide what to do with it.
    async fn resolve(&self, domain: &str, deadline: Instant) -> Result<Vec<Ipv4Addr>, ConnectError>;
}

/// Resolver backed by the operating system's lookup facilities
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolve for SystemResolver {
    async fn resolve(&self, domain: &str, deadline: Instant) -> Result<Vec<Ipv4Addr>, ConnectError> {
        let lookup = tokio::net::lookup_host((domain, 0));

        let addrs = match tokio::time::timeout_at(deadline, lookup).await {
            Ok(Ok(addrs)) => addrs,
            Ok(Err(source)) => {
                return Err(ConnectError::Resolve {
                    domain: domain.to_string(),
                    source,
                })
            }
            Err(_) => return Err(ConnectError::ResolveTimeout(domain.to_string())),
        };

        let ips: Vec<Ipv4Addr> = addrs
            .filter_map(|addr| match addr.ip() {
                IpAddr::V4(ip) => Some(ip),
                IpAddr::V6(_) => None,
            })
            .collect();

        tracing::debug!("Resolved {} to {:?}", domain, ips);

        Ok(ips)
    }
}
