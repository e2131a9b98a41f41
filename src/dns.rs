//! Address lookups for the NF Z67-147 summary

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use serde::Serialize;
use std::fmt::Display;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

/// IPv4 and IPv6 addresses of one party
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Addresses {
    /// IPv4 addresses, `None` if the lookup failed
    pub v4: Option<Vec<IpAddr>>,
    /// IPv6 addresses, `None` if the lookup failed
    pub v6: Option<Vec<IpAddr>>,
}

impl Addresses {
    /// Split a resolved address list by family. An empty family is reported as `None`.
    pub fn from_resolved(addrs: impl IntoIterator<Item = IpAddr>) -> Self {
        let (v4, v6): (Vec<_>, Vec<_>) = addrs.into_iter().partition(IpAddr::is_ipv4);
        let non_empty = |mut v: Vec<IpAddr>| {
            v.sort();
            v.dedup();
            (!v.is_empty()).then_some(v)
        };
        Self {
            v4: non_empty(v4),
            v6: non_empty(v6),
        }
    }
}

/// Resolves the audited site and the auditor's public addresses
#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// Addresses of `host`
    async fn website_addresses(&self, host: &str) -> Addresses;

    /// Public addresses of the machine running the audit
    async fn auditor_addresses(&self) -> Addresses;
}

/// Name answering with the querying client's own address
pub const REFLECTOR_NAME: &str = "myip.opendns.com.";

/// Name server that answers [`REFLECTOR_NAME`]
pub const REFLECTOR_SERVER: &str = "resolver1.opendns.com";

/// [`DnsResolver`] using the operating system resolver for the website and
/// a reflector name server for the auditor's public addresses
#[derive(Clone, Debug)]
pub struct SystemResolver {
    reflector_name: String,
    reflector_server: String,
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::with_reflector(REFLECTOR_NAME, REFLECTOR_SERVER)
    }
}

impl SystemResolver {
    /// Resolver asking `server` for `name` to learn the auditor's addresses
    pub fn with_reflector(name: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            reflector_name: name.into(),
            reflector_server: server.into(),
        }
    }

    /// Client bound to the reflector name server only
    async fn reflector(&self) -> Option<TokioAsyncResolver> {
        let servers: Vec<IpAddr> =
            match tokio::net::lookup_host((self.reflector_server.as_str(), 53)).await {
                Ok(addrs) => addrs.map(|a| a.ip()).collect(),
                Err(e) => {
                    debug!(server = %self.reflector_server, error = %e, "reflector lookup failed");
                    return None;
                }
            };
        if servers.is_empty() {
            return None;
        }

        let group = NameServerConfigGroup::from_ips_clear(&servers, 53, true);
        let mut opts = ResolverOpts::default();
        opts.timeout = Duration::from_secs(5);
        opts.attempts = 1;
        Some(TokioAsyncResolver::tokio(
            ResolverConfig::from_parts(None, Vec::new(), group),
            opts,
        ))
    }
}

#[async_trait]
impl DnsResolver for SystemResolver {
    async fn website_addresses(&self, host: &str) -> Addresses {
        match tokio::net::lookup_host((host, 0)).await {
            Ok(addrs) => Addresses::from_resolved(addrs.map(|a| a.ip())),
            Err(e) => {
                debug!(host, error = %e, "address lookup failed");
                Addresses::default()
            }
        }
    }

    async fn auditor_addresses(&self) -> Addresses {
        let Some(resolver) = self.reflector().await else {
            return Addresses::default();
        };
        let name = self.reflector_name.as_str();
        let (v4, v6) = tokio::join!(resolver.ipv4_lookup(name), resolver.ipv6_lookup(name));
        reflected_addresses(
            v4.map(|found| found.iter().map(|a| IpAddr::V4(a.0)).collect()),
            v6.map(|found| found.iter().map(|a| IpAddr::V6(a.0)).collect()),
        )
    }
}

/// Merge the A and AAAA answers; a failed family is reported as `None`
fn reflected_addresses<E: Display>(
    v4: Result<Vec<IpAddr>, E>,
    v6: Result<Vec<IpAddr>, E>,
) -> Addresses {
    let answers = |record: &str, lookup: Result<Vec<IpAddr>, E>| match lookup {
        Ok(addrs) => addrs,
        Err(e) => {
            debug!(record, error = %e, "reflector query failed");
            Vec::new()
        }
    };
    Addresses::from_resolved(answers("A", v4).into_iter().chain(answers("AAAA", v6)))
}
