//! Local host discovery.
//!
//! Not a subnet sweep. The machine's own address fixes a /24 prefix (the
//! real interface netmask is not consulted), and only a handful of likely
//! last octets on that prefix are pinged: the usual gateway addresses and a
//! few low DHCP leases.

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr};

use ipnet::Ipv4Net;

use homeguard_core::{DiscoveryResult, Host};

use crate::error::{ProbeError, Result};
use crate::reachability::{PingRunner, ReachabilityProber};

/// Last octets tried on the local /24, in probe order.
pub const DEFAULT_CANDIDATE_SUFFIXES: [u8; 5] = [1, 100, 101, 102, 254];

/// Assumed home-network prefix length.
const HOME_PREFIX_LEN: u8 = 24;

/// Source of this machine's own IPv4 address.
pub trait LocalAddressSource {
    fn local_ipv4(&self) -> impl Future<Output = Result<Ipv4Addr>> + Send;
}

/// Resolves the machine's hostname and takes its first IPv4 address.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostnameResolver;

impl LocalAddressSource for HostnameResolver {
    async fn local_ipv4(&self) -> Result<Ipv4Addr> {
        let name = hostname::get()
            .map_err(|e| ProbeError::LocalAddress(format!("cannot read hostname: {e}")))?
            .to_string_lossy()
            .into_owned();

        let addrs = tokio::net::lookup_host((name.as_str(), 0))
            .await
            .map_err(|e| ProbeError::LocalAddress(format!("cannot resolve {name}: {e}")))?;

        let first_v4 = addrs
            .filter_map(|sa| match sa.ip() {
                IpAddr::V4(v4) => Some(v4),
                IpAddr::V6(_) => None,
            })
            .next();
        first_v4.ok_or_else(|| ProbeError::LocalAddress(format!("{name} has no IPv4 address")))
    }
}

/// The /24 network containing `addr`.
pub fn home_network(addr: Ipv4Addr) -> Result<Ipv4Net> {
    Ipv4Net::new(addr, HOME_PREFIX_LEN)
        .map(|net| net.trunc())
        .map_err(|e| ProbeError::LocalAddress(e.to_string()))
}

/// Candidate hosts on `network`, one per suffix, in suffix order.
pub fn candidates(network: Ipv4Net, suffixes: &[u8]) -> Vec<Host> {
    let base = u32::from(network.network());
    suffixes
        .iter()
        .map(|suffix| Host::new(Ipv4Addr::from(base | u32::from(*suffix))))
        .collect()
}

/// Heuristic enumeration of likely-active hosts on the local network.
pub struct NetworkDiscovery<A, P> {
    address: A,
    prober: ReachabilityProber<P>,
    suffixes: Vec<u8>,
}

impl<A, P> NetworkDiscovery<A, P>
where
    A: LocalAddressSource + Sync,
    P: PingRunner + Sync,
{
    pub fn new(address: A, prober: ReachabilityProber<P>, suffixes: Vec<u8>) -> Self {
        Self {
            address,
            prober,
            suffixes,
        }
    }

    /// Loopback first, then the own address, then every candidate that
    /// answered a ping, in suffix order. No address appears twice.
    ///
    /// Fails only when the own address cannot be resolved.
    pub async fn discover_local_hosts(&self) -> Result<DiscoveryResult> {
        let own_addr = self.address.local_ipv4().await?;
        let own = Host::new(own_addr);
        let network = home_network(own_addr)?;

        tracing::info!(own = %own, network = %network, "Discovering local hosts");

        let mut result = DiscoveryResult::new();
        result.push_unique(Host::LOOPBACK);
        result.push_unique(own);

        for candidate in candidates(network, &self.suffixes) {
            if result.contains(&candidate) {
                continue;
            }
            if self.prober.is_reachable(candidate).await {
                tracing::info!(host = %candidate, "Host reachable");
                result.push_unique(candidate);
            } else {
                tracing::debug!(host = %candidate, "Host not reachable");
            }
        }

        tracing::info!(hosts = result.len(), "Discovery complete");
        Ok(result)
    }
}
