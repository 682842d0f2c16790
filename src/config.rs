use crate::{error::ProbeError, network::interface::InterfaceInfo};
use clap::Parser;
use std::{
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6},
    time::Duration,
};

/// All-DHCP-relay-agents-and-servers link-scoped multicast group, `ff02::1:2`.
pub const ALL_DHCP_RELAY_AGENTS_AND_SERVERS: Ipv6Addr =
    Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 1, 2);

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// The network interface to probe (e.g., 'eth0', 'br-lan')
    #[arg(short, long)]
    pub interface: String,

    /// How long to wait for an answer, in milliseconds
    #[arg(short, long, default_value_t = 3000)]
    pub timeout: u64,

    /// Only look for DHCPv4 servers
    #[arg(long, conflicts_with = "v6_only")]
    pub v4_only: bool,

    /// Only look for DHCPv6 servers
    #[arg(long)]
    pub v6_only: bool,

    /// Log every received packet
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub discover_timeout: Duration,
    pub v4_client_port: u16,
    pub v4_server_port: u16,
    pub v6_client_port: u16,
    pub v6_server_port: u16,
    pub v4_buffer_size: usize,
    pub v6_buffer_size: usize,
    /// Operating system name checked before the DHCPv4 probe runs.
    pub os: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            discover_timeout: Duration::from_secs(3),
            v4_client_port: 68,
            v4_server_port: 67,
            v6_client_port: 546,
            v6_server_port: 547,
            v4_buffer_size: 1500,
            v6_buffer_size: 4096,
            os: std::env::consts::OS.to_string(),
        }
    }
}

impl DetectorConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.discover_timeout = timeout;
        self
    }

    /// Platforms where the DHCPv4 probe can't run.
    pub fn v4_supported(&self) -> bool {
        self.os != "macos"
    }

    /// Resolves the DHCPv4 source and destination for `iface`.
    pub fn probe_v4(&self, iface: &InterfaceInfo) -> Result<ProbeConfig, ProbeError> {
        let local = iface
            .ipv4
            .first()
            .copied()
            .ok_or_else(|| ProbeError::NoIpv4Address(iface.name.clone()))?;

        Ok(ProbeConfig {
            interface: iface.name.clone(),
            interface_index: iface.index,
            local_address: IpAddr::V4(local),
            local_port: self.v4_client_port,
            remote_address: IpAddr::V4(Ipv4Addr::BROADCAST),
            remote_port: self.v4_server_port,
            timeout: self.discover_timeout,
        })
    }

    /// Resolves the DHCPv6 source and destination for `iface`, preferring a
    /// link-local source address.
    pub fn probe_v6(&self, iface: &InterfaceInfo) -> Result<ProbeConfig, ProbeError> {
        let local = iface
            .ipv6
            .iter()
            .find(|ip| ip.segments()[0] & 0xffc0 == 0xfe80)
            .or_else(|| iface.ipv6.first())
            .copied()
            .ok_or_else(|| ProbeError::NoIpv6Address(iface.name.clone()))?;

        Ok(ProbeConfig {
            interface: iface.name.clone(),
            interface_index: iface.index,
            local_address: IpAddr::V6(local),
            local_port: self.v6_client_port,
            remote_address: IpAddr::V6(ALL_DHCP_RELAY_AGENTS_AND_SERVERS),
            remote_port: self.v6_server_port,
            timeout: self.discover_timeout,
        })
    }
}

/// Addressing for a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub interface: String,
    pub interface_index: u32,
    pub local_address: IpAddr,
    pub local_port: u16,
    pub remote_address: IpAddr,
    pub remote_port: u16,
    pub timeout: Duration,
}

impl ProbeConfig {
    pub fn local(&self) -> SocketAddr {
        SocketAddr::new(self.local_address, self.local_port)
    }

    /// The destination; link-scoped IPv6 targets carry the interface index.
    pub fn remote(&self) -> SocketAddr {
        match self.remote_address {
            IpAddr::V4(ip) => SocketAddr::V4(SocketAddrV4::new(ip, self.remote_port)),
            IpAddr::V6(ip) => SocketAddr::V6(SocketAddrV6::new(
                ip,
                self.remote_port,
                0,
                self.interface_index,
            )),
        }
    }

    /// The local address must be one of the interface's own and of the
    /// same family as the destination.
    pub fn validate(&self, iface: &InterfaceInfo) -> Result<(), ProbeError> {
        let owned = match self.local_address {
            IpAddr::V4(ip) => iface.ipv4.contains(&ip),
            IpAddr::V6(ip) => iface.ipv6.contains(&ip),
        };
        if owned && self.local_address.is_ipv4() == self.remote_address.is_ipv4() {
            Ok(())
        } else {
            Err(ProbeError::AddressMismatch {
                interface: self.interface.clone(),
                local: self.local_address,
                remote: self.remote(),
            })
        }
    }
}
