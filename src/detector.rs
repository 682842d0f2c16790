//! Detection of other DHCP servers on an interface
//!
//! This module ties the pieces together:
//! - Interface lookup and address resolution
//! - The runtime platform check
//! - Dispatching to the DHCPv4 and DHCPv6 probes

use crate::{
    config::DetectorConfig,
    error::ProbeError,
    network::{
        interface::{InterfaceLookup, SystemInterfaces},
        EndpointFactory, SystemEndpoints,
    },
    probe::Detection,
    v4, v6,
};

/// Looks for DHCP servers answering on a named interface.
///
/// Every check resolves the interface afresh, so a `Detector` holds no state
/// between calls and may run its v4 and v6 checks concurrently.
#[derive(Debug, Clone)]
pub struct Detector<L = SystemInterfaces, F = SystemEndpoints> {
    interfaces: L,
    endpoints: F,
    config: DetectorConfig,
}

impl Detector {
    pub fn new(config: DetectorConfig) -> Self {
        Self::with_collaborators(SystemInterfaces, SystemEndpoints, config)
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl<L: InterfaceLookup, F: EndpointFactory> Detector<L, F> {
    pub fn with_collaborators(interfaces: L, endpoints: F, config: DetectorConfig) -> Self {
        Self {
            interfaces,
            endpoints,
            config,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Sends a DHCPv4 Discover out of `interface` and waits up to the
    /// discover timeout for a server to answer.
    pub async fn check_v4(&self, interface: &str) -> Result<Detection, ProbeError> {
        let iface = self.interfaces.lookup(interface)?;
        let probe = self.config.probe_v4(&iface)?;

        if !self.config.v4_supported() {
            return Err(ProbeError::UnsupportedPlatform {
                os: self.config.os.clone(),
            });
        }
        if iface.hardware_address.is_empty() {
            return Err(ProbeError::NoHardwareAddress(iface.name));
        }
        probe.validate(&iface)?;

        let detection = v4::probe(
            &self.endpoints,
            &probe,
            &iface.hardware_address,
            self.config.v4_buffer_size,
        )
        .await?;
        tracing::info!(interface, ?detection, "DHCPv4 check finished");
        Ok(detection)
    }

    /// Multicasts a DHCPv6 Solicit out of `interface` and waits up to the
    /// discover timeout for an Advertise.
    pub async fn check_v6(&self, interface: &str) -> Result<Detection, ProbeError> {
        let iface = self.interfaces.lookup(interface)?;
        let probe = self.config.probe_v6(&iface)?;
        probe.validate(&iface)?;

        let detection = v6::probe(
            &self.endpoints,
            &probe,
            &iface.hardware_address,
            self.config.v6_buffer_size,
        )
        .await?;
        tracing::info!(interface, ?detection, "DHCPv6 check finished");
        Ok(detection)
    }
}

/// Returns whether another DHCPv4 server answers on `interface`.
pub async fn check_v4(interface: &str) -> Result<bool, ProbeError> {
    Detector::new(DetectorConfig::default()).check_v4(interface).await.map(bool::from)
}

/// Returns whether another DHCPv6 server answers on `interface`.
pub async fn check_v6(interface: &str) -> Result<bool, ProbeError> {
    Detector::new(DetectorConfig::default()).check_v6(interface).await.map(bool::from)
}
