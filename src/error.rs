use crate::network::SocketError;
use dhcproto::error::{DecodeError, EncodeError};
use std::{fmt, io, net::IpAddr, net::SocketAddr};
use thiserror::Error;

/// Errors surfaced to the caller of a probe.
///
/// A read timeout is never one of these: it is reported as
/// [`Detection::NotDetected`](crate::Detection::NotDetected).
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Failed to enumerate network interfaces")]
    InterfaceLookup(#[source] io::Error),

    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    #[error("Couldn't find an IPv4 address on interface '{0}'")]
    NoIpv4Address(String),

    #[error("Couldn't find an IPv6 address on interface '{0}'")]
    NoIpv6Address(String),

    #[error("Interface '{0}' has no hardware address")]
    NoHardwareAddress(String),

    #[error("Can't look for a DHCPv4 server: not supported on {os}")]
    UnsupportedPlatform { os: String },

    #[error("Local address {local} doesn't belong to interface '{interface}' or doesn't match {remote}")]
    AddressMismatch {
        interface: String,
        local: IpAddr,
        remote: SocketAddr,
    },

    #[error("Failed to encode the request")]
    Encode(#[from] EncodeError),

    #[error("Couldn't listen on port {port}")]
    Bind {
        port: u16,
        #[source]
        source: SocketError,
    },

    #[error("Couldn't send a packet to {target}")]
    Send {
        target: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Couldn't receive packet")]
    Receive(#[source] io::Error),
}

/// Coarse classification of a [`ProbeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The probe never reached the network.
    Configuration,
    /// Bind, send or receive failed.
    Transport,
}

/// The phase of a probe in which an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    InterfaceLookup,
    AddressResolution,
    Encode,
    Bind,
    Send,
    Receive,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::InterfaceLookup => "interface lookup",
            Phase::AddressResolution => "address resolution",
            Phase::Encode => "encode",
            Phase::Bind => "bind",
            Phase::Send => "send",
            Phase::Receive => "receive",
        };
        f.write_str(name)
    }
}

impl Phase {
    /// Only interface, address family and platform problems are
    /// configuration errors; a request that can't be put on the wire is a
    /// transport failure.
    pub fn kind(self) -> ErrorKind {
        match self {
            Phase::InterfaceLookup | Phase::AddressResolution => ErrorKind::Configuration,
            Phase::Encode | Phase::Bind | Phase::Send | Phase::Receive => ErrorKind::Transport,
        }
    }
}

impl ProbeError {
    pub fn kind(&self) -> ErrorKind {
        self.phase().kind()
    }

    pub fn phase(&self) -> Phase {
        match self {
            ProbeError::InterfaceLookup(_)
            | ProbeError::InterfaceNotFound(_)
            | ProbeError::NoHardwareAddress(_)
            | ProbeError::UnsupportedPlatform { .. } => Phase::InterfaceLookup,
            ProbeError::NoIpv4Address(_)
            | ProbeError::NoIpv6Address(_)
            | ProbeError::AddressMismatch { .. } => Phase::AddressResolution,
            ProbeError::Encode(_) => Phase::Encode,
            ProbeError::Bind { .. } => Phase::Bind,
            ProbeError::Send { .. } => Phase::Send,
            ProbeError::Receive(_) => Phase::Receive,
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

/// Why an inbound packet was ignored by the receive loop.
#[derive(Error, Debug)]
pub enum Rejection {
    #[error("malformed packet: {0}")]
    Decode(#[from] DecodeError),

    #[error("couldn't extract the inner message: {0}")]
    Relay(&'static str),

    #[error("doesn't match our request: {0}")]
    Mismatch(&'static str),
}
