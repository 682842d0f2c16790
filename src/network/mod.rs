pub mod interface;

use crate::config::ProbeConfig;
use std::{
    io,
    net::{IpAddr, SocketAddr, UdpSocket as StdUdpSocket},
};
use thiserror::Error;
use tokio::{
    net::UdpSocket as TokioUdpSocket,
    time::{self, Instant},
};

/// Defines all possible errors for socket operations.
#[derive(Error, Debug)]
pub enum SocketError {
    #[error("Failed to create a new socket")]
    CreateSocket(#[source] io::Error),

    #[error("Failed to enable broadcast on socket")]
    SetBroadcast(#[source] io::Error),

    #[error("Failed to set SO_BINDTODEVICE on interface '{interface}'")]
    BindToDevice {
        interface: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to bind socket to address")]
    BindSocket(#[source] io::Error),

    #[error("Failed to set SO_REUSEADDR on socket")]
    SetReuseAddress(#[source] io::Error),

    #[error("Failed to restrict socket to IPv6")]
    SetOnlyV6(#[source] io::Error),

    #[error("Failed to select interface {index} for outgoing multicast")]
    SetMulticastInterface {
        index: u32,
        #[source]
        source: io::Error,
    },

    #[error("Failed to set socket to non-blocking mode")]
    SetNonBlocking(#[source] io::Error),

    #[error("Failed to convert socket to TokioUdpSocket")]
    ConvertToTokio(#[source] io::Error),

    #[allow(dead_code)]
    #[error("Binding to a specific device is not implemented on this platform")]
    NotImplemented,
}

/// A bound send/receive endpoint used for exactly one probe.
///
/// The endpoint is released when it is dropped.
#[allow(async_fn_in_trait)]
pub trait Endpoint {
    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize>;

    /// Sets an absolute deadline for every following `recv_from`.
    fn set_read_deadline(&mut self, deadline: Instant);

    /// Fails with [`io::ErrorKind::TimedOut`] once the read deadline has passed.
    async fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;
}

/// Creates endpoints for a resolved [`ProbeConfig`].
pub trait EndpointFactory {
    type Endpoint: Endpoint;

    fn bind(&self, config: &ProbeConfig) -> Result<Self::Endpoint, SocketError>;
}

/// A tokio UDP socket with a read deadline.
#[derive(Debug)]
pub struct UdpEndpoint {
    socket: TokioUdpSocket,
    deadline: Option<Instant>,
}

impl UdpEndpoint {
    pub fn new(socket: TokioUdpSocket) -> Self {
        Self {
            socket,
            deadline: None,
        }
    }
}

impl Endpoint for UdpEndpoint {
    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(buf, target).await
    }

    fn set_read_deadline(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    async fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        match self.deadline {
            Some(deadline) => time::timeout_at(deadline, self.socket.recv_from(buf))
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "read deadline elapsed"))?,
            None => self.socket.recv_from(buf).await,
        }
    }
}

/// Binds real sockets to the probed interface.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEndpoints;

impl EndpointFactory for SystemEndpoints {
    type Endpoint = UdpEndpoint;

    fn bind(&self, config: &ProbeConfig) -> Result<UdpEndpoint, SocketError> {
        let socket = match config.local_address {
            IpAddr::V4(_) => new_v4_socket_bound_to_device(&config.interface, config.local_port)?,
            IpAddr::V6(_) => new_v6_socket_bound_to_device(
                &config.interface,
                config.interface_index,
                config.local_port,
            )?,
        };
        Ok(UdpEndpoint::new(into_tokio(socket)?))
    }
}

fn into_tokio(socket: socket2::Socket) -> Result<TokioUdpSocket, SocketError> {
    let std_socket: StdUdpSocket = socket.into();
    std_socket
        .set_nonblocking(true)
        .map_err(SocketError::SetNonBlocking)?;
    TokioUdpSocket::from_std(std_socket).map_err(SocketError::ConvertToTokio)
}

/// Sets `SO_BINDTODEVICE`. This is a raw syscall.
#[cfg(target_os = "linux")]
fn bind_to_device(socket: &socket2::Socket, interface: &str) -> Result<(), SocketError> {
    use std::os::fd::AsRawFd;

    // The fd is owned by `socket` and the option value is a byte string of
    // the given length.
    let ret = unsafe {
        libc::setsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_BINDTODEVICE,
            interface.as_ptr() as *const libc::c_void,
            interface.len() as libc::socklen_t,
        )
    };
    if ret < 0 {
        return Err(SocketError::BindToDevice {
            interface: interface.to_string(),
            source: io::Error::last_os_error(),
        });
    }
    Ok(())
}

/// Creates a broadcast-capable IPv4 UDP socket bound to `0.0.0.0:port` on a
/// specific network device.
///
/// Broadcast replies addressed to `255.255.255.255` are only delivered to a
/// wildcard bind, so the device binding is what pins the socket to the
/// interface.
#[cfg(target_os = "linux")]
pub fn new_v4_socket_bound_to_device(
    interface: &str,
    port: u16,
) -> Result<socket2::Socket, SocketError> {
    use socket2::{Domain, Socket, Type};
    use std::net::{Ipv4Addr, SocketAddrV4};

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, None).map_err(SocketError::CreateSocket)?;

    socket
        .set_broadcast(true)
        .map_err(SocketError::SetBroadcast)?;
    socket
        .set_reuse_address(true)
        .map_err(SocketError::SetReuseAddress)?;
    bind_to_device(&socket, interface)?;

    let addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
    socket
        .bind(&SocketAddr::V4(addr).into())
        .map_err(SocketError::BindSocket)?;

    tracing::trace!(interface, %addr, "Bound DHCPv4 socket");
    Ok(socket)
}

/// Creates an IPv6 UDP socket bound to `[::]:port` on a specific network
/// device, sending multicast out of that device.
#[cfg(target_os = "linux")]
pub fn new_v6_socket_bound_to_device(
    interface: &str,
    index: u32,
    port: u16,
) -> Result<socket2::Socket, SocketError> {
    use socket2::{Domain, Socket, Type};
    use std::net::{Ipv6Addr, SocketAddrV6};

    let socket = Socket::new(Domain::IPV6, Type::DGRAM, None).map_err(SocketError::CreateSocket)?;

    socket.set_only_v6(true).map_err(SocketError::SetOnlyV6)?;
    socket
        .set_reuse_address(true)
        .map_err(SocketError::SetReuseAddress)?;
    bind_to_device(&socket, interface)?;
    socket
        .set_multicast_if_v6(index)
        .map_err(|source| SocketError::SetMulticastInterface { index, source })?;

    let addr = SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, port, 0, 0);
    socket
        .bind(&SocketAddr::V6(addr).into())
        .map_err(SocketError::BindSocket)?;

    tracing::trace!(interface, %addr, "Bound DHCPv6 socket");
    Ok(socket)
}

/// Fallback for non-Linux systems where `SO_BINDTODEVICE` is not available.
#[cfg(not(target_os = "linux"))]
pub fn new_v4_socket_bound_to_device(
    _interface: &str,
    _port: u16,
) -> Result<socket2::Socket, SocketError> {
    Err(SocketError::NotImplemented)
}

/// Fallback for non-Linux systems where `SO_BINDTODEVICE` is not available.
#[cfg(not(target_os = "linux"))]
pub fn new_v6_socket_bound_to_device(
    _interface: &str,
    _index: u32,
    _port: u16,
) -> Result<socket2::Socket, SocketError> {
    Err(SocketError::NotImplemented)
}
