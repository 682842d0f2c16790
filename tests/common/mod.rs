#![allow(dead_code)]

use bytes::Bytes;
use dhcp_sentry::{
    config::ProbeConfig,
    network::{
        interface::{InterfaceInfo, InterfaceLookup},
        Endpoint, EndpointFactory, SocketError,
    },
    DetectorConfig, ProbeError,
};
use std::{
    collections::VecDeque,
    io,
    net::{Ipv4Addr, SocketAddr},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tokio::time::{self, Instant};

pub const MAC: [u8; 6] = [0x00, 0x0c, 0x29, 0xa8, 0x92, 0xf4];
pub const TIMEOUT: Duration = Duration::from_millis(200);

pub fn eth0() -> InterfaceInfo {
    InterfaceInfo {
        name: "eth0".to_string(),
        index: 2,
        hardware_address: Bytes::from_static(&MAC),
        ipv4: vec![Ipv4Addr::new(192, 168, 1, 10)],
        ipv6: vec!["fe80::20c:29ff:fea8:92f4".parse().unwrap()],
    }
}

pub fn config() -> DetectorConfig {
    DetectorConfig {
        os: "linux".to_string(),
        ..DetectorConfig::default()
    }
    .with_timeout(TIMEOUT)
}

pub fn server_address() -> SocketAddr {
    SocketAddr::new(Ipv4Addr::new(192, 168, 1, 1).into(), 67)
}

/// A fixed set of interfaces.
pub struct MockInterfaces(pub Vec<InterfaceInfo>);

impl InterfaceLookup for MockInterfaces {
    fn lookup(&self, name: &str) -> Result<InterfaceInfo, ProbeError> {
        self.0
            .iter()
            .find(|iface| iface.name == name)
            .cloned()
            .ok_or_else(|| ProbeError::InterfaceNotFound(name.to_string()))
    }
}

/// What the network does after a request was sent.
pub enum Reply {
    /// A packet delivered `after` the request.
    Packet { after: Duration, data: Vec<u8> },
    /// A read error other than a timeout.
    Error(io::ErrorKind),
}

impl Reply {
    pub fn packet(after: Duration, data: Vec<u8>) -> Self {
        Reply::Packet { after, data }
    }
}

pub type Responder = Arc<dyn Fn(&[u8]) -> Vec<Reply> + Send + Sync>;

/// Hands out scripted endpoints and counts what happens to them.
pub struct MockEndpoints {
    responder: Responder,
    pub fail_bind: bool,
    pub fail_send: bool,
    pub binds: Arc<Mutex<Vec<ProbeConfig>>>,
    pub sent: Arc<Mutex<Vec<(Vec<u8>, SocketAddr)>>>,
    pub closed: Arc<AtomicUsize>,
}

impl MockEndpoints {
    pub fn new(responder: impl Fn(&[u8]) -> Vec<Reply> + Send + Sync + 'static) -> Self {
        Self {
            responder: Arc::new(responder),
            fail_bind: false,
            fail_send: false,
            binds: Arc::default(),
            sent: Arc::default(),
            closed: Arc::default(),
        }
    }

    /// Nobody answers.
    pub fn silent() -> Self {
        Self::new(|_| Vec::new())
    }
}

impl EndpointFactory for MockEndpoints {
    type Endpoint = MockEndpoint;

    fn bind(&self, config: &ProbeConfig) -> Result<MockEndpoint, SocketError> {
        if self.fail_bind {
            return Err(SocketError::BindSocket(io::Error::from(
                io::ErrorKind::AddrInUse,
            )));
        }
        self.binds.lock().unwrap().push(config.clone());
        Ok(MockEndpoint {
            responder: self.responder.clone(),
            fail_send: self.fail_send,
            sent: self.sent.clone(),
            closed: self.closed.clone(),
            pending: Mutex::new(VecDeque::new()),
            deadline: None,
        })
    }
}

pub struct MockEndpoint {
    responder: Responder,
    fail_send: bool,
    sent: Arc<Mutex<Vec<(Vec<u8>, SocketAddr)>>>,
    closed: Arc<AtomicUsize>,
    pending: Mutex<VecDeque<(Instant, Reply)>>,
    deadline: Option<Instant>,
}

impl Endpoint for MockEndpoint {
    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        if self.fail_send {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        self.sent.lock().unwrap().push((buf.to_vec(), target));

        let now = Instant::now();
        let mut pending = self.pending.lock().unwrap();
        for reply in (self.responder)(buf) {
            let at = match &reply {
                Reply::Packet { after, .. } => now + *after,
                Reply::Error(_) => now,
            };
            pending.push_back((at, reply));
        }
        Ok(buf.len())
    }

    fn set_read_deadline(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    async fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let deadline = self
            .deadline
            .expect("probes always set a read deadline before reading");
        let next = self.pending.lock().unwrap().pop_front();

        match next {
            Some((at, reply)) if at <= deadline => {
                time::sleep_until(at).await;
                match reply {
                    Reply::Packet { data, .. } => {
                        let len = data.len().min(buf.len());
                        buf[..len].copy_from_slice(&data[..len]);
                        Ok((len, server_address()))
                    }
                    Reply::Error(kind) => Err(io::Error::from(kind)),
                }
            }
            _ => {
                time::sleep_until(deadline).await;
                Err(io::Error::new(io::ErrorKind::TimedOut, "read deadline elapsed"))
            }
        }
    }
}

impl Drop for MockEndpoint {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}
