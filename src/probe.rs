//! The receive loop shared by the DHCPv4 and DHCPv6 probes.

use crate::{
    error::{ProbeError, Rejection},
    network::Endpoint,
    timeout::is_timeout,
};
use std::{net::SocketAddr, time::Duration};
use tokio::time::Instant;

/// Outcome of a probe that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// A server answered our request.
    Detected,
    /// The timeout elapsed without a matching answer.
    NotDetected,
}

impl Detection {
    pub fn is_detected(self) -> bool {
        self == Detection::Detected
    }
}

impl From<Detection> for bool {
    fn from(detection: Detection) -> Self {
        detection.is_detected()
    }
}

/// One request/response exchange on a bound endpoint.
pub(crate) struct Exchange<'a> {
    pub tag: &'static str,
    pub request: &'a [u8],
    pub target: SocketAddr,
    pub timeout: Duration,
    pub buffer_size: usize,
}

impl Exchange<'_> {
    /// Sends the request once, then reads until `accept` takes a packet or
    /// the deadline passes.
    ///
    /// The deadline is set once before the first read, so unrelated traffic
    /// can't stretch the wait beyond `timeout`.
    pub async fn run<E, F>(&self, endpoint: &mut E, mut accept: F) -> Result<Detection, ProbeError>
    where
        E: Endpoint,
        F: FnMut(&[u8]) -> Result<(), Rejection>,
    {
        let sent = endpoint
            .send_to(self.request, self.target)
            .await
            .map_err(|source| ProbeError::Send {
                target: self.target,
                source,
            })?;
        tracing::trace!(tag = self.tag, sent, target = %self.target, "Sent request");

        let mut buf = vec![0u8; self.buffer_size];
        endpoint.set_read_deadline(Instant::now() + self.timeout);
        tracing::debug!(tag = self.tag, "Waiting {:?} for an answer", self.timeout);

        loop {
            let (len, from) = match endpoint.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) if is_timeout(&e) => {
                    tracing::debug!(tag = self.tag, "Didn't receive DHCP response");
                    return Ok(Detection::NotDetected);
                }
                Err(e) => return Err(ProbeError::Receive(e)),
            };
            tracing::trace!(tag = self.tag, len, %from, "Received packet");

            match accept(&buf[..len]) {
                Ok(()) => {
                    tracing::info!(tag = self.tag, %from, "The packet is from an active DHCP server");
                    return Ok(Detection::Detected);
                }
                Err(rejection) => {
                    tracing::debug!(tag = self.tag, %from, "Ignoring packet: {}", rejection);
                }
            }
        }
    }
}
