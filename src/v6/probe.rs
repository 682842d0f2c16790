use super::message::{build_solicit, client_duid, decode, encode, match_response};
use crate::{
    config::ProbeConfig,
    error::ProbeError,
    network::EndpointFactory,
    probe::{Detection, Exchange},
};
use std::time::SystemTime;

/// Multicasts one DHCPv6 Solicit from `config.local()` and waits for an
/// Advertise.
pub async fn probe<F: EndpointFactory>(
    endpoints: &F,
    config: &ProbeConfig,
    mac_addr: &[u8],
    buffer_size: usize,
) -> Result<Detection, ProbeError> {
    let xid: [u8; 3] = rand::random();
    let client_id = client_duid(mac_addr, SystemTime::now());
    let request = build_solicit(xid, client_id.clone(), rand::random());
    let packet = encode(&request)?;

    tracing::debug!("DHCPv6: Listening to udp6 {}", config.local());
    let mut endpoint = endpoints
        .bind(config)
        .map_err(|source| ProbeError::Bind {
            port: config.local_port,
            source,
        })?;

    let exchange = Exchange {
        tag: "DHCPv6",
        request: &packet,
        target: config.remote(),
        timeout: config.timeout,
        buffer_size,
    };
    exchange
        .run(&mut endpoint, |data| {
            let response = decode(data)?;
            tracing::debug!(
                "DHCPv6: received message from server: type={:?} xid={:02x?}",
                response.msg_type,
                response.inner.xid()
            );
            match_response(&response, xid, &client_id)
        })
        .await
}
