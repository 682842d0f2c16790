use super::message::{build_dhcp_discover, decode, encode, match_response};
use crate::{
    config::ProbeConfig,
    error::ProbeError,
    network::EndpointFactory,
    probe::{Detection, Exchange},
};
use std::ffi::CStr;

/// Broadcasts one DHCP Discover from `config.local()` and waits for an answer.
pub async fn probe<F: EndpointFactory>(
    endpoints: &F,
    config: &ProbeConfig,
    mac_addr: &[u8],
    buffer_size: usize,
) -> Result<Detection, ProbeError> {
    let xid: u32 = rand::random();
    let hostname = local_hostname();
    let request = build_dhcp_discover(mac_addr, xid, hostname.as_deref());
    let packet = encode(&request)?;

    tracing::trace!("Listening to udp4 {}", config.local());
    let mut endpoint = endpoints
        .bind(config)
        .map_err(|source| ProbeError::Bind {
            port: config.local_port,
            source,
        })?;

    let exchange = Exchange {
        tag: "DHCPv4",
        request: &packet,
        target: config.remote(),
        timeout: config.timeout,
        buffer_size,
    };
    exchange
        .run(&mut endpoint, |data| {
            let response = decode(data)?;
            tracing::debug!(
                "DHCPv4: received message from server: opcode={:?} xid={:#010x} yiaddr={}",
                response.opcode(),
                response.xid(),
                response.yiaddr()
            );
            match_response(&response, mac_addr, xid)
        })
        .await
}

/// The host name, if the system reports one.
fn local_hostname() -> Option<String> {
    let mut buf = [0u8; 256];
    // SAFETY: the buffer is valid for `buf.len()` bytes and the last byte is
    // never written, so the result stays NUL-terminated.
    let ret = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len() - 1) };
    if ret != 0 {
        return None;
    }
    CStr::from_bytes_until_nul(&buf)
        .ok()
        .and_then(|name| name.to_str().ok())
        .map(str::to_string)
}
