use crate::error::Rejection;
use bytes::{Buf as _, BufMut as _, BytesMut};
use dhcproto::{error::EncodeError, v6, Decodable as _, Decoder, Encodable as _, Encoder};
use std::time::{SystemTime, UNIX_EPOCH};

/// Maximum relay nesting (RFC 8415, HOP_COUNT_LIMIT).
pub const RELAY_HOP_LIMIT: usize = 32;

const MSG_RELAY_FORW: u8 = 12;
const MSG_RELAY_REPL: u8 = 13;
/// msg-type, hop-count, link-address, peer-address.
const RELAY_HEADER_LEN: usize = 34;
const OPTION_RELAY_MSG: u16 = 9;

const DUID_LLT: u16 = 1;
const DUID_UUID: u16 = 4;
const HW_TYPE_ETHERNET: u16 = 1;
/// 2000-01-01T00:00:00Z in Unix seconds.
const DUID_TIME_EPOCH: u64 = 946_684_800;

/// Generates a client DUID.
///
/// DUID-LLT from the hardware address and `now`, or a random DUID-UUID when
/// the interface has no hardware address.
pub fn client_duid(mac_addr: &[u8], now: SystemTime) -> Vec<u8> {
    let mut duid = BytesMut::with_capacity(18);
    if mac_addr.is_empty() {
        duid.put_u16(DUID_UUID);
        duid.put_slice(&rand::random::<[u8; 16]>());
    } else {
        let secs = now
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
            .saturating_sub(DUID_TIME_EPOCH);
        duid.put_u16(DUID_LLT);
        duid.put_u16(HW_TYPE_ETHERNET);
        // The DUID time field saturates rather than wrapping past 2136.
        duid.put_u32(u32::try_from(secs).unwrap_or(u32::MAX));
        duid.put_slice(mac_addr);
    }
    duid.to_vec()
}

/// Constructs a DHCPv6 Solicit message.
pub fn build_solicit(xid: [u8; 3], client_id: Vec<u8>, iaid: u32) -> v6::Message {
    let mut msg = v6::Message::new_with_id(v6::MessageType::Solicit, xid);
    msg.opts_mut().insert(v6::DhcpOption::ClientId(client_id));
    msg.opts_mut().insert(v6::DhcpOption::ElapsedTime(0));
    msg.opts_mut().insert(v6::DhcpOption::IANA(v6::IANA {
        id: iaid,
        t1: 0,
        t2: 0,
        opts: v6::DhcpOptions::new(),
    }));
    msg
}

pub fn encode(msg: &v6::Message) -> Result<Vec<u8>, EncodeError> {
    let mut buffer = Vec::new();
    let mut encoder = Encoder::new(&mut buffer);
    msg.encode(&mut encoder)?;
    Ok(buffer)
}

/// A decoded inbound packet.
#[derive(Debug)]
pub struct Response {
    /// Type of the outermost message, `RelayRepl` for relayed packets.
    pub msg_type: v6::MessageType,
    /// The client message, with any relay envelopes removed.
    pub inner: v6::Message,
}

pub fn decode(data: &[u8]) -> Result<Response, Rejection> {
    match data.first() {
        Some(&kind @ (MSG_RELAY_FORW | MSG_RELAY_REPL)) => {
            let inner = inner_message(data)?;
            Ok(Response {
                msg_type: v6::MessageType::from(kind),
                inner: v6::Message::decode(&mut Decoder::new(inner))?,
            })
        }
        _ => {
            let inner = v6::Message::decode(&mut Decoder::new(data))?;
            Ok(Response {
                msg_type: inner.msg_type(),
                inner,
            })
        }
    }
}

/// Follows Relay Message options down to the first non-relay message.
fn inner_message(mut data: &[u8]) -> Result<&[u8], Rejection> {
    for _ in 0..=RELAY_HOP_LIMIT {
        match data.first() {
            Some(&(MSG_RELAY_FORW | MSG_RELAY_REPL)) => data = relay_message_option(data)?,
            Some(_) => return Ok(data),
            None => return Err(Rejection::Relay("empty relay message")),
        }
    }
    Err(Rejection::Relay("too many nested relay messages"))
}

fn relay_message_option(relay: &[u8]) -> Result<&[u8], Rejection> {
    let mut opts = relay
        .get(RELAY_HEADER_LEN..)
        .ok_or(Rejection::Relay("truncated relay header"))?;

    while opts.remaining() >= 4 {
        let code = opts.get_u16();
        let len = opts.get_u16() as usize;
        if opts.remaining() < len {
            return Err(Rejection::Relay("truncated relay option"));
        }
        if code == OPTION_RELAY_MSG {
            return Ok(&opts[..len]);
        }
        opts.advance(len);
    }
    Err(Rejection::Relay("no relay message option"))
}

/// Checks that `response` is a server's Advertise for the Solicit identified
/// by `xid` and `client_id`.
pub fn match_response(response: &Response, xid: [u8; 3], client_id: &[u8]) -> Result<(), Rejection> {
    if !matches!(response.msg_type, v6::MessageType::Advertise) {
        return Err(Rejection::Mismatch("not an ADVERTISE"));
    }
    if response.inner.xid() != xid {
        return Err(Rejection::Mismatch("transaction ID differs"));
    }
    match response.inner.opts().get(v6::OptionCode::ClientId) {
        Some(v6::DhcpOption::ClientId(id)) if id.as_slice() == client_id => Ok(()),
        Some(_) => Err(Rejection::Mismatch("client identifier differs")),
        None => Err(Rejection::Mismatch("no client identifier")),
    }
}
