use crate::error::Rejection;
use dhcproto::{
    error::EncodeError,
    v4::{self, OptionCode},
    Decodable as _, Encodable as _, Encoder,
};

/// Constructs a DHCP Discover message.
///
/// The hardware address is used both as `chaddr` and as the client
/// identifier; the host name option is only added when one is known.
pub fn build_dhcp_discover(mac_addr: &[u8], xid: u32, hostname: Option<&str>) -> v4::Message {
    let mut msg = v4::Message::default();
    msg.set_opcode(v4::Opcode::BootRequest)
        .set_chaddr(mac_addr)
        .set_htype(v4::HType::Eth) // Ethernet
        .set_hops(0)
        .set_xid(xid) // Transaction ID
        .set_secs(0)
        .set_flags(v4::Flags::default().set_broadcast());

    // Add DHCP Message Type Option (53) - DHCPDISCOVER (1)
    msg.opts_mut()
        .insert(v4::DhcpOption::MessageType(v4::MessageType::Discover));

    // Client Identifier Option (61)
    msg.opts_mut()
        .insert(v4::DhcpOption::ClientIdentifier(mac_addr.to_vec()));

    // Host Name Option (12)
    if let Some(hostname) = hostname.filter(|h| !h.is_empty()) {
        msg.opts_mut()
            .insert(v4::DhcpOption::Hostname(hostname.to_string()));
    }

    // Add Parameter Request List Option (55)
    msg.opts_mut()
        .insert(v4::DhcpOption::ParameterRequestList(vec![
            OptionCode::SubnetMask,       // 1
            OptionCode::Router,           // 3
            OptionCode::DomainNameServer, // 6
            OptionCode::DomainName,       // 15
        ]));

    msg
}

pub fn encode(msg: &v4::Message) -> Result<Vec<u8>, EncodeError> {
    let mut buffer = Vec::new();
    let mut encoder = Encoder::new(&mut buffer);
    msg.encode(&mut encoder)?;
    Ok(buffer)
}

pub fn decode(data: &[u8]) -> Result<v4::Message, Rejection> {
    Ok(v4::Message::decode(&mut v4::Decoder::new(data))?)
}

/// Checks that `response` is a server's answer to the Discover identified by
/// `mac_addr` and `xid`.
pub fn match_response(response: &v4::Message, mac_addr: &[u8], xid: u32) -> Result<(), Rejection> {
    if response.opcode() != v4::Opcode::BootReply {
        return Err(Rejection::Mismatch("not a BOOTREPLY"));
    }
    if response.htype() != v4::HType::Eth {
        return Err(Rejection::Mismatch("hardware type is not Ethernet"));
    }
    if response.hlen() as usize != mac_addr.len() {
        return Err(Rejection::Mismatch("hardware address length differs"));
    }
    if response.chaddr() != mac_addr {
        return Err(Rejection::Mismatch("client hardware address differs"));
    }
    if response.xid() != xid {
        return Err(Rejection::Mismatch("transaction ID differs"));
    }
    if response.opts().get(OptionCode::MessageType).is_none() {
        return Err(Rejection::Mismatch("no DHCP message type option"));
    }
    Ok(())
}
