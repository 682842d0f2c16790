use super::message::{decode, encode};
use super::*;
use crate::error::Rejection;
use dhcproto::v4;
use std::net::Ipv4Addr;

const MAC: [u8; 6] = [0x00, 0x0c, 0x29, 0xa8, 0x92, 0xf4];
const XID: u32 = 0x12345678;

/// A server's Offer for our Discover.
fn offer(mac_addr: &[u8], xid: u32) -> v4::Message {
    let mut msg = v4::Message::default();
    msg.set_opcode(v4::Opcode::BootReply)
        .set_htype(v4::HType::Eth)
        .set_chaddr(mac_addr)
        .set_xid(xid)
        .set_yiaddr(Ipv4Addr::new(192, 168, 1, 100));
    msg.opts_mut()
        .insert(v4::DhcpOption::MessageType(v4::MessageType::Offer));
    msg.opts_mut()
        .insert(v4::DhcpOption::ServerIdentifier(Ipv4Addr::new(192, 168, 1, 1)));
    msg
}

#[test]
fn test_build_dhcp_discover() {
    let packet = encode(&build_dhcp_discover(&MAC, XID, Some("router"))).unwrap();

    // Decode the packet to verify it's valid
    let msg = decode(&packet).unwrap();

    assert_eq!(msg.xid(), XID);
    assert_eq!(msg.chaddr(), &MAC[..]);
    assert_eq!(msg.opcode(), v4::Opcode::BootRequest);
    assert!(msg.flags().broadcast());

    let msg_type = msg.opts().get(v4::OptionCode::MessageType);
    assert!(matches!(
        msg_type,
        Some(v4::DhcpOption::MessageType(v4::MessageType::Discover))
    ));

    let client_id = msg.opts().get(v4::OptionCode::ClientIdentifier);
    assert!(matches!(client_id, Some(v4::DhcpOption::ClientIdentifier(id)) if id[..] == MAC[..]));

    let hostname = msg.opts().get(v4::OptionCode::Hostname);
    assert!(matches!(hostname, Some(v4::DhcpOption::Hostname(name)) if name == "router"));
}

#[test]
fn test_build_dhcp_discover_without_hostname() {
    let msg = build_dhcp_discover(&MAC, XID, None);
    assert!(msg.opts().get(v4::OptionCode::Hostname).is_none());

    let msg = build_dhcp_discover(&MAC, XID, Some(""));
    assert!(msg.opts().get(v4::OptionCode::Hostname).is_none());
}

#[test]
fn test_matching_offer_is_accepted() {
    let packet = encode(&offer(&MAC, XID)).unwrap();
    let response = decode(&packet).unwrap();
    match_response(&response, &MAC, XID).unwrap();
}

#[test]
fn test_transaction_id_mismatch_is_rejected() {
    let response = offer(&MAC, XID + 1);
    let err = match_response(&response, &MAC, XID).unwrap_err();
    assert!(matches!(err, Rejection::Mismatch(_)));
}

#[test]
fn test_hardware_address_mismatch_is_rejected() {
    let other = [0x00, 0x0c, 0x29, 0xa8, 0x92, 0xf5];
    let response = offer(&other, XID);
    assert!(match_response(&response, &MAC, XID).is_err());
}

#[test]
fn test_boot_request_is_rejected() {
    // Our own broadcast, or another client's Discover, echoed back.
    let response = build_dhcp_discover(&MAC, XID, None);
    assert!(match_response(&response, &MAC, XID).is_err());
}

#[test]
fn test_missing_message_type_is_rejected() {
    let mut response = offer(&MAC, XID);
    response.opts_mut().remove(v4::OptionCode::MessageType);
    assert!(match_response(&response, &MAC, XID).is_err());
}

#[test]
fn test_non_ethernet_is_rejected() {
    let mut response = offer(&MAC, XID);
    response.set_htype(v4::HType::from(6u8)); // IEEE 802
    assert!(match_response(&response, &MAC, XID).is_err());
}

#[test]
fn test_garbage_fails_to_decode() {
    let err = decode(&[0x02, 0x01, 0x06]).unwrap_err();
    assert!(matches!(err, Rejection::Decode(_)));
}

#[test]
fn test_oversized_hardware_length_is_rejected() {
    let mut packet = encode(&offer(&MAC, XID)).unwrap();
    // hlen beyond the 16-byte chaddr field
    packet[2] = 17;
    let response = decode(&packet).unwrap();

    let err = match_response(&response, &MAC, XID).unwrap_err();
    assert!(matches!(err, Rejection::Mismatch(_)));
}
