// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! A router sees a UDP frame whose TTL is about to expire and bounces a "time exceeded"
//! frame back to the sender.

use dataplane_icmp_reply::{IcmpResponder, ReplyConfigBuilder};
use etherparse::{
    EtherType, Icmpv4Type, NetSlice, PacketBuilder, SlicedPacket, TransportSlice,
    icmpv4::TimeExceededCode,
};
use net::eth::Eth;
use net::icmp4::Icmp4ErrorKind;
use net::ipv4::Ipv4;
use pretty_assertions::assert_eq;

/// Ethernet, IPv4 and UDP headers: frames shorter than this are dropped before the responder.
const MIN_FRAME_LEN: usize = 14 + 20 + 8;

const HOST_MAC: [u8; 6] = [0x02, 0xde, 0xad, 0x00, 0x00, 0x01];
const ROUTER_MAC: [u8; 6] = [0x02, 0xde, 0xad, 0x00, 0x00, 0xfe];

fn udp_frame(payload: &[u8], ttl: u8) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(HOST_MAC, ROUTER_MAC)
        .ipv4([10, 0, 0, 1], [10, 0, 0, 2], ttl)
        .udp(33434, 33435);
    let mut frame = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).unwrap();
    frame
}

#[test]
fn traceroute_probe_gets_time_exceeded() {
    let frame = udp_frame(b"traceroute probe", 1);
    assert!(frame.len() >= MIN_FRAME_LEN);

    let mut buffer = [0u8; 1514];
    buffer[..frame.len()].copy_from_slice(&frame);

    let responder = IcmpResponder::new(ReplyConfigBuilder::default().ttl(255).build().unwrap());
    let len = responder
        .respond_frame(Icmp4ErrorKind::TTL_EXCEEDED, &mut buffer, frame.len())
        .unwrap();
    assert_eq!(len, 14 + 20 + 8 + 28);

    let reply = SlicedPacket::from_ethernet(&buffer[..len]).unwrap();
    let Some(etherparse::LinkSlice::Ethernet2(eth)) = reply.link else {
        panic!("reply has no ethernet header");
    };
    assert_eq!(eth.source(), ROUTER_MAC);
    assert_eq!(eth.destination(), HOST_MAC);
    assert_eq!(eth.ether_type(), EtherType::IPV4);

    let Some(NetSlice::Ipv4(ip)) = reply.net else {
        panic!("reply has no ipv4 header");
    };
    assert_eq!(ip.header().source(), [10, 0, 0, 2]);
    assert_eq!(ip.header().destination(), [10, 0, 0, 1]);
    assert_eq!(ip.header().ttl(), 255);
    assert_eq!(
        ip.header().header_checksum(),
        ip.header().to_header().calc_header_checksum()
    );

    let Some(TransportSlice::Icmpv4(icmp)) = reply.transport else {
        panic!("reply has no icmp header");
    };
    assert_eq!(
        icmp.icmp_type(),
        Icmpv4Type::TimeExceeded(TimeExceededCode::TtlExceededInTransit)
    );
    assert_eq!(icmp.checksum(), icmp.icmp_type().calc_checksum(icmp.payload()));
    // the quote is the original ip header and the udp header
    assert_eq!(icmp.payload(), &frame[14..14 + 28]);
}

#[test]
fn runt_frames_are_refused_untouched() {
    let frame = udp_frame(&[], 1);
    let mut buffer = [0u8; 64];
    buffer[..frame.len()].copy_from_slice(&frame);
    let original = buffer;
    let responder = IcmpResponder::new(ReplyConfigBuilder::default().build().unwrap());
    for length in 0..Eth::HEADER_LEN + Ipv4::MIN_LEN {
        assert!(
            responder
                .respond_frame(Icmp4ErrorKind::TTL_EXCEEDED, &mut buffer, length)
                .is_err()
        );
    }
    assert_eq!(buffer, original);
}
