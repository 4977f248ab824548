// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! In-place rewriting of offending packets into ICMP error replies.

use crate::config::ReplyConfig;
use crate::errors::{IcmpReplyError, Malformed};
use crate::reply::IcmpReply;
use crate::source::{OriginalDestination, ReplySource};
use etherparse::EtherType;
use net::buffer::PacketBufferMut;
use net::eth::Eth;
use net::icmp4::Icmp4ErrorKind;
use net::ipv4::UnicastIpv4Addr;
use net::parse::{DeParse, Parse, ParseError};
use tracing::{debug, trace};

/// Turns offending packets into `ICMPv4` error replies, in the buffer they arrived in.
///
/// Every method either rewrites the buffer into a complete reply and returns its length, or
/// returns an error and leaves the buffer untouched.
#[derive(Debug, Clone, Default)]
pub struct IcmpResponder<S = OriginalDestination> {
    config: ReplyConfig,
    source: S,
}

impl IcmpResponder {
    /// Create a responder answering from the destination of the offending packets.
    #[must_use]
    pub fn new(config: ReplyConfig) -> IcmpResponder {
        IcmpResponder {
            config,
            source: OriginalDestination,
        }
    }
}

impl<S: ReplySource> IcmpResponder<S> {
    /// Replace the [`ReplySource`] of the responder.
    #[must_use]
    pub fn with_source<T: ReplySource>(self, source: T) -> IcmpResponder<T> {
        IcmpResponder {
            config: self.config,
            source,
        }
    }

    /// The configuration of the responder
    #[must_use]
    pub fn config(&self) -> &ReplyConfig {
        &self.config
    }

    /// The [`ReplySource`] of the responder
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    fn prepare(&self, packet: &[u8], kind: Icmp4ErrorKind) -> Result<IcmpReply, IcmpReplyError> {
        let reply = IcmpReply::prepare(packet, kind, &self.config, &self.source)
            .inspect_err(|e| debug!("not answering packet of {} octets: {e}", packet.len()))?;
        debug!(
            "icmp error {icmp_type}/{code} {src} -> {dst}, {len} octets",
            icmp_type = reply.icmp().type_u8(),
            code = reply.icmp().code_u8(),
            src = reply.ip().source(),
            dst = reply.ip().destination(),
            len = reply.len()
        );
        Ok(reply)
    }

    /// Rewrite the IPv4 packet held in `buffer[..length]` into an ICMP error of the given kind.
    ///
    /// The whole of `buffer` is available to the reply. Returns the length of the reply.
    ///
    /// # Errors
    ///
    /// * [`IcmpReplyError::Malformed`] if `length` exceeds the buffer or the packet cannot be
    ///   quoted
    /// * [`IcmpReplyError::BufferTooSmall`] if the reply does not fit in `buffer`
    pub fn respond(
        &self,
        kind: Icmp4ErrorKind,
        buffer: &mut [u8],
        length: usize,
    ) -> Result<usize, IcmpReplyError> {
        let capacity = buffer.len();
        if length > capacity {
            debug!("packet length {length} past buffer of {capacity} octets");
            return Err(Malformed::LengthExceedsBuffer { length, capacity }.into());
        }
        let reply = self.prepare(&buffer[..length], kind)?;
        reply
            .write(buffer)
            .inspect_err(|e| debug!("dropping icmp error: {e}"))
    }

    /// Rewrite the packet into an ICMP "time exceeded in transit" error.
    ///
    /// # Errors
    ///
    /// See [`IcmpResponder::respond`].
    pub fn respond_ttl_exceeded(
        &self,
        buffer: &mut [u8],
        length: usize,
    ) -> Result<usize, IcmpReplyError> {
        self.respond(Icmp4ErrorKind::TTL_EXCEEDED, buffer, length)
    }

    /// Rewrite the packet into an ICMP "fragmentation needed and DF set" error advertising
    /// `next_hop_mtu`.
    ///
    /// # Errors
    ///
    /// See [`IcmpResponder::respond`].
    pub fn respond_frag_needed(
        &self,
        buffer: &mut [u8],
        length: usize,
        next_hop_mtu: u16,
    ) -> Result<usize, IcmpReplyError> {
        self.respond(
            Icmp4ErrorKind::fragmentation_needed(next_hop_mtu),
            buffer,
            length,
        )
    }

    /// Rewrite the Ethernet frame held in `buffer[..length]` into an ICMP error of the given
    /// kind, sent back to the MAC it came from.
    ///
    /// Returns the length of the reply frame, Ethernet header included.
    ///
    /// # Errors
    ///
    /// As [`IcmpResponder::respond`], and [`Malformed::NotIpv4`] if the frame does not carry
    /// IPv4.
    pub fn respond_frame(
        &self,
        kind: Icmp4ErrorKind,
        buffer: &mut [u8],
        length: usize,
    ) -> Result<usize, IcmpReplyError> {
        let capacity = buffer.len();
        if length > capacity {
            debug!("frame length {length} past buffer of {capacity} octets");
            return Err(Malformed::LengthExceedsBuffer { length, capacity }.into());
        }
        let (mut eth, eth_len) = match Eth::parse(&buffer[..length]) {
            Ok(parsed) => parsed,
            Err(ParseError::Length(e)) => {
                return Err(Malformed::Truncated {
                    length,
                    needed: e.expected().get(),
                }
                .into());
            }
            Err(ParseError::Invalid(e)) => match e {},
        };
        if eth.ether_type() != EtherType::IPV4 {
            debug!("not answering frame with ethertype {:?}", eth.ether_type());
            return Err(Malformed::NotIpv4(eth.ether_type()).into());
        }
        let reply = self
            .prepare(&buffer[eth_len.get()..length], kind)
            .map_err(|e| match e {
                IcmpReplyError::Malformed(Malformed::Truncated { needed, .. }) => {
                    Malformed::Truncated {
                        length,
                        needed: eth_len.get() + needed,
                    }
                    .into()
                }
                e => e,
            })?;
        let needed = eth_len.get() + reply.len();
        if needed > capacity {
            debug!("reply frame of {needed} octets past buffer of {capacity} octets");
            return Err(IcmpReplyError::BufferTooSmall { needed, capacity });
        }
        eth.swap_addresses();
        eth.deparse(buffer).unwrap_or_else(|_| unreachable!());
        reply.write(&mut buffer[eth_len.get()..])?;
        Ok(needed)
    }

    /// Rewrite the IPv4 packet held in a [`PacketBufferMut`] into an ICMP error of the given
    /// kind, growing or shrinking the buffer to the length of the reply.
    ///
    /// # Errors
    ///
    /// As [`IcmpResponder::respond`]; [`IcmpReplyError::BufferTooSmall`] is returned when the
    /// tailroom of the buffer cannot hold the reply.
    pub fn respond_in<Buf: PacketBufferMut>(
        &self,
        kind: Icmp4ErrorKind,
        buffer: &mut Buf,
    ) -> Result<usize, IcmpReplyError> {
        let packet: &[u8] = buffer.as_ref();
        let length = packet.len();
        let reply = self.prepare(packet, kind)?;
        let needed = reply.len();
        if needed > length {
            let tailroom = usize::from(buffer.tailroom());
            let too_small = IcmpReplyError::BufferTooSmall {
                needed,
                capacity: length + tailroom,
            };
            if needed - length > tailroom {
                debug!("reply of {needed} octets past buffer of {length} + {tailroom} octets");
                return Err(too_small);
            }
            let grow = u16::try_from(needed - length).map_err(|_| too_small)?;
            trace!("growing buffer by {grow} octets for the reply");
            buffer.append(grow).map_err(|_| too_small)?;
        } else if needed < length {
            let shrink = u16::try_from(length - needed).map_err(|_| Malformed::Oversized {
                length,
                max: IcmpReply::MAX_PACKET_LEN,
            })?;
            trace!("trimming {shrink} octets past the reply");
            buffer
                .trim_from_end(shrink)
                .unwrap_or_else(|_| unreachable!()); // needed < length
        }
        reply.write(buffer.as_mut())
    }
}

/// Rewrite the IPv4 packet held in `buffer[..length]` into an ICMP "time exceeded in transit"
/// error, with the default [`ReplyConfig`].
///
/// The reply is sent from `nat_source` when given, from the destination of the packet
/// otherwise. Returns the length of the reply.
///
/// # Errors
///
/// See [`IcmpResponder::respond`].
pub fn respond_ttl_exceeded(
    buffer: &mut [u8],
    length: usize,
    nat_source: Option<UnicastIpv4Addr>,
) -> Result<usize, IcmpReplyError> {
    IcmpResponder::new(ReplyConfig::default())
        .with_source(nat_source)
        .respond_ttl_exceeded(buffer, length)
}
