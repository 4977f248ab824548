// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! ICMP error replies staged on the stack.

use crate::config::{ReplyConfig, ShortPacketPolicy};
use crate::errors::{IcmpReplyError, Malformed};
use crate::source::ReplySource;
use etherparse::IpNumber;
use net::checksum::Checksum;
use net::icmp4::{EmbeddedPacket, Icmp4, Icmp4ErrorKind};
use net::ipv4::{Ipv4, Ipv4Error};
use net::parse::{DeParse, DeParseError, LengthError, Parse, ParseError, Writer};
use std::num::NonZero;
use tracing::trace;

/// A complete `ICMPv4` error message answering an offending packet.
///
/// The reply owns a copy of the quoted octets, so it may be written over the very buffer the
/// offending packet was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpReply {
    ip: Ipv4,
    icmp: Icmp4,
    embedded: EmbeddedPacket,
}

impl IcmpReply {
    /// Length of the largest reply: outer header, ICMP header and the largest quote
    pub const MAX_LEN: usize = Ipv4::MIN_LEN + Icmp4::ERROR_HEADER_LEN + EmbeddedPacket::MAX_LEN;

    /// Length of the largest offending packet which may be answered
    pub const MAX_PACKET_LEN: usize = 0xffff;

    /// Validate `packet` and stage the reply of the given kind.
    ///
    /// `packet` holds the offending IPv4 packet and nothing past its end.
    ///
    /// # Errors
    ///
    /// Returns [`IcmpReplyError::Malformed`] if `packet` is not an IPv4 packet which can be
    /// quoted.
    pub fn prepare<S: ReplySource + ?Sized>(
        packet: &[u8],
        kind: Icmp4ErrorKind,
        config: &ReplyConfig,
        source: &S,
    ) -> Result<IcmpReply, IcmpReplyError> {
        let length = packet.len();
        if length > IcmpReply::MAX_PACKET_LEN {
            return Err(Malformed::Oversized {
                length,
                max: IcmpReply::MAX_PACKET_LEN,
            }
            .into());
        }
        let (offending, header_len) = Ipv4::parse(packet).map_err(|e| match e {
            ParseError::Length(e) => Malformed::Truncated {
                length,
                needed: e.expected().get(),
            },
            ParseError::Invalid(Ipv4Error::Version(version)) => Malformed::Version(version),
            ParseError::Invalid(Ipv4Error::HeaderLength(ihl)) => Malformed::HeaderLength(ihl),
        })?;

        let wanted = header_len.get() + EmbeddedPacket::TRANSPORT_PEEK;
        let embed_len = if length >= wanted {
            wanted
        } else {
            match config.short_packets() {
                ShortPacketPolicy::Truncate => {
                    trace!("quoting {length} octets, {wanted} wanted");
                    length
                }
                ShortPacketPolicy::Reject => {
                    return Err(Malformed::Truncated {
                        length,
                        needed: wanted,
                    }
                    .into());
                }
            }
        };
        let embedded = EmbeddedPacket::try_from(&packet[..embed_len])
            .unwrap_or_else(|_| unreachable!()); // header_len <= Ipv4::MAX_LEN

        let reply_source = source
            .reply_source(&offending)
            .map_or(offending.destination(), |address| address.inner());
        let mut ip = Ipv4::new(reply_source, offending.source(), IpNumber::ICMP);
        ip.set_ttl(config.ttl()).set_tos(config.tos());
        ip.set_payload_len(Icmp4::ERROR_HEADER_LEN + embedded.len())
            .unwrap_or_else(|_| unreachable!()) // at most IcmpReply::MAX_LEN
            .update_checksum(&());

        let mut icmp = Icmp4::error(kind);
        icmp.update_checksum(&embedded);

        Ok(IcmpReply { ip, icmp, embedded })
    }

    /// The outer IPv4 header
    #[must_use]
    pub fn ip(&self) -> &Ipv4 {
        &self.ip
    }

    /// The ICMP header
    #[must_use]
    pub fn icmp(&self) -> &Icmp4 {
        &self.icmp
    }

    /// The quoted octets of the offending packet
    #[must_use]
    pub fn embedded(&self) -> &EmbeddedPacket {
        &self.embedded
    }

    /// Total length of the reply in octets
    #[must_use]
    pub fn len(&self) -> usize {
        self.ip.header_len() + Icmp4::ERROR_HEADER_LEN + self.embedded.len()
    }

    /// Always false: a reply carries at least its headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Write the reply to the front of `buf`.
    ///
    /// Nothing is written if the reply does not fit.
    ///
    /// # Errors
    ///
    /// Returns [`IcmpReplyError::BufferTooSmall`] if `buf` is shorter than [`IcmpReply::len`].
    pub fn write(&self, buf: &mut [u8]) -> Result<usize, IcmpReplyError> {
        match self.deparse(buf) {
            Ok(written) => Ok(written.get()),
            Err(DeParseError::Length(e)) => Err(IcmpReplyError::BufferTooSmall {
                needed: e.expected().get(),
                capacity: e.actual(),
            }),
            Err(DeParseError::Invalid(())) => unreachable!(),
        }
    }
}

impl DeParse for IcmpReply {
    type Error = ();

    fn size(&self) -> NonZero<usize> {
        NonZero::new(self.len()).unwrap_or_else(|| unreachable!())
    }

    fn deparse(&self, buf: &mut [u8]) -> Result<NonZero<usize>, DeParseError<Self::Error>> {
        let len = buf.len();
        if len < self.size().get() {
            return Err(DeParseError::Length(LengthError::new(self.size(), len)));
        }
        let mut writer = Writer::new(&mut buf[..self.size().get()]);
        writer.write(&self.ip)?;
        writer.write(&self.icmp)?;
        writer
            .write_bytes(self.embedded.as_slice())
            .map_err(DeParseError::Length)?;
        Ok(self.size())
    }
}
