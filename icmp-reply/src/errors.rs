// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Errors returned when an ICMP error reply cannot be built.

use etherparse::EtherType;

/// Reasons for which an offending packet cannot be quoted in an ICMP error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Malformed {
    /// The length claimed by the caller runs past the end of the buffer.
    #[error("packet length {length} exceeds the buffer capacity {capacity}")]
    LengthExceedsBuffer {
        /// Claimed packet length
        length: usize,
        /// Octets available in the buffer
        capacity: usize,
    },
    /// The packet is shorter than the headers it must carry.
    #[error("packet of {length} octets is truncated, {needed} required")]
    Truncated {
        /// Packet length
        length: usize,
        /// Minimum length required
        needed: usize,
    },
    /// The packet is longer than any IPv4 packet may be.
    #[error("packet of {length} octets exceeds the IPv4 maximum of {max}")]
    Oversized {
        /// Packet length
        length: usize,
        /// Largest IPv4 packet
        max: usize,
    },
    /// The IP version nibble is not 4.
    #[error("not an IPv4 packet (version {0})")]
    Version(u8),
    /// The IHL field is below 5.
    #[error("invalid IPv4 header length {0}")]
    HeaderLength(u8),
    /// The frame does not carry IPv4.
    #[error("frame carries ethertype {0:?}, not IPv4")]
    NotIpv4(EtherType),
}

/// Error returned by the ICMP responder.
///
/// The packet buffer is left untouched whenever an error is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IcmpReplyError {
    /// The offending packet cannot be quoted.
    #[error("malformed packet: {0}")]
    Malformed(#[from] Malformed),
    /// The reply does not fit in the buffer.
    #[error("reply of {needed} octets does not fit in a buffer of {capacity}")]
    BufferTooSmall {
        /// Length of the reply
        needed: usize,
        /// Octets available in the buffer
        capacity: usize,
    },
}
