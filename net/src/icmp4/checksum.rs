// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! `ICMPv4` checksum type and methods

use crate::checksum::{Checksum, ones_complement_add, ones_complement_sum};
use crate::icmp4::{EmbeddedPacket, Icmp4};
use core::fmt::{Display, Formatter};

/// A icmp [checksum]
///
/// [checksum]: https://en.wikipedia.org/wiki/Internet_Control_Message_Protocol#Header
#[repr(transparent)]
#[cfg_attr(any(test, feature = "bolero"), derive(bolero::TypeGenerator))]
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct Icmp4Checksum(pub(crate) u16);

impl Display for Icmp4Checksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#06X}", self.0)
    }
}

impl Icmp4Checksum {
    /// Map a raw value to a [`Icmp4Checksum`]
    #[must_use]
    pub const fn new(raw: u16) -> Icmp4Checksum {
        Icmp4Checksum(raw)
    }
}

impl From<u16> for Icmp4Checksum {
    fn from(raw: u16) -> Self {
        Self::new(raw)
    }
}

impl From<Icmp4Checksum> for u16 {
    fn from(checksum: Icmp4Checksum) -> Self {
        checksum.0
    }
}

impl Checksum for Icmp4 {
    type Payload<'a> = EmbeddedPacket;
    type Checksum = Icmp4Checksum;

    /// Get the [`Icmp4`] checksum of the header
    fn checksum(&self) -> Icmp4Checksum {
        Icmp4Checksum(self.0.checksum)
    }

    /// Compute the icmp v4 header's checksum over the header and the quoted datagram.
    ///
    /// This method _does not_ update the checksum field.
    fn compute_checksum(&self, payload: &EmbeddedPacket) -> Icmp4Checksum {
        let mut header = self.0.clone();
        header.checksum = 0;
        // ICMP headers are a multiple of 4 octets long, so the partial sums compose
        let header_sum = ones_complement_sum::<{ Icmp4::MAX_HEADER_LEN }>(&header.to_bytes())
            .unwrap_or_else(|_| unreachable!());
        let payload_sum = ones_complement_sum::<{ EmbeddedPacket::MAX_LEN }>(payload.as_slice())
            .unwrap_or_else(|_| unreachable!()); // bounded by construction
        Icmp4Checksum(!ones_complement_add(header_sum, payload_sum))
    }

    /// Set the checksum field of the header
    fn set_checksum(&mut self, checksum: Icmp4Checksum) -> &mut Self {
        self.0.checksum = checksum.0;
        self
    }
}
