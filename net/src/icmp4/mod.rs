// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! `ICMPv4` header type and logic.

use crate::ipv4::Ipv4;
use crate::parse::{DeParse, DeParseError, LengthError, Parse, ParseError};
use arrayvec::ArrayVec;
use etherparse::icmpv4::{DestUnreachableHeader, ParameterProblemHeader, TimeExceededCode};
use etherparse::{Icmpv4Header, Icmpv4Type};
use std::num::NonZero;

mod checksum;

pub use checksum::*;

/// An `ICMPv4` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icmp4(Icmpv4Header);

/// The `ICMPv4` error messages which quote an offending datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Icmp4ErrorKind {
    /// Type 11: the datagram was discarded because its TTL expired, or because its fragments
    /// could not be reassembled in time.
    TimeExceeded(TimeExceededCode),
    /// Type 3: the datagram could not be delivered.
    DestinationUnreachable(DestUnreachableHeader),
    /// Type 12: a header field of the datagram could not be processed.
    ParameterProblem(ParameterProblemHeader),
}

impl Icmp4ErrorKind {
    /// Time exceeded, TTL exceeded in transit (type 11, code 0)
    pub const TTL_EXCEEDED: Icmp4ErrorKind =
        Icmp4ErrorKind::TimeExceeded(TimeExceededCode::TtlExceededInTransit);

    /// Destination unreachable, fragmentation needed and DF set (type 3, code 4)
    #[must_use]
    pub fn fragmentation_needed(next_hop_mtu: u16) -> Icmp4ErrorKind {
        Icmp4ErrorKind::DestinationUnreachable(DestUnreachableHeader::FragmentationNeeded {
            next_hop_mtu,
        })
    }

    /// The ICMP type number
    #[must_use]
    pub fn type_u8(&self) -> u8 {
        Icmp4::error(self.clone()).type_u8()
    }

    /// The ICMP code number
    #[must_use]
    pub fn code_u8(&self) -> u8 {
        Icmp4::error(self.clone()).code_u8()
    }
}

impl From<Icmp4ErrorKind> for Icmpv4Type {
    fn from(kind: Icmp4ErrorKind) -> Self {
        match kind {
            Icmp4ErrorKind::TimeExceeded(code) => Icmpv4Type::TimeExceeded(code),
            Icmp4ErrorKind::DestinationUnreachable(header) => {
                Icmpv4Type::DestinationUnreachable(header)
            }
            Icmp4ErrorKind::ParameterProblem(header) => Icmpv4Type::ParameterProblem(header),
        }
    }
}

impl Icmp4 {
    /// Largest `ICMPv4` header (timestamp messages) in octets
    pub const MAX_HEADER_LEN: usize = 20;

    /// Length of the header of the error messages in octets
    pub const ERROR_HEADER_LEN: usize = 8;

    /// Create the header of an `ICMPv4` error message, with a zero checksum.
    #[must_use]
    pub fn error(kind: Icmp4ErrorKind) -> Icmp4 {
        Icmp4(Icmpv4Header::new(kind.into()))
    }

    /// The type of message carried by the header
    #[must_use]
    pub fn icmp_type(&self) -> &Icmpv4Type {
        &self.0.icmp_type
    }

    /// Returns the error kind if the header is one of an error message quoting a datagram.
    #[must_use]
    pub fn error_kind(&self) -> Option<Icmp4ErrorKind> {
        match &self.0.icmp_type {
            Icmpv4Type::TimeExceeded(code) => Some(Icmp4ErrorKind::TimeExceeded(code.clone())),
            Icmpv4Type::DestinationUnreachable(header) => {
                Some(Icmp4ErrorKind::DestinationUnreachable(header.clone()))
            }
            Icmpv4Type::ParameterProblem(header) => {
                Some(Icmp4ErrorKind::ParameterProblem(header.clone()))
            }
            _ => None,
        }
    }

    /// The type number, as found in the first octet of the header
    #[must_use]
    pub fn type_u8(&self) -> u8 {
        self.0.to_bytes()[0]
    }

    /// The code number, as found in the second octet of the header
    #[must_use]
    pub fn code_u8(&self) -> u8 {
        self.0.to_bytes()[1]
    }
}

impl Parse for Icmp4 {
    type Error = LengthError;

    fn parse(buf: &[u8]) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>> {
        let (inner, rest) = Icmpv4Header::from_slice(buf).map_err(|e| {
            let expected = NonZero::new(e.required_len).unwrap_or_else(|| unreachable!());
            ParseError::Length(LengthError {
                expected,
                actual: buf.len(),
            })
        })?;
        let consumed = NonZero::new(buf.len() - rest.len()).unwrap_or_else(|| unreachable!());
        Ok((Self(inner), consumed))
    }
}

impl DeParse for Icmp4 {
    type Error = ();

    fn size(&self) -> NonZero<usize> {
        NonZero::new(self.0.header_len()).unwrap_or_else(|| unreachable!())
    }

    fn deparse(&self, buf: &mut [u8]) -> Result<NonZero<usize>, DeParseError<Self::Error>> {
        let len = buf.len();
        if len < self.size().get() {
            return Err(DeParseError::Length(LengthError {
                expected: self.size(),
                actual: len,
            }));
        }
        buf[..self.size().get()].copy_from_slice(&self.0.to_bytes());
        Ok(self.size())
    }
}

/// The leading octets of an offending datagram, as quoted in an `ICMPv4` error message.
///
/// The quote is the IP header (options included) followed by at most
/// [`EmbeddedPacket::TRANSPORT_PEEK`] octets of its payload, held in stack storage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmbeddedPacket(ArrayVec<u8, { EmbeddedPacket::MAX_LEN }>);

/// Error returned when a quote would exceed [`EmbeddedPacket::MAX_LEN`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot quote {0} octets, at most {max} fit in an ICMP error", max = EmbeddedPacket::MAX_LEN)]
pub struct EmbeddedPacketTooLong(pub usize);

impl EmbeddedPacket {
    /// Number of payload octets quoted after the IP header
    pub const TRANSPORT_PEEK: usize = 8;

    /// The largest quote: an IPv4 header with full options and the transport peek
    pub const MAX_LEN: usize = Ipv4::MAX_LEN + EmbeddedPacket::TRANSPORT_PEEK;

    /// The quoted octets
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Number of quoted octets
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing is quoted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<&[u8]> for EmbeddedPacket {
    type Error = EmbeddedPacketTooLong;

    fn try_from(octets: &[u8]) -> Result<Self, Self::Error> {
        ArrayVec::try_from(octets)
            .map(EmbeddedPacket)
            .map_err(|_| EmbeddedPacketTooLong(octets.len()))
    }
}

impl AsRef<[u8]> for EmbeddedPacket {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

#[cfg(any(test, feature = "bolero"))]
mod contract {
    use crate::icmp4::{EmbeddedPacket, Icmp4, Icmp4ErrorKind};
    use bolero::{Driver, TypeGenerator};
    use etherparse::icmpv4::{DestUnreachableHeader, ParameterProblemHeader, TimeExceededCode};

    impl TypeGenerator for Icmp4ErrorKind {
        fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
            let kind = match driver.produce::<u8>()? % 6 {
                0 => Icmp4ErrorKind::TTL_EXCEEDED,
                1 => Icmp4ErrorKind::TimeExceeded(TimeExceededCode::FragmentReassemblyTimeExceeded),
                2 => Icmp4ErrorKind::fragmentation_needed(driver.produce()?),
                3 => Icmp4ErrorKind::DestinationUnreachable(DestUnreachableHeader::Port),
                4 => Icmp4ErrorKind::DestinationUnreachable(DestUnreachableHeader::Host),
                _ => Icmp4ErrorKind::ParameterProblem(
                    ParameterProblemHeader::PointerIndicatesError(driver.produce()?),
                ),
            };
            Some(kind)
        }
    }

    impl TypeGenerator for Icmp4 {
        fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
            Some(Icmp4::error(driver.produce()?))
        }
    }

    impl TypeGenerator for EmbeddedPacket {
        fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
            let raw: [u8; EmbeddedPacket::MAX_LEN] = driver.produce()?;
            let len = usize::from(driver.produce::<u8>()?) % (EmbeddedPacket::MAX_LEN + 1);
            EmbeddedPacket::try_from(&raw[..len]).ok()
        }
    }
}
