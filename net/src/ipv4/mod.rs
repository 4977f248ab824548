// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IPv4 header type and logic.

use crate::parse::{DeParse, DeParseError, LengthError, Parse, ParseError};
use arrayvec::ArrayVec;
use etherparse::IpNumber;
use std::net::Ipv4Addr;
use std::num::NonZero;
use tracing::trace;

pub mod addr;
mod checksum;

pub use addr::UnicastIpv4Addr;
pub use checksum::*;

/// Options of an [`Ipv4`] header.
///
/// Options are carried as opaque octets: they are copied, never interpreted.
pub type Ipv4Options = ArrayVec<u8, { Ipv4::MAX_OPTIONS_LEN }>;

/// An IPv4 header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4 {
    tos: u8,
    total_len: u16,
    identification: u16,
    flags_fragment: u16,
    ttl: u8,
    protocol: IpNumber,
    checksum: u16,
    source: Ipv4Addr,
    destination: Ipv4Addr,
    options: Ipv4Options,
}

/// Error describing illegal length in an IPv4 header
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid IPv4 length requested: {requested}, max is {max} when considering all options and headers")]
pub struct Ipv4LengthError {
    requested: usize,
    max: usize,
}

/// Error which is triggered while parsing an [`Ipv4`] header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Ipv4Error {
    /// The version nibble is not 4.
    #[error("invalid IP version {0} (expected 4)")]
    Version(u8),
    /// The IHL field is below the 5 words of a header without options.
    #[error("invalid IPv4 header length {0} (in 32-bit words, minimum is 5)")]
    HeaderLength(u8),
}

impl Ipv4 {
    /// The IP version carried in the header
    pub const VERSION: u8 = 4;

    /// The minimum length of an IPv4 header (i.e., a header with no options)
    pub const MIN_LEN: usize = 20;

    /// The maximum length of an IPv4 header (i.e., a header with full options)
    pub const MAX_LEN: usize = 60;

    /// The maximum length of the options of an IPv4 header
    pub const MAX_OPTIONS_LEN: usize = Ipv4::MAX_LEN - Ipv4::MIN_LEN;

    /// TTL given to headers built with [`Ipv4::new`]
    pub const DEFAULT_TTL: u8 = 64;

    const DONT_FRAGMENT: u16 = 0x4000;
    const MORE_FRAGMENTS: u16 = 0x2000;
    const FRAGMENT_OFFSET_MASK: u16 = 0x1fff;

    /// Create a new IPv4 header without options and without payload.
    ///
    /// Identification, flags and fragment offset are zero and the checksum is left unset.
    #[must_use]
    pub fn new(source: Ipv4Addr, destination: Ipv4Addr, protocol: IpNumber) -> Ipv4 {
        #[allow(clippy::cast_possible_truncation)] // constant fits
        let total_len = Ipv4::MIN_LEN as u16;
        Ipv4 {
            tos: 0,
            total_len,
            identification: 0,
            flags_fragment: 0,
            ttl: Ipv4::DEFAULT_TTL,
            protocol,
            checksum: 0,
            source,
            destination,
            options: Ipv4Options::new(),
        }
    }

    /// Get the source ip address of the header
    #[must_use]
    pub fn source(&self) -> Ipv4Addr {
        self.source
    }

    /// Get the destination ip address of the header
    #[must_use]
    pub fn destination(&self) -> Ipv4Addr {
        self.destination
    }

    /// Get the options for this header (as a byte slice)
    #[must_use]
    pub fn options(&self) -> &[u8] {
        self.options.as_slice()
    }

    /// Get the next layer protocol which follows this header.
    #[must_use]
    pub fn protocol(&self) -> IpNumber {
        self.protocol
    }

    /// Length of the header (includes options) in bytes.
    ///
    /// <div class="warning">
    /// The returned value is in bytes (not in units of 32 bits as per the IHL field).
    /// </div>
    #[must_use]
    pub fn header_len(&self) -> usize {
        Ipv4::MIN_LEN + self.options.len()
    }

    /// The IHL field, i.e., the header length in units of 32 bits.
    #[must_use]
    pub fn ihl(&self) -> u8 {
        #[allow(clippy::cast_possible_truncation)] // at most 15
        let ihl = (self.header_len() / 4) as u8;
        ihl
    }

    /// Value of total length ip header field
    #[must_use]
    pub fn total_len(&self) -> u16 {
        self.total_len
    }

    /// The number of routing hops the packet is allowed to take.
    #[must_use]
    pub fn ttl(&self) -> u8 {
        self.ttl
    }

    /// The type of service octet (DSCP and ECN).
    #[must_use]
    pub fn tos(&self) -> u8 {
        self.tos
    }

    /// Returns true if the "don't fragment" bit is set in this header.
    #[must_use]
    pub fn dont_fragment(&self) -> bool {
        self.flags_fragment & Ipv4::DONT_FRAGMENT != 0
    }

    /// Returns true if the "more-fragments" bit is set in this header.
    #[must_use]
    pub fn more_fragments(&self) -> bool {
        self.flags_fragment & Ipv4::MORE_FRAGMENTS != 0
    }

    /// The fragment offset, in units of 8 octets.
    #[must_use]
    pub fn fragment_offset(&self) -> u16 {
        self.flags_fragment & Ipv4::FRAGMENT_OFFSET_MASK
    }

    /// Return the headers "identification".
    /// See [IP fragmentation]
    ///
    /// [IP Fragmentation]: https://en.wikipedia.org/wiki/IP_fragmentation
    #[must_use]
    pub fn identification(&self) -> u16 {
        self.identification
    }

    /// Set the destination ip address for this header.
    pub fn set_destination(&mut self, dest: Ipv4Addr) -> &mut Self {
        self.destination = dest;
        self
    }

    /// Set the header's time to live
    /// (i.e., the maximum number of routing hops it can traverse without being dropped).
    pub fn set_ttl(&mut self, ttl: u8) -> &mut Self {
        self.ttl = ttl;
        self
    }

    /// Set the type of service octet.
    pub fn set_tos(&mut self, tos: u8) -> &mut Self {
        self.tos = tos;
        self
    }

    /// Set the length _of the payload_ of the ipv4 packet.
    ///
    /// This method will adjust the total length of the header to account for options and the
    /// length of this header.
    ///
    /// This method _will not_ update the checksum of the header.
    ///
    /// # Errors
    ///
    /// This method returns [`Ipv4LengthError`] if the total length would not fit in the header.
    pub fn set_payload_len(&mut self, payload_len: usize) -> Result<&mut Self, Ipv4LengthError> {
        let requested = self.header_len() + payload_len;
        self.total_len = u16::try_from(requested).map_err(|_| Ipv4LengthError {
            requested,
            max: usize::from(u16::MAX),
        })?;
        Ok(self)
    }

    /// Write the header to the front of `buf`, with the given value in the checksum field.
    ///
    /// The caller guarantees `buf.len() >= self.header_len()`.
    fn write_with_checksum(&self, buf: &mut [u8], checksum: u16) {
        buf[0] = (Ipv4::VERSION << 4) | self.ihl();
        buf[1] = self.tos;
        buf[2..4].copy_from_slice(&self.total_len.to_be_bytes());
        buf[4..6].copy_from_slice(&self.identification.to_be_bytes());
        buf[6..8].copy_from_slice(&self.flags_fragment.to_be_bytes());
        buf[8] = self.ttl;
        buf[9] = self.protocol.0;
        buf[10..12].copy_from_slice(&checksum.to_be_bytes());
        buf[12..16].copy_from_slice(&self.source.octets());
        buf[16..20].copy_from_slice(&self.destination.octets());
        buf[Ipv4::MIN_LEN..self.header_len()].copy_from_slice(self.options());
    }
}

impl Parse for Ipv4 {
    type Error = Ipv4Error;

    fn parse(buf: &[u8]) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>> {
        #[allow(clippy::unwrap_used)] // const-eval and trivially safe
        const MIN_LEN: NonZero<usize> = NonZero::new(Ipv4::MIN_LEN).unwrap();
        if buf.len() < Ipv4::MIN_LEN {
            return Err(ParseError::Length(LengthError {
                expected: MIN_LEN,
                actual: buf.len(),
            }));
        }
        let version = buf[0] >> 4;
        if version != Ipv4::VERSION {
            return Err(ParseError::Invalid(Ipv4Error::Version(version)));
        }
        let ihl = buf[0] & 0x0f;
        if ihl < 5 {
            return Err(ParseError::Invalid(Ipv4Error::HeaderLength(ihl)));
        }
        let header_len = NonZero::new(usize::from(ihl) * 4).unwrap_or_else(|| unreachable!());
        if buf.len() < header_len.get() {
            return Err(ParseError::Length(LengthError {
                expected: header_len,
                actual: buf.len(),
            }));
        }
        let options = Ipv4Options::try_from(&buf[Ipv4::MIN_LEN..header_len.get()])
            .unwrap_or_else(|_| unreachable!()); // ihl <= 15 bounds the options to 40 octets
        let header = Ipv4 {
            tos: buf[1],
            total_len: u16::from_be_bytes([buf[2], buf[3]]),
            identification: u16::from_be_bytes([buf[4], buf[5]]),
            flags_fragment: u16::from_be_bytes([buf[6], buf[7]]),
            ttl: buf[8],
            protocol: IpNumber(buf[9]),
            checksum: u16::from_be_bytes([buf[10], buf[11]]),
            source: Ipv4Addr::new(buf[12], buf[13], buf[14], buf[15]),
            destination: Ipv4Addr::new(buf[16], buf[17], buf[18], buf[19]),
            options,
        };
        trace!(
            "parsed ipv4 header: {src} -> {dst}, ihl {ihl}, ttl {ttl}",
            src = header.source,
            dst = header.destination,
            ttl = header.ttl
        );
        Ok((header, header_len))
    }
}

impl DeParse for Ipv4 {
    type Error = ();

    fn size(&self) -> NonZero<usize> {
        NonZero::new(self.header_len()).unwrap_or_else(|| unreachable!())
    }

    fn deparse(&self, buf: &mut [u8]) -> Result<NonZero<usize>, DeParseError<Self::Error>> {
        let len = buf.len();
        if len < self.size().get() {
            return Err(DeParseError::Length(LengthError {
                expected: self.size(),
                actual: len,
            }));
        }
        self.write_with_checksum(buf, self.checksum);
        Ok(self.size())
    }
}

#[cfg(any(test, feature = "bolero"))]
mod contract {
    use crate::ipv4::{Ipv4, Ipv4Options};
    use bolero::{Driver, TypeGenerator};
    use etherparse::IpNumber;
    use std::net::Ipv4Addr;

    impl TypeGenerator for Ipv4 {
        fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
            let options_words = usize::from(driver.produce::<u8>()? % 11);
            let raw_options: [u8; Ipv4::MAX_OPTIONS_LEN] = driver.produce()?;
            let options = Ipv4Options::try_from(&raw_options[..options_words * 4])
                .unwrap_or_else(|_| unreachable!());
            Some(Ipv4 {
                tos: driver.produce()?,
                total_len: driver.produce()?,
                identification: driver.produce()?,
                flags_fragment: driver.produce()?,
                ttl: driver.produce()?,
                protocol: IpNumber(driver.produce()?),
                checksum: driver.produce()?,
                source: Ipv4Addr::from(driver.produce::<u32>()?),
                destination: Ipv4Addr::from(driver.produce::<u32>()?),
                options,
            })
        }
    }
}
