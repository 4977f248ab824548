// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Ethernet types

pub mod mac;

use crate::eth::mac::Mac;
use crate::parse::{DeParse, DeParseError, LengthError, Parse, ParseError};
use etherparse::{EtherType, Ethernet2Header};
use std::convert::Infallible;
use std::num::NonZero;

/// An ethernet header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eth(Ethernet2Header);

impl Eth {
    /// The length (in bytes) of an [`Eth`] header
    pub const HEADER_LEN: usize = 14;

    /// Create a new [Eth] header.
    #[must_use]
    pub fn new(source: Mac, destination: Mac, ether_type: EtherType) -> Eth {
        Eth(Ethernet2Header {
            source: source.0,
            destination: destination.0,
            ether_type,
        })
    }

    /// Get the source [Mac] of the header.
    #[must_use]
    pub fn source(&self) -> Mac {
        Mac(self.0.source)
    }

    /// Get the destination [Mac] of the header.
    #[must_use]
    pub fn destination(&self) -> Mac {
        Mac(self.0.destination)
    }

    /// Get the ethertype of the header.
    #[must_use]
    pub fn ether_type(&self) -> EtherType {
        self.0.ether_type
    }

    /// Exchange the source and destination [Mac] of the header, so that the frame goes back to
    /// where it came from.
    pub fn swap_addresses(&mut self) -> &mut Eth {
        std::mem::swap(&mut self.0.source, &mut self.0.destination);
        self
    }
}

impl Parse for Eth {
    type Error = Infallible;

    fn parse(buf: &[u8]) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>> {
        let (inner, rest) = Ethernet2Header::from_slice(buf).map_err(|e| {
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

impl DeParse for Eth {
    type Error = ();

    fn size(&self) -> NonZero<usize> {
        NonZero::new(Eth::HEADER_LEN).unwrap_or_else(|| unreachable!())
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
