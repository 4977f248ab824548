// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use crate::checksum::{Checksum, internet_checksum};
use crate::ipv4::Ipv4;
use std::fmt::{Display, Formatter};

/// A [`Ipv4`] checksum
#[repr(transparent)]
#[cfg_attr(any(test, feature = "bolero"), derive(bolero::TypeGenerator))]
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct Ipv4Checksum(u16);

impl Display for Ipv4Checksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#06X}", self.0)
    }
}

impl Ipv4Checksum {
    /// Map a raw value to a [`Ipv4Checksum`]
    #[must_use]
    pub const fn new(raw: u16) -> Ipv4Checksum {
        Ipv4Checksum(raw)
    }
}

impl From<u16> for Ipv4Checksum {
    fn from(raw: u16) -> Self {
        Self::new(raw)
    }
}

impl From<Ipv4Checksum> for u16 {
    fn from(checksum: Ipv4Checksum) -> Self {
        checksum.0
    }
}

impl Checksum for Ipv4 {
    type Payload<'a>
        = ()
    where
        Self: 'a;
    type Checksum = Ipv4Checksum;

    fn checksum(&self) -> Self::Checksum {
        Ipv4Checksum(self.checksum)
    }

    /// The checksum covers the header (options included) only.
    fn compute_checksum(&self, _payload: &Self::Payload<'_>) -> Self::Checksum {
        let mut scratch = [0u8; Ipv4::MAX_LEN];
        self.write_with_checksum(&mut scratch, 0);
        let csum = internet_checksum::<{ Ipv4::MAX_LEN }>(&scratch[..self.header_len()])
            .unwrap_or_else(|_| unreachable!()); // header_len() <= MAX_LEN
        Ipv4Checksum(csum)
    }

    fn set_checksum(&mut self, checksum: Self::Checksum) -> &mut Self {
        self.checksum = checksum.0;
        self
    }
}

#[cfg(test)]
mod test {
    use crate::checksum::{Checksum, is_valid};
    use crate::ipv4::{Ipv4, Ipv4Checksum};
    use crate::parse::DeParse;
    use etherparse::Ipv4HeaderSlice;

    #[test]
    fn compute_matches_etherparse() {
        bolero::check!().with_type().for_each(|ip: &Ipv4| {
            if usize::from(ip.total_len()) < ip.header_len() {
                return; // etherparse refuses those headers
            }
            let mut buf = [0u8; Ipv4::MAX_LEN];
            let len = ip.deparse(&mut buf).unwrap().get();
            let theirs = Ipv4HeaderSlice::from_slice(&buf[..len])
                .unwrap()
                .to_header()
                .calc_header_checksum();
            assert_eq!(ip.compute_checksum(&()), Ipv4Checksum::new(theirs));
        });
    }

    #[test]
    fn updated_header_sums_to_zero() {
        bolero::check!().with_type().for_each(|ip: &Ipv4| {
            let mut ip = ip.clone();
            ip.update_checksum(&());
            assert!(ip.validate_checksum(&()).is_ok());
            let mut buf = [0u8; Ipv4::MAX_LEN];
            let len = ip.deparse(&mut buf).unwrap().get();
            assert_eq!(is_valid::<{ Ipv4::MAX_LEN }>(&buf[..len]), Ok(true));
        });
    }

    #[test]
    fn stale_checksum_is_reported() {
        bolero::check!().with_type().for_each(|ip: &Ipv4| {
            let mut ip = ip.clone();
            ip.update_checksum(&());
            let good = ip.checksum();
            ip.set_ttl(ip.ttl().wrapping_add(1));
            let err = ip.validate_checksum(&()).unwrap_err();
            assert_eq!(err.actual(), good);
            assert_ne!(err.expected(), good);
        });
    }
}
