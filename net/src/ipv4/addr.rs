// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IPv4 address types

use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;

/// Thin wrapper around [`Ipv4Addr`]
///
/// This wrapper scopes addresses to be unicast, i.e., usable as the source of a packet.
/// Multicast, broadcast and unspecified addresses are refused.
#[non_exhaustive]
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnicastIpv4Addr(Ipv4Addr);

impl UnicastIpv4Addr {
    /// Map an unqualified [`Ipv4Addr`] to a [`UnicastIpv4Addr`].
    ///
    /// # Errors
    ///
    /// Returns the supplied address back in the [`Err`] case if it is not a unicast address.
    pub fn new(ip: Ipv4Addr) -> Result<UnicastIpv4Addr, Ipv4Addr> {
        if ip.is_multicast() || ip.is_broadcast() || ip.is_unspecified() {
            Err(ip)
        } else {
            Ok(UnicastIpv4Addr(ip))
        }
    }

    /// Get the inner (wrapped) [`Ipv4Addr`]
    #[must_use]
    pub fn inner(&self) -> Ipv4Addr {
        self.0
    }
}

impl Display for UnicastIpv4Addr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(any(test, feature = "bolero"))]
mod contract {
    use crate::ipv4::addr::UnicastIpv4Addr;
    use bolero::{Driver, TypeGenerator};
    use std::net::Ipv4Addr;

    impl TypeGenerator for UnicastIpv4Addr {
        fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
            // fold the handful of refused addresses onto a fixed unicast one
            let ip = Ipv4Addr::from(driver.produce::<u32>()?);
            Some(UnicastIpv4Addr::new(ip).unwrap_or(UnicastIpv4Addr(Ipv4Addr::new(192, 0, 2, 1))))
        }
    }
}
