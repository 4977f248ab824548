// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Selection of the source address of ICMP error replies.
//!
//! A router normally answers from the address the offending packet was sent to. When the
//! packet went through address translation, the NAT layer knows better and plugs in its own
//! [`ReplySource`].

use net::ipv4::{Ipv4, UnicastIpv4Addr};

/// Chooses the source address of the reply to an offending packet.
pub trait ReplySource {
    /// The address to answer from, or `None` to answer from the offending packet's destination.
    fn reply_source(&self, offending: &Ipv4) -> Option<UnicastIpv4Addr>;
}

/// Answer from the destination of the offending packet.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OriginalDestination;

impl ReplySource for OriginalDestination {
    fn reply_source(&self, _offending: &Ipv4) -> Option<UnicastIpv4Addr> {
        None
    }
}

impl ReplySource for UnicastIpv4Addr {
    fn reply_source(&self, _offending: &Ipv4) -> Option<UnicastIpv4Addr> {
        Some(*self)
    }
}

impl ReplySource for Option<UnicastIpv4Addr> {
    fn reply_source(&self, _offending: &Ipv4) -> Option<UnicastIpv4Addr> {
        *self
    }
}

impl<S: ReplySource + ?Sized> ReplySource for &S {
    fn reply_source(&self, offending: &Ipv4) -> Option<UnicastIpv4Addr> {
        (**self).reply_source(offending)
    }
}

/// A [`ReplySource`] backed by a closure, see [`from_fn`].
#[derive(Debug, Clone, Copy)]
pub struct FromFn<F>(F);

/// Wrap a closure looking up the reply source (e.g. in a NAT table).
pub fn from_fn<F>(lookup: F) -> FromFn<F>
where
    F: Fn(&Ipv4) -> Option<UnicastIpv4Addr>,
{
    FromFn(lookup)
}

impl<F> ReplySource for FromFn<F>
where
    F: Fn(&Ipv4) -> Option<UnicastIpv4Addr>,
{
    fn reply_source(&self, offending: &Ipv4) -> Option<UnicastIpv4Addr> {
        (self.0)(offending)
    }
}
