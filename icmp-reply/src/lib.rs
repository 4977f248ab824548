// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all, clippy::pedantic)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! `ICMPv4` error replies for the forwarding path.
//!
//! When a packet cannot be forwarded (its TTL expired, it is too big for the next hop, ...)
//! the [`IcmpResponder`] rewrites it, in the buffer it arrived in, into the ICMP error telling
//! its sender why. Nothing is allocated and the buffer is left untouched when no reply can be
//! built.

mod config;
mod errors;
mod reply;
mod responder;
mod source;

pub use config::{ReplyConfig, ReplyConfigBuilder, ReplyConfigBuilderError, ShortPacketPolicy};
pub use errors::{IcmpReplyError, Malformed};
pub use reply::IcmpReply;
pub use responder::{IcmpResponder, respond_ttl_exceeded};
pub use source::{FromFn, OriginalDestination, ReplySource, from_fn};
