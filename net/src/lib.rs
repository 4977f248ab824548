// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![forbid(unsafe_code)] // Validation logic should always be strictly safe
#![deny(missing_docs, clippy::all, clippy::pedantic)] // yeah, I'm that guy.  I'm not sorry.
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Do you know where your towel is?

//! A library for working with and strictly validating network data
//!
//! Every header type in this crate lives on the stack: parsing, deparsing and checksum
//! computation never touch the heap, so the types may be used in the packet fast path.

pub mod buffer;
pub mod checksum;
pub mod eth;
pub mod icmp4;
pub mod ipv4;
pub mod parse;
