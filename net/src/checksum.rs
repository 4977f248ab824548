// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The Internet checksum and the traits used to apply it to headers.
//!
//! The summation routines take the maximum length of the region they cover as a const
//! parameter.
//! Their loops therefore have an upper bound known at compile time, independent of the input,
//! which keeps them usable in execution contexts that must prove termination.

use std::fmt::Debug;

/// Error returned when a region is longer than the bound a checksum routine was instantiated
/// with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("checksum region of {len} octets exceeds the bound of {max} octets")]
pub struct ChecksumBoundError {
    /// Length of the rejected region
    pub len: usize,
    /// Bound of the routine
    pub max: usize,
}

/// One's complement sum of `bytes`, read as a sequence of big-endian 16-bit words.
///
/// A region of odd length is summed as if a single zero octet were appended to it.
/// The result is folded (end-around carry) but _not_ complemented, which makes partial sums
/// composable with [`ones_complement_add`] as long as every region but the last one has an even
/// length.
///
/// # Errors
///
/// Returns [`ChecksumBoundError`] if `bytes` is longer than `MAX_LEN`.
pub fn ones_complement_sum<const MAX_LEN: usize>(bytes: &[u8]) -> Result<u16, ChecksumBoundError> {
    if bytes.len() > MAX_LEN {
        return Err(ChecksumBoundError {
            len: bytes.len(),
            max: MAX_LEN,
        });
    }
    // invariant: sum <= 0xffff at the top of every iteration
    let mut sum: u32 = 0;
    for word in 0..MAX_LEN.div_ceil(2) {
        let offset = 2 * word;
        let Some(&high) = bytes.get(offset) else {
            break;
        };
        let low = bytes.get(offset + 1).copied().unwrap_or(0);
        sum += u32::from(u16::from_be_bytes([high, low]));
        sum = (sum & 0xffff) + (sum >> 16);
    }
    #[allow(clippy::cast_possible_truncation)] // folded at every step
    let sum = sum as u16;
    Ok(sum)
}

/// One's complement addition of two partial sums.
#[must_use]
pub fn ones_complement_add(a: u16, b: u16) -> u16 {
    let (sum, carry) = a.overflowing_add(b);
    sum + u16::from(carry)
}

/// The Internet checksum ([RFC 1071]) of `bytes`.
///
/// The returned value is in host order; write it with [`u16::to_be_bytes`].
/// Summing a region which embeds its own correct checksum yields `0`, which is what
/// [`is_valid`] checks.
///
/// # Errors
///
/// Returns [`ChecksumBoundError`] if `bytes` is longer than `MAX_LEN`.
///
/// [RFC 1071]: https://datatracker.ietf.org/doc/html/rfc1071
pub fn internet_checksum<const MAX_LEN: usize>(bytes: &[u8]) -> Result<u16, ChecksumBoundError> {
    Ok(!ones_complement_sum::<MAX_LEN>(bytes)?)
}

/// Returns true if `bytes` (checksum field included) sums to zero.
///
/// # Errors
///
/// Returns [`ChecksumBoundError`] if `bytes` is longer than `MAX_LEN`.
pub fn is_valid<const MAX_LEN: usize>(bytes: &[u8]) -> Result<bool, ChecksumBoundError> {
    Ok(internet_checksum::<MAX_LEN>(bytes)? == 0)
}

/// A trait for checksum calculation and manipulation.
///
/// This trait is used to calculate and manipulate checksums in various headers.
pub trait Checksum {
    /// The payload type for the header.
    ///
    /// This is used to calculate the checksum.
    type Payload<'a>: ?Sized
    where
        Self: 'a;
    /// The checksum type.
    ///
    /// This is used to represent the checksum value.
    type Checksum: Eq + Copy + Sized + Debug;

    /// Get the checksum value from the header
    fn checksum(&self) -> Self::Checksum;

    /// Compute the checksum value from the header and payload.
    ///
    /// The checksum field currently stored in the header does not take part in the computation.
    fn compute_checksum(&self, payload: &Self::Payload<'_>) -> Self::Checksum;

    /// Set the checksum value in the header.
    ///
    /// The validity of the checksum is not checked.
    fn set_checksum(&mut self, checksum: Self::Checksum) -> &mut Self;

    /// Validate the checksum value in the header.
    ///
    /// # Errors
    ///
    /// Returns a [`ChecksumError`] if the checksum is invalid.
    fn validate_checksum(
        &self,
        payload: &Self::Payload<'_>,
    ) -> Result<Self::Checksum, ChecksumError<Self>> {
        let expected = self.compute_checksum(payload);
        let actual = self.checksum();
        if expected == actual {
            Ok(expected)
        } else {
            Err(ChecksumError { expected, actual })
        }
    }

    /// Update the checksum value in the header.
    ///
    /// The post-condition of this function is that the checksum is valid.
    /// I.e., the `validate_checksum` function will not return an `Err` variant when given the same
    /// value for `payload` as was passed into this function.
    fn update_checksum(&mut self, payload: &Self::Payload<'_>) -> &mut Self {
        let ret = self.set_checksum(self.compute_checksum(payload));
        #[cfg(debug_assertions)]
        #[allow(clippy::panic)] // this is basically a debug_assert
        match ret.validate_checksum(payload) {
            Ok(_) => {}
            Err(err) => {
                panic!(
                    "checksum implementation is faulty: expected: {expected:?}, actual: {actual:?}",
                    expected = err.expected,
                    actual = err.actual
                );
            }
        }
        ret
    }
}

/// An error resulting from a checksum mismatch.
#[derive(Debug, thiserror::Error)]
#[error("checksum mismatch: expected {expected:?}, actual {actual:?}")]
pub struct ChecksumError<T: Checksum + ?Sized> {
    expected: T::Checksum,
    actual: T::Checksum,
}

impl<T: Checksum + ?Sized> ChecksumError<T> {
    /// The checksum computed from the header and payload
    pub fn expected(&self) -> T::Checksum {
        self.expected
    }

    /// The checksum found in the header
    pub fn actual(&self) -> T::Checksum {
        self.actual
    }
}
