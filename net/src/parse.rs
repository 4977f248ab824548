// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Packet parsing traits

use std::num::NonZero;

/// A header which can be parsed from the front of a buffer.
pub trait Parse: Sized {
    /// Error raised when the octets do not form a valid header.
    type Error: core::error::Error;
    /// Parse from a buffer.
    ///
    /// Returns the header and the number of octets it occupies.
    ///
    /// # Errors
    ///
    /// Returns an error in the event that parsing fails.
    fn parse(buf: &[u8]) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>>;
}

/// A header which can be written to the front of a buffer.
pub trait DeParse {
    /// Error raised when the header cannot be serialized.
    type Error;

    /// Number of octets [`DeParse::deparse`] writes.
    fn size(&self) -> NonZero<usize>;
    /// Write a data structure (e.g., a packet header) to a buffer.
    ///
    /// Returns the number of bytes written in the event of success.
    ///
    /// # Errors
    ///
    /// Will return an error if there is not enough space in the buffer
    /// or if serialization fails from some other (implementation-dependent) reason.
    fn deparse(&self, buf: &mut [u8]) -> Result<NonZero<usize>, DeParseError<Self::Error>>;
}

/// Error describing a buffer too short for the requested operation.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("expected at least {expected} bytes, got {actual}")]
pub struct LengthError {
    pub(crate) expected: NonZero<usize>,
    pub(crate) actual: usize,
}

impl LengthError {
    /// Report that `expected` octets were required where only `actual` were available.
    #[must_use]
    pub fn new(expected: NonZero<usize>, actual: usize) -> LengthError {
        LengthError { expected, actual }
    }

    /// Number of octets the operation required
    #[must_use]
    pub fn expected(&self) -> NonZero<usize> {
        self.expected
    }

    /// Number of octets available
    #[must_use]
    pub fn actual(&self) -> usize {
        self.actual
    }
}

/// Cursor over a buffer to which headers are written in sequence.
#[derive(Debug)]
pub struct Writer<'buf> {
    inner: &'buf mut [u8],
    remaining: usize,
}

impl Writer<'_> {
    /// Create a writer positioned at the start of `buf`.
    #[must_use]
    pub fn new(buf: &mut [u8]) -> Writer<'_> {
        let len = buf.len();
        Writer {
            inner: buf,
            remaining: len,
        }
    }

    /// Number of octets written so far.
    #[must_use]
    pub fn written(&self) -> usize {
        self.inner.len() - self.remaining
    }

    fn consume(&mut self, n: NonZero<usize>) -> Result<(), LengthError> {
        if n.get() > self.remaining {
            return Err(LengthError {
                expected: n,
                actual: self.remaining,
            });
        }
        self.remaining -= n.get();
        Ok(())
    }

    /// Write a header after the octets already written.
    ///
    /// # Errors
    ///
    /// Returns the header's deparse error.
    pub fn write<T: DeParse>(&mut self, val: &T) -> Result<NonZero<usize>, DeParseError<T::Error>> {
        let current = self.written();
        let consumed = val.deparse(&mut self.inner[current..])?;
        self.consume(consumed).map_err(DeParseError::Length)?;
        Ok(consumed)
    }

    /// Copy raw octets after the octets already written.
    ///
    /// # Errors
    ///
    /// Returns a [`LengthError`] if `bytes` does not fit in the remaining space.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize, LengthError> {
        let Some(len) = NonZero::new(bytes.len()) else {
            return Ok(0);
        };
        let current = self.written();
        self.consume(len)?;
        self.inner[current..current + len.get()].copy_from_slice(bytes);
        Ok(len.get())
    }
}

/// Error returned by [`Parse::parse`].
#[derive(thiserror::Error, Debug)]
pub enum ParseError<E: core::error::Error> {
    /// The buffer is too short for the header.
    #[error(transparent)]
    Length(LengthError),
    /// The octets do not form a valid header.
    #[error(transparent)]
    Invalid(E),
}

/// Error returned by [`DeParse::deparse`].
#[derive(thiserror::Error, Debug)]
pub enum DeParseError<E> {
    /// The buffer is too short for the header.
    #[error(transparent)]
    Length(LengthError),
    /// The header could not be serialized.
    #[error(transparent)]
    Invalid(E),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn writer_fills_buffer_exactly() {
        let mut buf = [0u8; 4];
        let mut writer = Writer::new(&mut buf);
        assert_eq!(writer.write_bytes(&[1, 2]), Ok(2));
        assert_eq!(writer.write_bytes(&[3, 4]), Ok(2));
        assert_eq!(writer.written(), 4);
        assert_eq!(writer.write_bytes(&[]), Ok(0));
        let err = writer.write_bytes(&[5]).unwrap_err();
        assert_eq!(err.expected().get(), 1);
        assert_eq!(err.actual(), 0);
        assert_eq!(buf, [1, 2, 3, 4]);
    }
}
