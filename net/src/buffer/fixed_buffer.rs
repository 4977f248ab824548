// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Fixed capacity implementation of [`PacketBuffer`], stored inline (no heap).

use crate::buffer::{Append, MemoryBufferNotLongEnough, NotEnoughTailRoom, Tailroom, TrimFromEnd};
use tracing::trace;

// only included for doc ref
#[cfg(doc)]
use crate::buffer::PacketBuffer;

/// A [`PacketBuffer`] of `CAPACITY` octets whose current length may grow and shrink.
///
/// The octets past the current length are the tailroom.
#[derive(Debug, Clone)]
pub struct FixedBuffer<const CAPACITY: usize> {
    data: [u8; CAPACITY],
    len: usize,
}

impl<const CAPACITY: usize> FixedBuffer<CAPACITY> {
    /// Create a new, empty `FixedBuffer`.
    #[must_use]
    pub fn new() -> FixedBuffer<CAPACITY> {
        let mut data = [0u8; CAPACITY];
        // fill the buffer with a simple pattern of bytes to help debug any memory access errors
        for (i, octet) in data.iter_mut().enumerate() {
            #[allow(clippy::cast_possible_truncation)] // sound due to bitwise and
            let pattern = (i & usize::from(u8::MAX)) as u8;
            *octet = pattern;
        }
        FixedBuffer { data, len: 0 }
    }

    /// Create a new `FixedBuffer` holding a copy of `packet`.
    ///
    /// # Errors
    ///
    /// Returns [`NotEnoughTailRoom`] if `packet` is longer than `CAPACITY`.
    pub fn from_raw_data(packet: &[u8]) -> Result<FixedBuffer<CAPACITY>, NotEnoughTailRoom> {
        if packet.len() > CAPACITY {
            return Err(NotEnoughTailRoom);
        }
        let mut buffer = FixedBuffer::new();
        buffer.data[..packet.len()].copy_from_slice(packet);
        buffer.len = packet.len();
        Ok(buffer)
    }

    /// The maximum number of octets the buffer can hold.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        CAPACITY
    }
}

impl<const CAPACITY: usize> Default for FixedBuffer<CAPACITY> {
    fn default() -> Self {
        FixedBuffer::new()
    }
}

impl<const CAPACITY: usize> AsRef<[u8]> for FixedBuffer<CAPACITY> {
    fn as_ref(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

impl<const CAPACITY: usize> AsMut<[u8]> for FixedBuffer<CAPACITY> {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.data[..self.len]
    }
}

impl<const CAPACITY: usize> Tailroom for FixedBuffer<CAPACITY> {
    fn tailroom(&self) -> u16 {
        u16::try_from(CAPACITY - self.len).unwrap_or(u16::MAX)
    }
}

impl<const CAPACITY: usize> Append for FixedBuffer<CAPACITY> {
    type Error = NotEnoughTailRoom;
    fn append(&mut self, len: u16) -> Result<&mut [u8], Self::Error> {
        if self.tailroom() < len {
            return Err(NotEnoughTailRoom);
        }
        trace!("growing buffer by {len} octets");
        self.len += usize::from(len);
        Ok(self.as_mut())
    }
}

impl<const CAPACITY: usize> TrimFromEnd for FixedBuffer<CAPACITY> {
    type Error = MemoryBufferNotLongEnough;
    fn trim_from_end(&mut self, len: u16) -> Result<&mut [u8], MemoryBufferNotLongEnough> {
        if usize::from(len) > self.len {
            return Err(MemoryBufferNotLongEnough);
        }
        trace!("shrinking buffer by {len} octets");
        self.len -= usize::from(len);
        Ok(self.as_mut())
    }
}

#[cfg(any(test, feature = "bolero"))]
mod contract {
    use crate::buffer::FixedBuffer;
    use bolero::{Driver, TypeGenerator};

    impl<const CAPACITY: usize> TypeGenerator for FixedBuffer<CAPACITY> {
        fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
            let mut buffer = FixedBuffer::new();
            let len = usize::from(driver.produce::<u16>()?) % (CAPACITY + 1);
            for octet in &mut buffer.data[..len] {
                *octet = driver.produce()?;
            }
            buffer.len = len;
            Some(buffer)
        }
    }
}
