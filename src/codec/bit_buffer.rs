//! Bit-addressable storage.
//!
//! Values are packed most-significant-bit first and may straddle byte
//! boundaries. While writing, the current byte holds its bits right-aligned;
//! closing the buffer shifts the final partial byte into position.

use std::fmt;

use crate::error::BufferError;

/// Maximum number of bits a single read or write may touch.
pub const MAX_ACCESS_BITS: u32 = 64;

/// Access mode of a [`BitBuffer`], fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Read => f.write_str("read"),
            Mode::Write => f.write_str("write"),
        }
    }
}

#[inline]
fn low_mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// A write-only or read-only sequence of bits.
#[derive(Debug, Clone)]
pub struct BitBuffer {
    mode: Mode,
    bytes: Vec<u8>,
    index: usize,
    bit_index: u32,
    closed: bool,
}

impl Default for BitBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl BitBuffer {
    /// Create an empty buffer in write mode.
    pub fn new() -> Self {
        BitBuffer {
            mode: Mode::Write,
            bytes: vec![0],
            index: 0,
            bit_index: 0,
            closed: false,
        }
    }

    /// Create a read-mode buffer over `bytes`.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        BitBuffer {
            mode: Mode::Read,
            bytes: bytes.into(),
            index: 0,
            bit_index: 0,
            closed: true,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether the written bytes have been finalized.
    pub fn is_closed(&self) -> bool {
        self.mode == Mode::Write && self.closed
    }

    /// Cursor position in bits from the start of the buffer.
    pub fn position(&self) -> usize {
        self.index * 8 + self.bit_index as usize
    }

    /// Bits left to read. Always 0 for a write buffer.
    pub fn remaining_bits(&self) -> usize {
        match self.mode {
            Mode::Read => (self.bytes.len() * 8).saturating_sub(self.position()),
            Mode::Write => 0,
        }
    }

    /// True when the read cursor sits on the final byte.
    pub fn last_byte(&self) -> bool {
        self.mode == Mode::Read && !self.bytes.is_empty() && self.index == self.bytes.len() - 1
    }

    /// Write the low `bits` bits of `value`.
    pub fn write(&mut self, value: u64, bits: u32) -> Result<(), BufferError> {
        self.ensure_writable()?;
        if bits > MAX_ACCESS_BITS {
            return Err(BufferError::WidthTooLarge(bits));
        }
        if bits == 0 {
            return Ok(());
        }
        let value = value & low_mask(bits);
        let left = 8 - self.bit_index;
        let current = self.bytes[self.index] as u64;

        if bits <= left {
            self.bytes[self.index] = ((current << bits) | value) as u8;
            self.advance(bits);
            return Ok(());
        }

        let mut remaining = bits - left;
        self.bytes[self.index] = ((current << left) | (value >> remaining)) as u8;
        self.advance(left);

        while remaining >= 8 {
            remaining -= 8;
            self.bytes[self.index] = (value >> remaining) as u8;
            self.advance(8);
        }
        if remaining > 0 {
            self.bytes[self.index] = (value & low_mask(remaining)) as u8;
            self.advance(remaining);
        }
        Ok(())
    }

    /// Read `bits` bits as an unsigned value.
    pub fn read(&mut self, bits: u32) -> Result<u64, BufferError> {
        self.ensure_mode(Mode::Read)?;
        if bits > MAX_ACCESS_BITS {
            return Err(BufferError::WidthTooLarge(bits));
        }
        self.ensure_available(bits as usize)?;
        if bits == 0 {
            return Ok(0);
        }

        let left = 8 - self.bit_index;
        let current = self.bytes[self.index] as u64;
        if bits <= left {
            let value = (current >> (left - bits)) & low_mask(bits);
            self.advance(bits);
            return Ok(value);
        }

        let mut result = current & low_mask(left);
        self.advance(left);
        let mut remaining = bits - left;

        while remaining >= 8 {
            result = (result << 8) | self.bytes[self.index] as u64;
            self.advance(8);
            remaining -= 8;
        }
        if remaining > 0 {
            let tail = self.bytes[self.index] as u64 >> (8 - remaining);
            result = (result << remaining) | tail;
            self.advance(remaining);
        }
        Ok(result)
    }

    /// Move the cursor forward without transferring data.
    ///
    /// A write buffer reserves the skipped bits as zeros.
    pub fn skip(&mut self, bits: usize) -> Result<(), BufferError> {
        match self.mode {
            Mode::Read => {
                self.ensure_available(bits)?;
                let target = self.position() + bits;
                self.index = target / 8;
                self.bit_index = (target % 8) as u32;
                Ok(())
            }
            Mode::Write => {
                let mut left = bits;
                while left > 0 {
                    let chunk = left.min(MAX_ACCESS_BITS as usize);
                    self.write(0, chunk as u32)?;
                    left -= chunk;
                }
                Ok(())
            }
        }
    }

    /// Finalize (for write buffers) and borrow the underlying bytes.
    pub fn bytes(&mut self) -> &[u8] {
        self.close();
        &self.bytes
    }

    /// Finalize (for write buffers) and take the underlying bytes.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.close();
        self.bytes
    }

    fn close(&mut self) {
        if self.mode == Mode::Read || self.closed {
            return;
        }
        self.closed = true;
        if self.bit_index > 0 {
            self.bytes[self.index] <<= 8 - self.bit_index;
        }
    }

    fn advance(&mut self, bits: u32) {
        self.bit_index += bits;
        while self.bit_index >= 8 {
            self.bit_index -= 8;
            self.index += 1;
            if self.mode == Mode::Write {
                self.bytes.push(0);
            }
        }
    }

    fn ensure_mode(&self, expected: Mode) -> Result<(), BufferError> {
        if self.mode != expected {
            return Err(BufferError::WrongMode {
                expected,
                actual: self.mode,
            });
        }
        Ok(())
    }

    fn ensure_writable(&self) -> Result<(), BufferError> {
        self.ensure_mode(Mode::Write)?;
        if self.closed {
            return Err(BufferError::Closed);
        }
        Ok(())
    }

    fn ensure_available(&self, bits: usize) -> Result<(), BufferError> {
        let length = self.bytes.len() * 8;
        if self.position() + bits > length {
            return Err(BufferError::OutOfBounds {
                position: self.position(),
                requested: bits,
                length,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_byte_is_left_aligned_on_close() {
        let mut buf = BitBuffer::new();
        buf.write(0b101, 3).unwrap();
        assert_eq!(buf.bytes(), &[0b1010_0000]);
    }

    #[test]
    fn test_straddling_write() {
        let mut buf = BitBuffer::new();
        buf.write(0b101, 3).unwrap();
        buf.write(0b111_1111, 7).unwrap();
        assert_eq!(buf.bytes(), &[0b1011_1111, 0b1100_0000]);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut buf = BitBuffer::new();
        buf.write(1, 1).unwrap();
        let first = buf.bytes().to_vec();
        let second = buf.bytes().to_vec();
        assert_eq!(first, second);
        assert!(buf.is_closed());
        assert_eq!(buf.write(1, 1), Err(BufferError::Closed));
    }

    #[test]
    fn test_write_skip_reserves_zero_bits() {
        let mut buf = BitBuffer::new();
        buf.write(1, 1).unwrap();
        buf.skip(6).unwrap();
        buf.write(1, 1).unwrap();
        assert_eq!(buf.bytes()[0], 0b1000_0001);
    }

    #[test]
    fn test_last_byte() {
        let mut buf = BitBuffer::from_bytes(vec![0xAB, 0xCD]);
        assert!(!buf.last_byte());
        buf.read(8).unwrap();
        assert!(buf.last_byte());
        assert_eq!(buf.remaining_bits(), 8);
    }
}
