//! Typed primitive encodings on top of [`BitBuffer`].

use super::bit_buffer::{BitBuffer, Mode};
use super::string;
use super::wire::{
    band_for, float_band, FLOAT_SELECTOR_BITS, LOSSLESS_FLOAT_SELECTOR, LOSSY_FLOAT_MAX,
    LOSSY_FLOAT_MIN,
};
use crate::error::{DecodeError, EncodeError};

const VARLONG_GROUP_BITS: u32 = 7;

/// Reads and writes primitive values as bits.
#[derive(Debug, Clone, Default)]
pub struct BitSerializer {
    buffer: BitBuffer,
}

impl BitSerializer {
    /// Create a serializer in write mode.
    pub fn new() -> Self {
        BitSerializer {
            buffer: BitBuffer::new(),
        }
    }

    /// Create a serializer reading `bytes`.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        BitSerializer {
            buffer: BitBuffer::from_bytes(bytes),
        }
    }

    pub fn mode(&self) -> Mode {
        self.buffer.mode()
    }

    pub fn buffer(&self) -> &BitBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut BitBuffer {
        &mut self.buffer
    }

    pub fn position(&self) -> usize {
        self.buffer.position()
    }

    pub fn remaining_bits(&self) -> usize {
        self.buffer.remaining_bits()
    }

    pub fn last_byte(&self) -> bool {
        self.buffer.last_byte()
    }

    pub fn skip(&mut self, bits: usize) -> Result<(), DecodeError> {
        Ok(self.buffer.skip(bits)?)
    }

    /// Finalize and borrow the encoded bytes.
    pub fn bytes(&mut self) -> &[u8] {
        self.buffer.bytes()
    }

    /// Finalize and take the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.into_bytes()
    }

    // =========================================================================
    // Raw bits
    // =========================================================================

    pub fn write_bits(&mut self, value: u64, bits: u32) -> Result<(), EncodeError> {
        Ok(self.buffer.write(value, bits)?)
    }

    pub fn read_bits(&mut self, bits: u32) -> Result<u64, DecodeError> {
        Ok(self.buffer.read(bits)?)
    }

    // =========================================================================
    // Bool and byte
    // =========================================================================

    pub fn write_bool(&mut self, value: bool) -> Result<(), EncodeError> {
        self.write_bits(value as u64, 1)
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_bits(1)? == 1)
    }

    pub fn write_byte(&mut self, value: u8) -> Result<(), EncodeError> {
        self.write_bits(value as u64, 8)
    }

    pub fn read_byte(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Write raw bytes without a length prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        for &b in bytes {
            self.write_byte(b)?;
        }
        Ok(())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, DecodeError> {
        (0..len).map(|_| self.read_byte()).collect()
    }

    // =========================================================================
    // Fixed-width integers
    // =========================================================================

    /// Sign bit followed by `bits - 1` magnitude bits. Negative values are
    /// stored as `-v - 1`, so the full two's complement range fits.
    pub fn write_int(&mut self, value: i64, bits: u32) -> Result<(), EncodeError> {
        let (sign, magnitude) = split_sign(value);
        self.write_bool(sign)?;
        self.write_bits(magnitude, bits.saturating_sub(1))
    }

    pub fn read_int(&mut self, bits: u32) -> Result<i64, DecodeError> {
        let sign = self.read_bool()?;
        let magnitude = self.read_bits(bits.saturating_sub(1))?;
        Ok(join_sign(sign, magnitude))
    }

    pub fn write_uint(&mut self, value: u64, bits: u32) -> Result<(), EncodeError> {
        self.write_bits(value, bits)
    }

    pub fn read_uint(&mut self, bits: u32) -> Result<u64, DecodeError> {
        self.read_bits(bits)
    }

    // =========================================================================
    // Variable-width integers
    // =========================================================================

    /// Sign bit, then the magnitude in 8, 14 or 31 bits behind a 1-2 bit tag.
    pub fn write_var_int(&mut self, value: i32) -> Result<(), EncodeError> {
        let (sign, magnitude) = split_sign(value as i64);
        self.write_bool(sign)?;
        if magnitude <= 0xFF {
            self.write_bits(0, 1)?;
            self.write_bits(magnitude, 8)
        } else if magnitude <= 0x3FFF {
            self.write_bits(0b10, 2)?;
            self.write_bits(magnitude, 14)
        } else {
            self.write_bits(0b11, 2)?;
            self.write_bits(magnitude, 31)
        }
    }

    pub fn read_var_int(&mut self) -> Result<i32, DecodeError> {
        let sign = self.read_bool()?;
        let magnitude = if !self.read_bool()? {
            self.read_bits(8)?
        } else if !self.read_bool()? {
            self.read_bits(14)?
        } else {
            self.read_bits(31)?
        };
        Ok(join_sign(sign, magnitude) as i32)
    }

    /// Sign bit, then 7-bit groups (least significant first), each followed
    /// by a continuation bit.
    pub fn write_var_long(&mut self, value: i64) -> Result<(), EncodeError> {
        let (sign, mut magnitude) = split_sign(value);
        self.write_bool(sign)?;
        loop {
            self.write_bits(magnitude & 0x7F, VARLONG_GROUP_BITS)?;
            magnitude >>= VARLONG_GROUP_BITS;
            self.write_bool(magnitude != 0)?;
            if magnitude == 0 {
                return Ok(());
            }
        }
    }

    pub fn read_var_long(&mut self) -> Result<i64, DecodeError> {
        let sign = self.read_bool()?;
        let mut magnitude = 0u64;
        let mut shift = 0u32;
        loop {
            if shift >= 64 {
                return Err(DecodeError::InvalidData(
                    "variable-length long runs past 64 bits".into(),
                ));
            }
            let group = self.read_bits(VARLONG_GROUP_BITS)?;
            magnitude |= group << shift;
            shift += VARLONG_GROUP_BITS;
            if !self.read_bool()? {
                return Ok(join_sign(sign, magnitude));
            }
        }
    }

    /// Unsigned value in 4, 10 or 32 bits behind a 1-2 bit tag.
    pub fn write_enum_int(&mut self, value: u32) -> Result<(), EncodeError> {
        let value = value as u64;
        if value <= 0xF {
            self.write_bits(0, 1)?;
            self.write_bits(value, 4)
        } else if value <= 0x3FF {
            self.write_bits(0b10, 2)?;
            self.write_bits(value, 10)
        } else {
            self.write_bits(0b11, 2)?;
            self.write_bits(value, 32)
        }
    }

    pub fn read_enum_int(&mut self) -> Result<u32, DecodeError> {
        let value = if !self.read_bool()? {
            self.read_bits(4)?
        } else if !self.read_bool()? {
            self.read_bits(10)?
        } else {
            self.read_bits(32)?
        };
        Ok(value as u32)
    }

    // =========================================================================
    // Floating point
    // =========================================================================

    /// The IEEE-754 pattern, least significant byte first.
    pub fn write_float(&mut self, value: f32) -> Result<(), EncodeError> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn read_float(&mut self) -> Result<f32, DecodeError> {
        let mut bytes = [0u8; 4];
        for b in &mut bytes {
            *b = self.read_byte()?;
        }
        Ok(f32::from_le_bytes(bytes))
    }

    pub fn write_double(&mut self, value: f64) -> Result<(), EncodeError> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn read_double(&mut self) -> Result<f64, DecodeError> {
        let mut bytes = [0u8; 8];
        for b in &mut bytes {
            *b = self.read_byte()?;
        }
        Ok(f64::from_le_bytes(bytes))
    }

    /// Quantize into one of seven magnitude bands, falling back to the
    /// lossless form outside `[0.0078125, 1023.99]`.
    pub fn write_lossy_float(&mut self, value: f32) -> Result<(), EncodeError> {
        let magnitude = value.abs();
        if value.is_nan() || !(LOSSY_FLOAT_MIN..=LOSSY_FLOAT_MAX).contains(&magnitude) {
            self.write_bits(LOSSLESS_FLOAT_SELECTOR as u64, FLOAT_SELECTOR_BITS)?;
            return self.write_float(value);
        }

        let band = band_for(magnitude);
        let code = ((magnitude * band.multiplier + 0.5) as u64).min(band.max_code());
        self.write_bits(band.selector as u64, FLOAT_SELECTOR_BITS)?;
        self.write_bits(code, band.bits)?;
        self.write_bool(value.is_sign_negative())
    }

    pub fn read_lossy_float(&mut self) -> Result<f32, DecodeError> {
        let selector = self.read_bits(FLOAT_SELECTOR_BITS)? as u8;
        let Some(band) = float_band(selector) else {
            return self.read_float();
        };
        let code = self.read_bits(band.bits)?;
        let magnitude = code as f32 / band.multiplier;
        Ok(if self.read_bool()? { -magnitude } else { magnitude })
    }

    // =========================================================================
    // Strings
    // =========================================================================

    pub fn write_string(&mut self, value: &str) -> Result<(), EncodeError> {
        string::write_string(&mut self.buffer, value)
    }

    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        string::read_string(&mut self.buffer)
    }
}

/// Split into a sign flag and an excess-encoded magnitude.
#[inline]
fn split_sign(value: i64) -> (bool, u64) {
    if value < 0 {
        (true, !value as u64)
    } else {
        (false, value as u64)
    }
}

#[inline]
fn join_sign(sign: bool, magnitude: u64) -> i64 {
    if sign {
        !(magnitude as i64)
    } else {
        magnitude as i64
    }
}
