//! Object framing: member ids, type ids, array lengths and type indexes.

use std::ops::{Deref, DerefMut};

use super::bit_serializer::BitSerializer;
use super::wire::{
    MAX_ARRAY_LENGTH, MAX_MEMBER_ID, MAX_TYPE_ID, MAX_TYPE_INDEX, SHORT_MEMBER_ID_MAX,
    SHORT_TYPE_ID_MAX, SHORT_TYPE_INDEX_MAX,
};
use crate::error::{DecodeError, EncodeError};

/// A [`BitSerializer`] with the framing primitives objects are built from.
#[derive(Debug, Clone, Default)]
pub struct FlexSerializer {
    inner: BitSerializer,
}

impl Deref for FlexSerializer {
    type Target = BitSerializer;

    fn deref(&self) -> &BitSerializer {
        &self.inner
    }
}

impl DerefMut for FlexSerializer {
    fn deref_mut(&mut self) -> &mut BitSerializer {
        &mut self.inner
    }
}

fn check_range(what: &'static str, value: usize, max: usize) -> Result<(), EncodeError> {
    if value > max {
        return Err(EncodeError::OutOfRange {
            what,
            value: value as i128,
            min: 0,
            max: max as i128,
        });
    }
    Ok(())
}

impl FlexSerializer {
    pub fn new() -> Self {
        FlexSerializer {
            inner: BitSerializer::new(),
        }
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        FlexSerializer {
            inner: BitSerializer::from_bytes(bytes),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.inner.into_bytes()
    }

    /// Flag bit, then 5 bits for ids up to 31 or 9 bits up to 511.
    /// Id 0 terminates an object.
    pub fn write_member_id(&mut self, id: u16) -> Result<(), EncodeError> {
        check_range("member id", id as usize, MAX_MEMBER_ID as usize)?;
        self.write_short_or_long(id as u64, id > SHORT_MEMBER_ID_MAX, 5, 9)
    }

    pub fn read_member_id(&mut self) -> Result<u16, DecodeError> {
        Ok(self.read_short_or_long(5, 9)? as u16)
    }

    /// Flag bit, then 7 bits for ids up to 127 or 15 bits up to 32767.
    pub fn write_type_id(&mut self, id: u16) -> Result<(), EncodeError> {
        check_range("type id", id as usize, MAX_TYPE_ID as usize)?;
        self.write_short_or_long(id as u64, id > SHORT_TYPE_ID_MAX, 7, 15)
    }

    pub fn read_type_id(&mut self) -> Result<u16, DecodeError> {
        Ok(self.read_short_or_long(7, 15)? as u16)
    }

    /// 1-based index into a member's assignable types; 0 is null.
    pub fn write_type_index(&mut self, index: u16) -> Result<(), EncodeError> {
        check_range("type index", index as usize, MAX_TYPE_INDEX as usize)?;
        self.write_short_or_long(index as u64, index > SHORT_TYPE_INDEX_MAX, 3, 7)
    }

    pub fn read_type_index(&mut self) -> Result<u16, DecodeError> {
        Ok(self.read_short_or_long(3, 7)? as u16)
    }

    /// Array length, or `None` for a null array.
    ///
    /// Lengths use `0`+4 bits, `10`+8 bits or `11`+20 bits. Null is the
    /// 8-bit form holding 0, which the writer never produces for a real
    /// length since 0 always takes the 4-bit form.
    pub fn write_array_length(&mut self, len: Option<usize>) -> Result<(), EncodeError> {
        let Some(len) = len else {
            self.write_bits(0b10, 2)?;
            return self.write_bits(0, 8);
        };
        check_range("array length", len, MAX_ARRAY_LENGTH)?;
        if len <= 0xF {
            self.write_bits(0, 1)?;
            self.write_bits(len as u64, 4)
        } else if len <= 0xFF {
            self.write_bits(0b10, 2)?;
            self.write_bits(len as u64, 8)
        } else {
            self.write_bits(0b11, 2)?;
            self.write_bits(len as u64, 20)
        }
    }

    pub fn read_array_length(&mut self) -> Result<Option<usize>, DecodeError> {
        if !self.read_bool()? {
            return Ok(Some(self.read_bits(4)? as usize));
        }
        if !self.read_bool()? {
            let len = self.read_bits(8)? as usize;
            return Ok(if len == 0 { None } else { Some(len) });
        }
        Ok(Some(self.read_bits(20)? as usize))
    }

    fn write_short_or_long(
        &mut self,
        value: u64,
        long: bool,
        short_bits: u32,
        long_bits: u32,
    ) -> Result<(), EncodeError> {
        self.write_bool(long)?;
        self.write_bits(value, if long { long_bits } else { short_bits })
    }

    fn read_short_or_long(&mut self, short_bits: u32, long_bits: u32) -> Result<u64, DecodeError> {
        let long = self.read_bool()?;
        self.read_bits(if long { long_bits } else { short_bits })
    }
}
