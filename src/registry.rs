//! Built schema and the serialize/deserialize entry points.
//!
//! A root value declared as a class is written as a bare object body. A
//! root declared as a union is prefixed by the concrete type id, since
//! union variant order is not persisted.
//!
//! Lists are written as a type map (the distinct concrete type ids), the
//! element count, then each element. With more than one type in the map
//! every element carries its 1-based type index into the map.

use std::collections::HashMap;

use once_cell::sync::OnceCell;

use crate::codec::{decoder, encoder, FlexSerializer};
use crate::derive_traits::FlexData;
use crate::error::{DecodeError, EncodeError, FlexError, Result};
use crate::schema::FlexClassInfo;
use crate::value::FlexValue;

/// Merged class metadata ready for encoding and decoding.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    classes: Vec<FlexClassInfo>,
    by_name: HashMap<String, usize>,
    by_type_id: HashMap<u16, usize>,
    unions: HashMap<String, Vec<String>>,
}

impl Schema {
    /// Assemble a schema from class metadata and union membership.
    pub fn new(classes: Vec<FlexClassInfo>, unions: HashMap<String, Vec<String>>) -> Self {
        let mut by_name = HashMap::with_capacity(classes.len());
        let mut by_type_id = HashMap::with_capacity(classes.len());
        for (i, info) in classes.iter().enumerate() {
            by_name.insert(info.type_name.clone(), i);
            if let Some(id) = info.type_id {
                by_type_id.insert(id, i);
            }
        }
        Schema {
            classes,
            by_name,
            by_type_id,
            unions,
        }
    }

    /// Class metadata by name, including stale classes.
    pub fn class(&self, name: &str) -> Option<&FlexClassInfo> {
        self.by_name.get(name).map(|&i| &self.classes[i])
    }

    pub fn class_by_type_id(&self, id: u16) -> Option<&FlexClassInfo> {
        self.by_type_id.get(&id).map(|&i| &self.classes[i])
    }

    pub fn classes(&self) -> impl Iterator<Item = &FlexClassInfo> {
        self.classes.iter()
    }

    /// Concrete classes assignable to a union.
    pub fn union_members(&self, name: &str) -> Option<&[String]> {
        self.unions.get(name).map(Vec::as_slice)
    }

    fn is_assignable(&self, declared: &str, concrete: &str) -> bool {
        match self.unions.get(declared) {
            Some(members) => members.iter().any(|m| m == concrete),
            None => declared == concrete,
        }
    }

    fn live_class(&self, name: &str) -> Option<&FlexClassInfo> {
        self.class(name).filter(|info| info.live)
    }

    // =========================================================================
    // Dynamic values
    // =========================================================================

    /// Encode an object value declared as `declared`.
    pub fn encode_value(
        &self,
        declared: &str,
        value: &FlexValue,
    ) -> std::result::Result<Vec<u8>, EncodeError> {
        let mut ser = FlexSerializer::new();
        self.write_root(&mut ser, declared, value)?;
        Ok(ser.into_bytes())
    }

    /// Decode a value written by [`Schema::encode_value`].
    pub fn decode_value(
        &self,
        declared: &str,
        data: &[u8],
    ) -> std::result::Result<FlexValue, DecodeError> {
        let mut de = FlexSerializer::from_bytes(data);
        self.read_root(&mut de, declared)
    }

    /// Encode object values sharing a declared type.
    pub fn encode_list(
        &self,
        declared: &str,
        values: &[FlexValue],
    ) -> std::result::Result<Vec<u8>, EncodeError> {
        let mut type_map: Vec<&FlexClassInfo> = Vec::new();
        let mut indexes = Vec::with_capacity(values.len());
        for value in values {
            let info = self.root_class(declared, value)?;
            let index = match type_map.iter().position(|t| t.type_name == info.type_name) {
                Some(index) => index,
                None => {
                    type_map.push(info);
                    type_map.len() - 1
                }
            };
            indexes.push(index);
        }

        let mut ser = FlexSerializer::new();
        ser.write_array_length(Some(type_map.len()))?;
        for info in &type_map {
            ser.write_type_id(type_id_of(info)?)?;
        }
        ser.write_array_length(Some(values.len()))?;
        for (value, &index) in values.iter().zip(&indexes) {
            if type_map.len() > 1 {
                ser.write_type_index(index as u16 + 1)?;
            }
            encoder::write_object(&mut ser, self, type_map[index], value)?;
        }
        Ok(ser.into_bytes())
    }

    /// Decode values written by [`Schema::encode_list`].
    pub fn decode_list(
        &self,
        declared: &str,
        data: &[u8],
    ) -> std::result::Result<Vec<FlexValue>, DecodeError> {
        let mut de = FlexSerializer::from_bytes(data);
        let map_len = de
            .read_array_length()?
            .ok_or_else(|| DecodeError::InvalidData("null type map".into()))?;
        let mut type_map = Vec::with_capacity(map_len);
        for _ in 0..map_len {
            let id = de.read_type_id()?;
            let info = self.class_by_type_id(id).ok_or(DecodeError::UnknownTypeId(id))?;
            if !self.is_assignable(declared, &info.type_name) {
                return Err(not_assignable(declared, &info.type_name));
            }
            type_map.push(info);
        }

        let count = de
            .read_array_length()?
            .ok_or_else(|| DecodeError::InvalidData("null element count".into()))?;
        let mut values = Vec::with_capacity(count.min(de.remaining_bits()));
        for _ in 0..count {
            let info = if type_map.len() > 1 {
                let index = de.read_type_index()?;
                (index as usize)
                    .checked_sub(1)
                    .and_then(|i| type_map.get(i))
                    .ok_or(DecodeError::TypeIndexOutOfRange {
                        member: declared.to_string(),
                        index,
                        count: type_map.len(),
                    })?
            } else {
                type_map
                    .first()
                    .ok_or_else(|| DecodeError::InvalidData("elements without a type map".into()))?
            };
            values.push(decoder::read_object(&mut de, self, info)?);
        }
        Ok(values)
    }

    fn root_class(
        &self,
        declared: &str,
        value: &FlexValue,
    ) -> std::result::Result<&FlexClassInfo, EncodeError> {
        let concrete = value.object_type().ok_or_else(|| EncodeError::TypeMismatch {
            member: declared.to_string(),
            expected: "object".into(),
            actual: value.kind_name().to_string(),
        })?;
        if !self.is_assignable(declared, concrete) {
            return Err(EncodeError::NotAssignable {
                member: declared.to_string(),
                type_name: concrete.to_string(),
            });
        }
        self.live_class(concrete)
            .ok_or_else(|| EncodeError::UnknownType(concrete.to_string()))
    }

    fn write_root(
        &self,
        ser: &mut FlexSerializer,
        declared: &str,
        value: &FlexValue,
    ) -> std::result::Result<(), EncodeError> {
        let info = self.root_class(declared, value)?;
        if self.unions.contains_key(declared) {
            ser.write_type_id(type_id_of(info)?)?;
        }
        encoder::write_object(ser, self, info, value)
    }

    fn read_root(
        &self,
        de: &mut FlexSerializer,
        declared: &str,
    ) -> std::result::Result<FlexValue, DecodeError> {
        let info = if self.unions.contains_key(declared) {
            let id = de.read_type_id()?;
            let info = self.class_by_type_id(id).ok_or(DecodeError::UnknownTypeId(id))?;
            if !self.is_assignable(declared, &info.type_name) {
                return Err(not_assignable(declared, &info.type_name));
            }
            info
        } else {
            self.class(declared)
                .ok_or_else(|| DecodeError::UnknownType(declared.to_string()))?
        };
        decoder::read_object(de, self, info)
    }

    // =========================================================================
    // Typed values
    // =========================================================================

    pub fn serialize<T: FlexData>(&self, item: &T) -> Result<Vec<u8>> {
        Ok(self.encode_value(T::NAME, &item.to_flex_value())?)
    }

    pub fn deserialize<T: FlexData>(&self, data: &[u8]) -> Result<T> {
        let value = self.decode_value(T::NAME, data)?;
        Ok(T::from_flex_value(value)?)
    }

    pub fn serialize_list<T: FlexData>(&self, items: &[T]) -> Result<Vec<u8>> {
        let values: Vec<FlexValue> = items.iter().map(|item| item.to_flex_value()).collect();
        Ok(self.encode_list(T::NAME, &values)?)
    }

    pub fn deserialize_list<T: FlexData>(&self, data: &[u8]) -> Result<Vec<T>> {
        self.decode_list(T::NAME, data)?
            .into_iter()
            .map(|value| T::from_flex_value(value).map_err(FlexError::from))
            .collect()
    }
}

fn type_id_of(info: &FlexClassInfo) -> std::result::Result<u16, EncodeError> {
    info.type_id
        .ok_or_else(|| EncodeError::UnknownType(info.type_name.clone()))
}

fn not_assignable(declared: &str, concrete: &str) -> DecodeError {
    DecodeError::TypeMismatch {
        member: declared.to_string(),
        expected: declared.to_string(),
        actual: concrete.to_string(),
    }
}

// =============================================================================
// Process-wide schema
// =============================================================================

static GLOBAL: OnceCell<Schema> = OnceCell::new();

/// Install the process-wide schema. Succeeds once.
pub fn init(schema: Schema) -> Result<&'static Schema> {
    GLOBAL
        .set(schema)
        .map_err(|_| FlexError::AlreadyInitialized)?;
    global()
}

/// The process-wide schema.
pub fn global() -> Result<&'static Schema> {
    GLOBAL.get().ok_or(FlexError::NotInitialized)
}

/// Serialize with the process-wide schema.
pub fn serialize<T: FlexData>(item: &T) -> Result<Vec<u8>> {
    global()?.serialize(item)
}

/// Deserialize with the process-wide schema.
pub fn deserialize<T: FlexData>(data: &[u8]) -> Result<T> {
    global()?.deserialize(data)
}

pub fn serialize_list<T: FlexData>(items: &[T]) -> Result<Vec<u8>> {
    global()?.serialize_list(items)
}

pub fn deserialize_list<T: FlexData>(data: &[u8]) -> Result<Vec<T>> {
    global()?.deserialize_list(data)
}
