use std::collections::HashMap;

use tracing::trace;

use crate::error::DecodeError;
use crate::registry::Schema;
use crate::schema::{
    FlexClassInfo, FlexDetail, FlexMemberInfo, MemberKind, ScalarDetail, ScalarKind,
};
use crate::value::FlexValue;

use super::flex_serializer::FlexSerializer;
use super::wire::{END_STRUCTURE_ID, MAX_OBJECT_DEPTH, NULL_TYPE_INDEX};

/// Decode a bare object body of `info`.
pub fn decode(
    schema: &Schema,
    info: &FlexClassInfo,
    data: &[u8],
) -> Result<FlexValue, DecodeError> {
    let mut de = FlexSerializer::from_bytes(data);
    read_object(&mut de, schema, info)
}

/// Read members until the end marker.
///
/// Dead members are read with their persisted detail and dropped. Members
/// absent from the stream are absent from the result. Bodies nested deeper
/// than [`MAX_OBJECT_DEPTH`] fail with [`DecodeError::TooDeep`].
pub fn read_object(
    de: &mut FlexSerializer,
    schema: &Schema,
    info: &FlexClassInfo,
) -> Result<FlexValue, DecodeError> {
    read_body(de, schema, info, 1)
}

fn read_body(
    de: &mut FlexSerializer,
    schema: &Schema,
    info: &FlexClassInfo,
    depth: usize,
) -> Result<FlexValue, DecodeError> {
    if depth > MAX_OBJECT_DEPTH {
        return Err(DecodeError::TooDeep {
            limit: MAX_OBJECT_DEPTH,
        });
    }

    let mut fields = HashMap::new();
    loop {
        let id = de.read_member_id()?;
        if id == END_STRUCTURE_ID {
            break;
        }
        let member = info.member_by_id(id).ok_or_else(|| DecodeError::UnknownMember {
            type_name: info.type_name.clone(),
            id,
        })?;
        let value = read_member(de, schema, member, depth)?;
        if member.live {
            fields.insert(member.name.clone(), value);
        } else {
            trace!(type_name = %info.type_name, member = %member.name, "skipped dead member");
        }
    }
    Ok(FlexValue::Object {
        type_name: info.type_name.clone(),
        fields,
    })
}

fn read_member(
    de: &mut FlexSerializer,
    schema: &Schema,
    member: &FlexMemberInfo,
    depth: usize,
) -> Result<FlexValue, DecodeError> {
    let name = member.name.as_str();
    match &member.kind {
        MemberKind::Simple(detail) => read_detail(de, schema, name, detail, depth),
        MemberKind::Array { element, .. } => {
            let Some(len) = de.read_array_length()? else {
                return Ok(FlexValue::Null);
            };
            let mut items = Vec::with_capacity(len.min(de.remaining_bits()));
            for _ in 0..len {
                items.push(read_detail(de, schema, name, element, depth)?);
            }
            Ok(FlexValue::Array(items))
        }
        MemberKind::Dictionary { key, value } => {
            let Some(len) = de.read_array_length()? else {
                return Ok(FlexValue::Null);
            };
            let mut entries = Vec::with_capacity(len.min(de.remaining_bits()));
            for _ in 0..len {
                let k = read_detail(de, schema, name, key, depth)?;
                let v = read_detail(de, schema, name, value, depth)?;
                entries.push((k, v));
            }
            Ok(FlexValue::Map(entries))
        }
    }
}

fn read_detail(
    de: &mut FlexSerializer,
    schema: &Schema,
    member: &str,
    detail: &FlexDetail,
    depth: usize,
) -> Result<FlexValue, DecodeError> {
    match detail {
        FlexDetail::Scalar(scalar) => read_scalar(de, scalar),
        FlexDetail::Object(object) => {
            let index = de.read_type_index()?;
            if index == NULL_TYPE_INDEX {
                return Ok(FlexValue::Null);
            }
            let entry = object
                .type_at(index)
                .ok_or_else(|| DecodeError::TypeIndexOutOfRange {
                    member: member.to_string(),
                    index,
                    count: object.types.len(),
                })?;
            let info = schema
                .class(&entry.name)
                .ok_or_else(|| DecodeError::UnknownType(entry.name.clone()))?;
            let value = read_body(de, schema, info, depth + 1)?;
            if entry.live {
                Ok(value)
            } else {
                trace!(member, type_name = %entry.name, "dropped value of unassignable type");
                Ok(FlexValue::Null)
            }
        }
    }
}

fn read_scalar(de: &mut FlexSerializer, detail: &ScalarDetail) -> Result<FlexValue, DecodeError> {
    Ok(match detail.kind {
        ScalarKind::Bool => FlexValue::Bool(de.read_bool()?),
        ScalarKind::Byte => FlexValue::UInt(de.read_byte()? as u64),
        ScalarKind::Int => FlexValue::Int(de.read_int(detail.bits())?),
        ScalarKind::UInt => FlexValue::UInt(de.read_uint(detail.bits())?),
        ScalarKind::VarInt => FlexValue::Int(de.read_var_int()? as i64),
        ScalarKind::VarLong => FlexValue::Int(de.read_var_long()?),
        ScalarKind::EnumInt => FlexValue::UInt(de.read_enum_int()? as u64),
        ScalarKind::Float => FlexValue::Float(de.read_float()?),
        ScalarKind::LossyFloat => FlexValue::Float(de.read_lossy_float()?),
        ScalarKind::Double => FlexValue::Double(de.read_double()?),
        ScalarKind::String => FlexValue::Str(de.read_string()?),
    })
}
