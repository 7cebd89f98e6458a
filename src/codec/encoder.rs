use crate::error::EncodeError;
use crate::registry::Schema;
use crate::schema::{FlexClassInfo, FlexDetail, MemberKind, ScalarDetail, ScalarKind};
use crate::value::FlexValue;

use super::flex_serializer::FlexSerializer;
use super::wire::{END_STRUCTURE_ID, MAX_OBJECT_DEPTH, NULL_TYPE_INDEX};

/// Encode an object value as a bare object body of `info`.
pub fn encode(
    schema: &Schema,
    info: &FlexClassInfo,
    value: &FlexValue,
) -> Result<Vec<u8>, EncodeError> {
    let mut ser = FlexSerializer::new();
    write_object(&mut ser, schema, info, value)?;
    Ok(ser.into_bytes())
}

/// Write the live members of `value` followed by the end marker.
///
/// Values nested deeper than [`MAX_OBJECT_DEPTH`] fail with
/// [`EncodeError::TooDeep`].
pub fn write_object(
    ser: &mut FlexSerializer,
    schema: &Schema,
    info: &FlexClassInfo,
    value: &FlexValue,
) -> Result<(), EncodeError> {
    write_body(ser, schema, info, value, 1)
}

fn write_body(
    ser: &mut FlexSerializer,
    schema: &Schema,
    info: &FlexClassInfo,
    value: &FlexValue,
    depth: usize,
) -> Result<(), EncodeError> {
    if depth > MAX_OBJECT_DEPTH {
        return Err(EncodeError::TooDeep {
            limit: MAX_OBJECT_DEPTH,
        });
    }

    let fields = match value {
        FlexValue::Object { type_name, fields } if *type_name == info.type_name => fields,
        other => {
            return Err(EncodeError::TypeMismatch {
                member: info.type_name.clone(),
                expected: info.type_name.clone(),
                actual: other.object_type().unwrap_or(other.kind_name()).to_string(),
            })
        }
    };

    for member in info.live_members() {
        let value = fields.get(&member.name).unwrap_or(&FlexValue::Null);
        let name = member.name.as_str();

        if value.is_null() {
            let nullable = !matches!(member.kind, MemberKind::Simple(FlexDetail::Scalar(_)));
            if info.serialize_null && nullable {
                ser.write_member_id(member.id)?;
                match member.kind {
                    MemberKind::Simple(_) => ser.write_type_index(NULL_TYPE_INDEX)?,
                    _ => ser.write_array_length(None)?,
                }
            }
            continue;
        }

        match &member.kind {
            MemberKind::Simple(detail) => {
                if matches!(detail, FlexDetail::Scalar(_)) && value.is_default_scalar() {
                    continue;
                }
                ser.write_member_id(member.id)?;
                write_detail(ser, schema, name, detail, value, depth)?;
            }
            MemberKind::Array { element, .. } => {
                let FlexValue::Array(items) = value else {
                    return Err(mismatch(name, "array", value));
                };
                ser.write_member_id(member.id)?;
                ser.write_array_length(Some(items.len()))?;
                for item in items {
                    write_element(ser, schema, name, element, item, depth)?;
                }
            }
            MemberKind::Dictionary { key, value: value_detail } => {
                let FlexValue::Map(entries) = value else {
                    return Err(mismatch(name, "map", value));
                };
                ser.write_member_id(member.id)?;
                ser.write_array_length(Some(entries.len()))?;
                for (k, v) in entries {
                    write_element(ser, schema, name, key, k, depth)?;
                    write_element(ser, schema, name, value_detail, v, depth)?;
                }
            }
        }
    }

    ser.write_member_id(END_STRUCTURE_ID)
}

/// Write a collection element; object elements may be null.
fn write_element(
    ser: &mut FlexSerializer,
    schema: &Schema,
    member: &str,
    detail: &FlexDetail,
    value: &FlexValue,
    depth: usize,
) -> Result<(), EncodeError> {
    match (detail, value) {
        (FlexDetail::Object(_), FlexValue::Null) => ser.write_type_index(NULL_TYPE_INDEX),
        (FlexDetail::Scalar(_), FlexValue::Null) => {
            Err(EncodeError::UnexpectedNull(member.to_string()))
        }
        _ => write_detail(ser, schema, member, detail, value, depth),
    }
}

fn write_detail(
    ser: &mut FlexSerializer,
    schema: &Schema,
    member: &str,
    detail: &FlexDetail,
    value: &FlexValue,
    depth: usize,
) -> Result<(), EncodeError> {
    match detail {
        FlexDetail::Scalar(scalar) => write_scalar(ser, member, scalar, value),
        FlexDetail::Object(object) => {
            let type_name = value
                .object_type()
                .ok_or_else(|| mismatch(member, "object", value))?;
            let index = object.index_of(type_name).ok_or_else(|| EncodeError::NotAssignable {
                member: member.to_string(),
                type_name: type_name.to_string(),
            })?;
            let info = schema
                .class(type_name)
                .ok_or_else(|| EncodeError::UnknownType(type_name.to_string()))?;
            ser.write_type_index(index)?;
            write_body(ser, schema, info, value, depth + 1)
        }
    }
}

fn write_scalar(
    ser: &mut FlexSerializer,
    member: &str,
    detail: &ScalarDetail,
    value: &FlexValue,
) -> Result<(), EncodeError> {
    let expected = detail.kind.name();
    match detail.kind {
        ScalarKind::Bool => {
            let v = value.as_bool().ok_or_else(|| mismatch(member, expected, value))?;
            ser.write_bool(v)
        }
        ScalarKind::Byte => {
            let v = unsigned(member, value, 8)?;
            ser.write_byte(v as u8)
        }
        ScalarKind::Int => {
            let bits = detail.bits();
            let v = value.as_i64().ok_or_else(|| mismatch(member, expected, value))?;
            check_signed(v, bits)?;
            ser.write_int(v, bits)
        }
        ScalarKind::UInt => {
            let bits = detail.bits();
            let v = unsigned(member, value, bits)?;
            ser.write_uint(v, bits)
        }
        ScalarKind::VarInt => {
            let v = value.as_i64().ok_or_else(|| mismatch(member, expected, value))?;
            check_signed(v, 32)?;
            ser.write_var_int(v as i32)
        }
        ScalarKind::VarLong => {
            let v = value.as_i64().ok_or_else(|| mismatch(member, expected, value))?;
            ser.write_var_long(v)
        }
        ScalarKind::EnumInt => {
            let v = unsigned(member, value, 32)?;
            ser.write_enum_int(v as u32)
        }
        ScalarKind::Float => {
            let v = value.as_f32().ok_or_else(|| mismatch(member, expected, value))?;
            ser.write_float(v)
        }
        ScalarKind::LossyFloat => {
            let v = value.as_f32().ok_or_else(|| mismatch(member, expected, value))?;
            ser.write_lossy_float(v)
        }
        ScalarKind::Double => {
            let v = value.as_f64().ok_or_else(|| mismatch(member, expected, value))?;
            ser.write_double(v)
        }
        ScalarKind::String => {
            let v = value.as_str().ok_or_else(|| mismatch(member, expected, value))?;
            ser.write_string(v)
        }
    }
}

fn unsigned(member: &str, value: &FlexValue, bits: u32) -> Result<u64, EncodeError> {
    let v = value
        .as_u64()
        .ok_or_else(|| mismatch(member, "unsigned integer", value))?;
    let max = if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 };
    if v > max {
        return Err(EncodeError::OutOfRange {
            what: "unsigned value",
            value: v as i128,
            min: 0,
            max: max as i128,
        });
    }
    Ok(v)
}

fn check_signed(value: i64, bits: u32) -> Result<(), EncodeError> {
    if bits >= 64 {
        return Ok(());
    }
    let max = (1i64 << (bits.max(1) - 1)) - 1;
    let min = -max - 1;
    if value < min || value > max {
        return Err(EncodeError::OutOfRange {
            what: "signed value",
            value: value as i128,
            min: min as i128,
            max: max as i128,
        });
    }
    Ok(())
}

fn mismatch(member: &str, expected: &str, value: &FlexValue) -> EncodeError {
    EncodeError::TypeMismatch {
        member: member.to_string(),
        expected: expected.to_string(),
        actual: value.kind_name().to_string(),
    }
}
