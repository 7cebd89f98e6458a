//! Binary encoding of persisted class metadata.
//!
//! Layout, using the primitive and framing codecs:
//!
//! ```text
//! type name          string
//! member count       array length
//! per member:
//!   kind tag         2 bits (0 simple, 1 array, 2 dictionary)
//!   name             string
//!   id               16 bits
//!   details          simple: detail
//!                    array: element detail, is-list bit
//!                    dictionary: key detail, value detail
//! serialize null     1 bit
//! has type id        1 bit, then type id when set
//!
//! detail:
//!   scalar           1, width - 1 in 7 bits (all ones = variable),
//!                    numeric bit, kind code in 4 bits
//!   object           0, count in 8 bits, count type-name strings
//! ```
//!
//! Metadata is always read back as not live; the schema builder revives
//! what is still declared.

use crate::codec::FlexSerializer;
use crate::error::{DecodeError, EncodeError};

use super::types::{
    AssignableType, BitWidth, FlexClassInfo, FlexDetail, FlexMemberInfo, MemberKind, ObjectDetail,
    ScalarDetail, ScalarKind,
};

const KIND_TAG_BITS: u32 = 2;
const MEMBER_ID_BITS: u32 = 16;
const WIDTH_BITS: u32 = 7;
const VARIABLE_WIDTH: u64 = 0x7F;
const KIND_CODE_BITS: u32 = 4;
const OBJECT_COUNT_BITS: u32 = 8;
const MAX_OBJECT_TYPES: usize = 255;
const MAX_FIXED_WIDTH: u8 = 64;

/// Encode one class's metadata.
pub fn encode_class_info(info: &FlexClassInfo) -> Result<Vec<u8>, EncodeError> {
    let mut ser = FlexSerializer::new();
    ser.write_string(&info.type_name)?;
    ser.write_array_length(Some(info.members.len()))?;
    for member in &info.members {
        write_member(&mut ser, member)?;
    }
    ser.write_bool(info.serialize_null)?;
    match info.type_id {
        Some(id) => {
            ser.write_bool(true)?;
            ser.write_type_id(id)?;
        }
        None => ser.write_bool(false)?,
    }
    Ok(ser.into_bytes())
}

/// Decode metadata written by [`encode_class_info`].
pub fn decode_class_info(data: &[u8]) -> Result<FlexClassInfo, DecodeError> {
    let mut de = FlexSerializer::from_bytes(data);
    let type_name = de.read_string()?;
    let count = de
        .read_array_length()?
        .ok_or_else(|| DecodeError::InvalidData("null member list in metadata".into()))?;

    let mut members = Vec::with_capacity(count);
    for _ in 0..count {
        members.push(read_member(&mut de)?);
    }
    members.sort_by_key(|m| m.id);

    let serialize_null = de.read_bool()?;
    let type_id = if de.read_bool()? {
        Some(de.read_type_id()?)
    } else {
        None
    };

    Ok(FlexClassInfo {
        type_name,
        type_id,
        members,
        serialize_null,
        live: false,
    })
}

fn write_member(ser: &mut FlexSerializer, member: &FlexMemberInfo) -> Result<(), EncodeError> {
    ser.write_uint(member.kind.tag() as u64, KIND_TAG_BITS)?;
    ser.write_string(&member.name)?;
    ser.write_uint(member.id as u64, MEMBER_ID_BITS)?;
    match &member.kind {
        MemberKind::Simple(detail) => write_detail(ser, detail),
        MemberKind::Array { element, is_list } => {
            write_detail(ser, element)?;
            ser.write_bool(*is_list)
        }
        MemberKind::Dictionary { key, value } => {
            write_detail(ser, key)?;
            write_detail(ser, value)
        }
    }
}

fn read_member(de: &mut FlexSerializer) -> Result<FlexMemberInfo, DecodeError> {
    let tag = de.read_uint(KIND_TAG_BITS)?;
    let name = de.read_string()?;
    let id = de.read_uint(MEMBER_ID_BITS)? as u16;
    let kind = match tag {
        0 => MemberKind::Simple(read_detail(de)?),
        1 => {
            let element = read_detail(de)?;
            MemberKind::Array {
                element,
                is_list: de.read_bool()?,
            }
        }
        2 => {
            let key = read_detail(de)?;
            MemberKind::Dictionary {
                key,
                value: read_detail(de)?,
            }
        }
        other => {
            return Err(DecodeError::InvalidData(format!(
                "unknown member kind tag {} for '{}'",
                other, name
            )))
        }
    };
    Ok(FlexMemberInfo {
        name,
        id,
        live: false,
        kind,
    })
}

fn write_detail(ser: &mut FlexSerializer, detail: &FlexDetail) -> Result<(), EncodeError> {
    match detail {
        FlexDetail::Scalar(scalar) => {
            ser.write_bool(true)?;
            let width = match scalar.width {
                BitWidth::Fixed(bits) if (1..=MAX_FIXED_WIDTH).contains(&bits) => bits as u64 - 1,
                BitWidth::Fixed(bits) => {
                    return Err(EncodeError::OutOfRange {
                        what: "scalar width",
                        value: bits as i128,
                        min: 1,
                        max: MAX_FIXED_WIDTH as i128,
                    })
                }
                BitWidth::Variable => VARIABLE_WIDTH,
            };
            ser.write_uint(width, WIDTH_BITS)?;
            ser.write_bool(scalar.numeric)?;
            ser.write_uint(scalar.kind.code() as u64, KIND_CODE_BITS)
        }
        FlexDetail::Object(object) => {
            ser.write_bool(false)?;
            if object.types.len() > MAX_OBJECT_TYPES {
                return Err(EncodeError::OutOfRange {
                    what: "assignable type count",
                    value: object.types.len() as i128,
                    min: 0,
                    max: MAX_OBJECT_TYPES as i128,
                });
            }
            ser.write_uint(object.types.len() as u64, OBJECT_COUNT_BITS)?;
            for t in &object.types {
                ser.write_string(&t.name)?;
            }
            Ok(())
        }
    }
}

fn read_detail(de: &mut FlexSerializer) -> Result<FlexDetail, DecodeError> {
    if de.read_bool()? {
        let width = match de.read_uint(WIDTH_BITS)? {
            VARIABLE_WIDTH => BitWidth::Variable,
            w if w < MAX_FIXED_WIDTH as u64 => BitWidth::Fixed(w as u8 + 1),
            w => {
                return Err(DecodeError::InvalidData(format!(
                    "scalar width {} exceeds 64 bits",
                    w + 1
                )))
            }
        };
        let numeric = de.read_bool()?;
        let code = de.read_uint(KIND_CODE_BITS)? as u8;
        let kind = ScalarKind::from_code(code)
            .ok_or_else(|| DecodeError::InvalidData(format!("unknown scalar kind code {}", code)))?;
        Ok(FlexDetail::Scalar(ScalarDetail {
            kind,
            width,
            explicit: false,
            numeric,
        }))
    } else {
        let count = de.read_uint(OBJECT_COUNT_BITS)? as usize;
        let mut types = Vec::with_capacity(count);
        for _ in 0..count {
            types.push(AssignableType {
                name: de.read_string()?,
                live: false,
            });
        }
        Ok(FlexDetail::Object(ObjectDetail { types }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_width_marker() {
        let mut info = FlexClassInfo::new("Tag");
        info.members.push(
            FlexMemberInfo::new(
                "label",
                MemberKind::Simple(FlexDetail::Scalar(ScalarDetail::new(
                    ScalarKind::String,
                    BitWidth::Variable,
                ))),
            )
            .with_id(1),
        );
        let decoded = decode_class_info(&encode_class_info(&info).unwrap()).unwrap();
        let MemberKind::Simple(FlexDetail::Scalar(detail)) = &decoded.members[0].kind else {
            panic!("expected scalar member");
        };
        assert_eq!(detail.width, BitWidth::Variable);
        assert!(!detail.numeric);
        assert!(!decoded.live);
        assert_eq!(decoded.type_id, None);
    }

    #[test]
    fn test_width_zero_is_rejected() {
        let mut info = FlexClassInfo::new("Bad");
        info.members.push(FlexMemberInfo::new(
            "x",
            MemberKind::Simple(FlexDetail::Scalar(ScalarDetail::explicit(ScalarKind::Int, 0))),
        ));
        assert!(matches!(
            encode_class_info(&info),
            Err(EncodeError::OutOfRange { what: "scalar width", .. })
        ));
    }
}
