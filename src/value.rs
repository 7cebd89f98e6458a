use std::collections::HashMap;
use std::fmt;

use crate::error::DecodeError;

/// Dynamic value exchanged between typed Rust values and the bit codec.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlexValue {
    /// Absent object, array or dictionary.
    #[default]
    Null,
    Bool(bool),
    /// Any signed integer encoding.
    Int(i64),
    /// Any unsigned integer encoding, including bytes and enum ints.
    UInt(u64),
    Float(f32),
    Double(f64),
    Str(String),
    Array(Vec<FlexValue>),
    /// Dictionary entries in iteration order.
    Map(Vec<(FlexValue, FlexValue)>),
    /// An instance of a concrete class.
    Object {
        type_name: String,
        fields: HashMap<String, FlexValue>,
    },
}

impl FlexValue {
    /// Build an object value from name/value pairs.
    pub fn object(type_name: &str, fields: Vec<(&str, FlexValue)>) -> Self {
        FlexValue::Object {
            type_name: type_name.to_string(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FlexValue::Null)
    }

    /// True for scalars holding their type's default, which are not written.
    pub fn is_default_scalar(&self) -> bool {
        match self {
            FlexValue::Bool(v) => !*v,
            FlexValue::Int(v) => *v == 0,
            FlexValue::UInt(v) => *v == 0,
            FlexValue::Float(v) => v.to_bits() == 0,
            FlexValue::Double(v) => v.to_bits() == 0,
            FlexValue::Str(v) => v.is_empty(),
            _ => false,
        }
    }

    /// Get a field of an object value.
    pub fn get(&self, key: &str) -> Option<&FlexValue> {
        match self {
            FlexValue::Object { fields, .. } => fields.get(key),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlexValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FlexValue::Int(v) => Some(*v),
            FlexValue::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FlexValue::UInt(v) => Some(*v),
            FlexValue::Int(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            FlexValue::Float(v) => Some(*v),
            FlexValue::Double(v) => Some(*v as f32),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FlexValue::Double(v) => Some(*v),
            FlexValue::Float(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlexValue::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FlexValue]> {
        match self {
            FlexValue::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Concrete type name of an object value.
    pub fn object_type(&self) -> Option<&str> {
        match self {
            FlexValue::Object { type_name, .. } => Some(type_name),
            _ => None,
        }
    }

    /// Take the fields of an object, checking its concrete type.
    pub fn into_fields(self, expected: &str) -> Result<HashMap<String, FlexValue>, DecodeError> {
        match self {
            FlexValue::Object { type_name, fields } if type_name == expected => Ok(fields),
            FlexValue::Object { type_name, .. } => Err(DecodeError::TypeMismatch {
                member: expected.to_string(),
                expected: expected.to_string(),
                actual: type_name,
            }),
            other => Err(other.mismatch(expected)),
        }
    }

    /// Build the error reported when this value does not fit `expected`.
    pub fn mismatch(&self, expected: &str) -> DecodeError {
        DecodeError::TypeMismatch {
            member: expected.to_string(),
            expected: expected.to_string(),
            actual: self.kind_name().to_string(),
        }
    }

    /// Returns a short kind description string.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FlexValue::Null => "null",
            FlexValue::Bool(_) => "bool",
            FlexValue::Int(_) => "int",
            FlexValue::UInt(_) => "uint",
            FlexValue::Float(_) => "float",
            FlexValue::Double(_) => "double",
            FlexValue::Str(_) => "string",
            FlexValue::Array(_) => "array",
            FlexValue::Map(_) => "map",
            FlexValue::Object { .. } => "object",
        }
    }
}

impl PartialEq for FlexValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FlexValue::Null, FlexValue::Null) => true,
            (FlexValue::Bool(a), FlexValue::Bool(b)) => a == b,
            (FlexValue::Int(a), FlexValue::Int(b)) => a == b,
            (FlexValue::UInt(a), FlexValue::UInt(b)) => a == b,
            (FlexValue::Float(a), FlexValue::Float(b)) => a.to_bits() == b.to_bits(),
            (FlexValue::Double(a), FlexValue::Double(b)) => a.to_bits() == b.to_bits(),
            (FlexValue::Str(a), FlexValue::Str(b)) => a == b,
            (FlexValue::Array(a), FlexValue::Array(b)) => a == b,
            (FlexValue::Map(a), FlexValue::Map(b)) => a == b,
            (
                FlexValue::Object {
                    type_name: ta,
                    fields: fa,
                },
                FlexValue::Object {
                    type_name: tb,
                    fields: fb,
                },
            ) => ta == tb && fa == fb,
            _ => false,
        }
    }
}

impl Eq for FlexValue {}

impl fmt::Display for FlexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlexValue::Null => write!(f, "null"),
            FlexValue::Bool(v) => write!(f, "{}", v),
            FlexValue::Int(v) => write!(f, "{}", v),
            FlexValue::UInt(v) => write!(f, "{}", v),
            FlexValue::Float(v) => write!(f, "{}", v),
            FlexValue::Double(v) => write!(f, "{}", v),
            FlexValue::Str(v) => write!(f, "\"{}\"", v),
            FlexValue::Array(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            FlexValue::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            FlexValue::Object { type_name, fields } => {
                write!(f, "{} {{ ", type_name)?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, " }}")
            }
        }
    }
}

impl From<bool> for FlexValue {
    fn from(v: bool) -> Self {
        FlexValue::Bool(v)
    }
}

impl From<i32> for FlexValue {
    fn from(v: i32) -> Self {
        FlexValue::Int(v as i64)
    }
}

impl From<i64> for FlexValue {
    fn from(v: i64) -> Self {
        FlexValue::Int(v)
    }
}

impl From<u32> for FlexValue {
    fn from(v: u32) -> Self {
        FlexValue::UInt(v as u64)
    }
}

impl From<u64> for FlexValue {
    fn from(v: u64) -> Self {
        FlexValue::UInt(v)
    }
}

impl From<f32> for FlexValue {
    fn from(v: f32) -> Self {
        FlexValue::Float(v)
    }
}

impl From<f64> for FlexValue {
    fn from(v: f64) -> Self {
        FlexValue::Double(v)
    }
}

impl From<&str> for FlexValue {
    fn from(v: &str) -> Self {
        FlexValue::Str(v.to_string())
    }
}

impl From<String> for FlexValue {
    fn from(v: String) -> Self {
        FlexValue::Str(v)
    }
}

impl From<Vec<FlexValue>> for FlexValue {
    fn from(v: Vec<FlexValue>) -> Self {
        FlexValue::Array(v)
    }
}
