//! Traits connecting Rust types to the schema and the bit codec.
//!
//! `#[derive(FlexData)]` from the `flexbit-derive` crate implements both
//! traits for structs and enums; this module covers the primitive and
//! collection types members are built from.
//!
//! # Example
//!
//! ```rust,ignore
//! use flexbit::FlexData;
//!
//! #[derive(FlexData)]
//! struct Player {
//!     name: String,
//!     #[flex(range(min = 0, max = 100))]
//!     health: i32,
//!     #[flex(lossy)]
//!     speed: f32,
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::error::DecodeError;
use crate::schema::{MemberType, ScalarKind, TypeDescriptor, TypeScope};
use crate::value::FlexValue;

/// A type that can appear as a member value.
pub trait FlexField: Sized {
    /// Declared type used to derive the member's wire detail.
    fn member_type() -> MemberType;

    fn to_flex_value(&self) -> FlexValue;

    fn from_flex_value(value: FlexValue) -> Result<Self, DecodeError>;

    /// Value to use when the member is absent from a stream, or `None` if
    /// the member is required. Scalars equal to their default are never
    /// written, so every scalar provides one.
    fn missing_value() -> Option<Self> {
        None
    }

    /// Add the descriptors of this type and everything it references.
    fn register(_scope: &mut TypeScope) {}
}

/// A class or union with its own descriptor.
pub trait FlexData: FlexField {
    /// Registered type name.
    const NAME: &'static str;

    fn descriptor() -> TypeDescriptor;

    /// Whether a decoded object of class `type_name` can become `Self`.
    /// Unions accept the classes of every variant.
    fn accepts(type_name: &str) -> bool {
        type_name == Self::NAME
    }
}

impl FlexField for bool {
    fn member_type() -> MemberType {
        MemberType::scalar(ScalarKind::Bool, 1)
    }

    fn to_flex_value(&self) -> FlexValue {
        FlexValue::Bool(*self)
    }

    fn from_flex_value(value: FlexValue) -> Result<Self, DecodeError> {
        value.as_bool().ok_or_else(|| value.mismatch("bool"))
    }

    fn missing_value() -> Option<Self> {
        Some(false)
    }
}

macro_rules! impl_signed_field {
    ($($ty:ty => $bits:expr),* $(,)?) => {$(
        impl FlexField for $ty {
            fn member_type() -> MemberType {
                MemberType::scalar(ScalarKind::Int, $bits)
            }

            fn to_flex_value(&self) -> FlexValue {
                FlexValue::Int(*self as i64)
            }

            fn from_flex_value(value: FlexValue) -> Result<Self, DecodeError> {
                value
                    .as_i64()
                    .and_then(|v| <$ty>::try_from(v).ok())
                    .ok_or_else(|| value.mismatch(stringify!($ty)))
            }

            fn missing_value() -> Option<Self> {
                Some(0)
            }
        }
    )*};
}

macro_rules! impl_unsigned_field {
    ($($ty:ty => $kind:ident, $bits:expr),* $(,)?) => {$(
        impl FlexField for $ty {
            fn member_type() -> MemberType {
                MemberType::scalar(ScalarKind::$kind, $bits)
            }

            fn to_flex_value(&self) -> FlexValue {
                FlexValue::UInt(*self as u64)
            }

            fn from_flex_value(value: FlexValue) -> Result<Self, DecodeError> {
                value
                    .as_u64()
                    .and_then(|v| <$ty>::try_from(v).ok())
                    .ok_or_else(|| value.mismatch(stringify!($ty)))
            }

            fn missing_value() -> Option<Self> {
                Some(0)
            }
        }
    )*};
}

impl_signed_field!(i8 => 8, i16 => 16, i32 => 32, i64 => 64);
impl_unsigned_field!(u8 => Byte, 8, u16 => UInt, 16, u32 => UInt, 32, u64 => UInt, 64);

impl FlexField for f32 {
    fn member_type() -> MemberType {
        MemberType::scalar(ScalarKind::Float, 32)
    }

    fn to_flex_value(&self) -> FlexValue {
        FlexValue::Float(*self)
    }

    fn from_flex_value(value: FlexValue) -> Result<Self, DecodeError> {
        value.as_f32().ok_or_else(|| value.mismatch("f32"))
    }

    fn missing_value() -> Option<Self> {
        Some(0.0)
    }
}

impl FlexField for f64 {
    fn member_type() -> MemberType {
        MemberType::scalar(ScalarKind::Double, 64)
    }

    fn to_flex_value(&self) -> FlexValue {
        FlexValue::Double(*self)
    }

    fn from_flex_value(value: FlexValue) -> Result<Self, DecodeError> {
        value.as_f64().ok_or_else(|| value.mismatch("f64"))
    }

    fn missing_value() -> Option<Self> {
        Some(0.0)
    }
}

impl FlexField for String {
    fn member_type() -> MemberType {
        MemberType::variable(ScalarKind::String)
    }

    fn to_flex_value(&self) -> FlexValue {
        FlexValue::Str(self.clone())
    }

    fn from_flex_value(value: FlexValue) -> Result<Self, DecodeError> {
        match value {
            FlexValue::Str(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }

    fn missing_value() -> Option<Self> {
        Some(String::new())
    }
}

/// `None` is written as null. A `Some` holding a default scalar is not
/// written either, so it reads back as `None`.
impl<T: FlexField> FlexField for Option<T> {
    fn member_type() -> MemberType {
        MemberType::optional(T::member_type())
    }

    fn to_flex_value(&self) -> FlexValue {
        match self {
            Some(v) => v.to_flex_value(),
            None => FlexValue::Null,
        }
    }

    fn from_flex_value(value: FlexValue) -> Result<Self, DecodeError> {
        match value {
            FlexValue::Null => Ok(None),
            other => T::from_flex_value(other).map(Some),
        }
    }

    fn missing_value() -> Option<Self> {
        Some(None)
    }

    fn register(scope: &mut TypeScope) {
        T::register(scope);
    }
}

impl<T: FlexField> FlexField for Box<T> {
    fn member_type() -> MemberType {
        T::member_type()
    }

    fn to_flex_value(&self) -> FlexValue {
        (**self).to_flex_value()
    }

    fn from_flex_value(value: FlexValue) -> Result<Self, DecodeError> {
        T::from_flex_value(value).map(Box::new)
    }

    fn missing_value() -> Option<Self> {
        T::missing_value().map(Box::new)
    }

    fn register(scope: &mut TypeScope) {
        T::register(scope);
    }
}

fn elements<T: FlexField>(value: FlexValue) -> Result<Vec<T>, DecodeError> {
    match value {
        FlexValue::Array(items) => items.into_iter().map(T::from_flex_value).collect(),
        FlexValue::Null => Ok(Vec::new()),
        other => Err(other.mismatch("array")),
    }
}

impl<T: FlexField> FlexField for Vec<T> {
    fn member_type() -> MemberType {
        MemberType::list(T::member_type())
    }

    fn to_flex_value(&self) -> FlexValue {
        FlexValue::Array(self.iter().map(FlexField::to_flex_value).collect())
    }

    fn from_flex_value(value: FlexValue) -> Result<Self, DecodeError> {
        elements(value)
    }

    fn missing_value() -> Option<Self> {
        Some(Vec::new())
    }

    fn register(scope: &mut TypeScope) {
        T::register(scope);
    }
}

impl<T: FlexField, const N: usize> FlexField for [T; N] {
    fn member_type() -> MemberType {
        MemberType::array(T::member_type())
    }

    fn to_flex_value(&self) -> FlexValue {
        FlexValue::Array(self.iter().map(FlexField::to_flex_value).collect())
    }

    fn from_flex_value(value: FlexValue) -> Result<Self, DecodeError> {
        let items: Vec<T> = elements(value)?;
        let len = items.len();
        items.try_into().map_err(|_| {
            DecodeError::InvalidData(format!("expected {} array elements, got {}", N, len))
        })
    }

    fn register(scope: &mut TypeScope) {
        T::register(scope);
    }
}

fn entries<K, V, C>(value: FlexValue) -> Result<C, DecodeError>
where
    K: FlexField,
    V: FlexField,
    C: FromIterator<(K, V)>,
{
    match value {
        FlexValue::Map(entries) => entries
            .into_iter()
            .map(|(k, v)| -> Result<(K, V), DecodeError> {
                Ok((K::from_flex_value(k)?, V::from_flex_value(v)?))
            })
            .collect(),
        FlexValue::Null => Ok(std::iter::empty().collect()),
        other => Err(other.mismatch("map")),
    }
}

impl<K: FlexField + Eq + Hash, V: FlexField> FlexField for HashMap<K, V> {
    fn member_type() -> MemberType {
        MemberType::dictionary(K::member_type(), V::member_type())
    }

    fn to_flex_value(&self) -> FlexValue {
        FlexValue::Map(
            self.iter()
                .map(|(k, v)| (k.to_flex_value(), v.to_flex_value()))
                .collect(),
        )
    }

    fn from_flex_value(value: FlexValue) -> Result<Self, DecodeError> {
        entries(value)
    }

    fn missing_value() -> Option<Self> {
        Some(HashMap::new())
    }

    fn register(scope: &mut TypeScope) {
        K::register(scope);
        V::register(scope);
    }
}

impl<K: FlexField + Ord, V: FlexField> FlexField for BTreeMap<K, V> {
    fn member_type() -> MemberType {
        MemberType::dictionary(K::member_type(), V::member_type())
    }

    fn to_flex_value(&self) -> FlexValue {
        FlexValue::Map(
            self.iter()
                .map(|(k, v)| (k.to_flex_value(), v.to_flex_value()))
                .collect(),
        )
    }

    fn from_flex_value(value: FlexValue) -> Result<Self, DecodeError> {
        entries(value)
    }

    fn missing_value() -> Option<Self> {
        Some(BTreeMap::new())
    }

    fn register(scope: &mut TypeScope) {
        K::register(scope);
        V::register(scope);
    }
}
