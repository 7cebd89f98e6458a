//! Class and member metadata.

use std::fmt;

/// Wire encoding of a scalar member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScalarKind {
    Bool,
    Byte,
    /// Sign bit plus magnitude in a fixed width.
    Int,
    UInt,
    VarInt,
    VarLong,
    EnumInt,
    /// Lossless 32-bit float.
    Float,
    /// Quantized 32-bit float.
    LossyFloat,
    /// Lossless 64-bit float.
    Double,
    String,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 11] = [
        ScalarKind::Bool,
        ScalarKind::Byte,
        ScalarKind::Int,
        ScalarKind::UInt,
        ScalarKind::VarInt,
        ScalarKind::VarLong,
        ScalarKind::EnumInt,
        ScalarKind::Float,
        ScalarKind::LossyFloat,
        ScalarKind::Double,
        ScalarKind::String,
    ];

    /// Code stored in metadata files.
    pub fn code(self) -> u8 {
        match self {
            ScalarKind::Bool => 0,
            ScalarKind::Byte => 1,
            ScalarKind::Int => 2,
            ScalarKind::UInt => 3,
            ScalarKind::VarInt => 4,
            ScalarKind::VarLong => 5,
            ScalarKind::EnumInt => 6,
            ScalarKind::Float => 7,
            ScalarKind::LossyFloat => 8,
            ScalarKind::Double => 9,
            ScalarKind::String => 10,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, ScalarKind::Bool | ScalarKind::String)
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Byte => "byte",
            ScalarKind::Int => "int",
            ScalarKind::UInt => "uint",
            ScalarKind::VarInt => "varint",
            ScalarKind::VarLong => "varlong",
            ScalarKind::EnumInt => "enumint",
            ScalarKind::Float => "float",
            ScalarKind::LossyFloat => "lossyfloat",
            ScalarKind::Double => "double",
            ScalarKind::String => "string",
        }
    }
}

/// Number of bits a scalar occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BitWidth {
    Fixed(u8),
    /// Length depends on the value.
    Variable,
}

impl fmt::Display for BitWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitWidth::Fixed(bits) => write!(f, "{}", bits),
            BitWidth::Variable => f.write_str("var"),
        }
    }
}

/// Encoding detail of a scalar member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScalarDetail {
    pub kind: ScalarKind,
    pub width: BitWidth,
    /// Width came from an attribute rather than the Rust type.
    pub explicit: bool,
    pub numeric: bool,
}

impl ScalarDetail {
    /// Detail with the type-driven width.
    pub fn new(kind: ScalarKind, width: BitWidth) -> Self {
        ScalarDetail {
            kind,
            width,
            explicit: false,
            numeric: kind.is_numeric(),
        }
    }

    /// Detail whose width was set by an attribute.
    pub fn explicit(kind: ScalarKind, bits: u8) -> Self {
        ScalarDetail {
            explicit: true,
            ..Self::new(kind, BitWidth::Fixed(bits))
        }
    }

    /// Whether two details produce the same bits for the same value.
    pub fn wire_compatible(&self, other: &ScalarDetail) -> bool {
        self.kind == other.kind && self.width == other.width && self.numeric == other.numeric
    }

    /// Fixed width in bits, or 0 for variable-width kinds.
    pub fn bits(&self) -> u32 {
        match self.width {
            BitWidth::Fixed(bits) => bits as u32,
            BitWidth::Variable => 0,
        }
    }
}

/// A concrete type a polymorphic member may hold.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssignableType {
    pub name: String,
    /// False once the type is no longer assignable; its index stays reserved.
    pub live: bool,
}

/// Encoding detail of an object member: its ordered assignable types.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectDetail {
    pub types: Vec<AssignableType>,
}

impl ObjectDetail {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ObjectDetail {
            types: names
                .into_iter()
                .map(|name| AssignableType {
                    name: name.into(),
                    live: true,
                })
                .collect(),
        }
    }

    /// 1-based type index of a live assignable type.
    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.types
            .iter()
            .position(|t| t.live && t.name == name)
            .map(|i| i as u16 + 1)
    }

    /// Entry for a 1-based type index.
    pub fn type_at(&self, index: u16) -> Option<&AssignableType> {
        self.types.get((index as usize).checked_sub(1)?)
    }

    pub fn live_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().filter(|t| t.live).map(|t| t.name.as_str())
    }

    /// Keep the persisted order, mark vanished types dead and append new ones.
    fn merged_with(&self, old: &ObjectDetail) -> ObjectDetail {
        let mut types: Vec<AssignableType> = old
            .types
            .iter()
            .map(|t| AssignableType {
                name: t.name.clone(),
                live: self.types.iter().any(|n| n.live && n.name == t.name),
            })
            .collect();
        for t in self.types.iter().filter(|t| t.live) {
            if !types.iter().any(|o| o.name == t.name) {
                types.push(t.clone());
            }
        }
        ObjectDetail { types }
    }
}

/// Encoding of a value position: a scalar or an object.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlexDetail {
    Scalar(ScalarDetail),
    Object(ObjectDetail),
}

impl FlexDetail {
    /// Merge a freshly discovered detail with its persisted counterpart.
    ///
    /// Returns `None` when the two are not wire compatible.
    pub fn merged_with(&self, old: &FlexDetail) -> Option<FlexDetail> {
        match (self, old) {
            (FlexDetail::Scalar(new), FlexDetail::Scalar(prev)) => {
                new.wire_compatible(prev).then_some(FlexDetail::Scalar(*new))
            }
            (FlexDetail::Object(new), FlexDetail::Object(prev)) => {
                Some(FlexDetail::Object(new.merged_with(prev)))
            }
            _ => None,
        }
    }

    /// Names of the live types an object detail refers to.
    pub fn referenced_types(&self) -> Vec<&str> {
        match self {
            FlexDetail::Object(obj) => obj.live_names().collect(),
            FlexDetail::Scalar(_) => Vec::new(),
        }
    }
}

impl fmt::Display for FlexDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlexDetail::Scalar(s) => write!(f, "{}({})", s.kind.name(), s.width),
            FlexDetail::Object(obj) => {
                write!(f, "object[")?;
                for (i, t) in obj.types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t.name)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Shape of a member.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemberKind {
    Simple(FlexDetail),
    /// `is_list` separates growable lists from fixed arrays; both share a wire form.
    Array { element: FlexDetail, is_list: bool },
    Dictionary { key: FlexDetail, value: FlexDetail },
}

impl MemberKind {
    /// Metadata tag of the shape.
    pub fn tag(&self) -> u8 {
        match self {
            MemberKind::Simple(_) => 0,
            MemberKind::Array { .. } => 1,
            MemberKind::Dictionary { .. } => 2,
        }
    }

    /// Merge with the persisted shape, or `None` on a breaking change.
    pub fn merged_with(&self, old: &MemberKind) -> Option<MemberKind> {
        match (self, old) {
            (MemberKind::Simple(new), MemberKind::Simple(prev)) => {
                new.merged_with(prev).map(MemberKind::Simple)
            }
            (
                MemberKind::Array { element, is_list },
                MemberKind::Array {
                    element: prev_element,
                    ..
                },
            ) => Some(MemberKind::Array {
                element: element.merged_with(prev_element)?,
                is_list: *is_list,
            }),
            (
                MemberKind::Dictionary { key, value },
                MemberKind::Dictionary {
                    key: prev_key,
                    value: prev_value,
                },
            ) => Some(MemberKind::Dictionary {
                key: key.merged_with(prev_key)?,
                value: value.merged_with(prev_value)?,
            }),
            _ => None,
        }
    }

    /// All details of the member.
    pub fn details(&self) -> Vec<&FlexDetail> {
        match self {
            MemberKind::Simple(detail) => vec![detail],
            MemberKind::Array { element, .. } => vec![element],
            MemberKind::Dictionary { key, value } => vec![key, value],
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Simple(detail) => write!(f, "{}", detail),
            MemberKind::Array { element, is_list } => {
                let shape = if *is_list { "list" } else { "array" };
                write!(f, "{}<{}>", shape, element)
            }
            MemberKind::Dictionary { key, value } => write!(f, "dictionary<{}, {}>", key, value),
        }
    }
}

/// Metadata of one member.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlexMemberInfo {
    pub name: String,
    /// Wire id; 0 until assigned.
    pub id: u16,
    /// False for members removed from the type but kept so old data can be skipped.
    pub live: bool,
    pub kind: MemberKind,
}

impl FlexMemberInfo {
    pub fn new(name: impl Into<String>, kind: MemberKind) -> Self {
        FlexMemberInfo {
            name: name.into(),
            id: 0,
            live: true,
            kind,
        }
    }

    pub fn with_id(mut self, id: u16) -> Self {
        self.id = id;
        self
    }
}

/// Metadata of one class: its members in wire id order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlexClassInfo {
    pub type_name: String,
    /// Identifier used in root and batch streams; `None` until assigned.
    pub type_id: Option<u16>,
    /// Sorted ascending by id once ids are assigned.
    pub members: Vec<FlexMemberInfo>,
    /// Write absent objects and arrays as explicit nulls.
    pub serialize_null: bool,
    /// False when the type only survives as persisted metadata.
    pub live: bool,
}

impl FlexClassInfo {
    pub fn new(type_name: impl Into<String>) -> Self {
        FlexClassInfo {
            type_name: type_name.into(),
            type_id: None,
            members: Vec::new(),
            serialize_null: false,
            live: true,
        }
    }

    pub fn member_by_id(&self, id: u16) -> Option<&FlexMemberInfo> {
        self.members
            .binary_search_by_key(&id, |m| m.id)
            .ok()
            .map(|i| &self.members[i])
    }

    pub fn member_by_name(&self, name: &str) -> Option<&FlexMemberInfo> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn live_members(&self) -> impl Iterator<Item = &FlexMemberInfo> {
        self.members.iter().filter(|m| m.live)
    }

    /// Types referenced by live object members.
    pub fn dependencies(&self) -> Vec<&str> {
        let mut deps: Vec<&str> = self
            .live_members()
            .flat_map(|m| m.kind.details())
            .flat_map(|d| d.referenced_types())
            .filter(|name| *name != self.type_name)
            .collect();
        deps.sort_unstable();
        deps.dedup();
        deps
    }
}
