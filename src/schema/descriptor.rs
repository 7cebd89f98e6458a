//! Type descriptors: what a type declares about itself before any ids exist.
//!
//! Descriptors are normally produced by `#[derive(FlexData)]` and collected
//! into a [`TypeScope`], which the schema builder turns into class metadata.

use std::collections::HashMap;

use super::types::{BitWidth, ScalarKind};

/// Declared type of a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberType {
    /// A scalar with its type-driven width.
    Scalar(ScalarKind, BitWidth),
    /// A class or union, by registered name.
    Object(String),
    Array {
        element: Box<MemberType>,
        is_list: bool,
    },
    Dictionary {
        key: Box<MemberType>,
        value: Box<MemberType>,
    },
    /// A type whose values may be absent.
    Optional(Box<MemberType>),
}

impl MemberType {
    pub fn scalar(kind: ScalarKind, bits: u8) -> Self {
        MemberType::Scalar(kind, BitWidth::Fixed(bits))
    }

    pub fn variable(kind: ScalarKind) -> Self {
        MemberType::Scalar(kind, BitWidth::Variable)
    }

    pub fn object(name: impl Into<String>) -> Self {
        MemberType::Object(name.into())
    }

    pub fn list(element: MemberType) -> Self {
        MemberType::Array {
            element: Box::new(element),
            is_list: true,
        }
    }

    pub fn array(element: MemberType) -> Self {
        MemberType::Array {
            element: Box::new(element),
            is_list: false,
        }
    }

    pub fn dictionary(key: MemberType, value: MemberType) -> Self {
        MemberType::Dictionary {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// Mark `inner` nullable. Already nullable types are returned as is.
    pub fn optional(inner: MemberType) -> Self {
        match inner {
            MemberType::Optional(_) => inner,
            other => MemberType::Optional(Box::new(other)),
        }
    }

    /// The type without its nullable marker.
    pub fn non_null(&self) -> &MemberType {
        match self {
            MemberType::Optional(inner) => inner,
            other => other,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, MemberType::Optional(_))
    }
}

/// Encoding override requested by an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingHint {
    /// Variable-length integer.
    VarInt,
    /// Quantized float.
    Lossy,
    /// Small-first unsigned integer.
    EnumInt,
}

/// Attributes attached to a member declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberAttrs {
    /// Explicit bit width.
    pub bits: Option<u8>,
    /// Inclusive value range, from which the width is derived.
    pub range: Option<(i64, i64)>,
    pub encoding: Option<EncodingHint>,
}

/// A member as declared by its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDescriptor {
    pub name: String,
    pub ty: MemberType,
    pub attrs: MemberAttrs,
}

impl MemberDescriptor {
    pub fn new(name: impl Into<String>, ty: MemberType) -> Self {
        MemberDescriptor {
            name: name.into(),
            ty,
            attrs: MemberAttrs::default(),
        }
    }

    pub fn with_attrs(mut self, attrs: MemberAttrs) -> Self {
        self.attrs = attrs;
        self
    }
}

/// What a registered type is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    /// A concrete type with members.
    Class {
        members: Vec<MemberDescriptor>,
        serialize_null: bool,
    },
    /// An abstract type; values are one of the named variants.
    Union { variants: Vec<String> },
}

/// Everything a type declares about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: String,
    pub shape: TypeShape,
}

impl TypeDescriptor {
    pub fn class(
        name: impl Into<String>,
        serialize_null: bool,
        members: Vec<MemberDescriptor>,
    ) -> Self {
        TypeDescriptor {
            name: name.into(),
            shape: TypeShape::Class {
                members,
                serialize_null,
            },
        }
    }

    pub fn union<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypeDescriptor {
            name: name.into(),
            shape: TypeShape::Union {
                variants: variants.into_iter().map(Into::into).collect(),
            },
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(self.shape, TypeShape::Class { .. })
    }
}

/// The set of types taking part in one schema.
#[derive(Debug, Clone, Default)]
pub struct TypeScope {
    types: Vec<TypeDescriptor>,
    by_name: HashMap<String, usize>,
}

impl TypeScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` and every type it references.
    pub fn register<T: crate::FlexData>(&mut self) -> &mut Self {
        <T as crate::FlexField>::register(self);
        self
    }

    /// Add a descriptor. Returns false if the name was already present.
    pub fn insert(&mut self, descriptor: TypeDescriptor) -> bool {
        if self.by_name.contains_key(&descriptor.name) {
            return false;
        }
        self.by_name
            .insert(descriptor.name.clone(), self.types.len());
        self.types.push(descriptor);
        true
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.by_name.get(name).map(|&i| &self.types[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Concrete classes a value declared as `name` may hold, most derived
    /// first, ties in declaration order.
    pub fn assignable_types(&self, name: &str) -> Vec<String> {
        let mut found: Vec<(usize, String)> = Vec::new();
        let mut visiting = Vec::new();
        self.collect_assignable(name, 0, &mut found, &mut visiting);
        // Stable sort keeps declaration order among equal depths.
        found.sort_by(|a, b| b.0.cmp(&a.0));
        found.into_iter().map(|(_, name)| name).collect()
    }

    fn collect_assignable<'a>(
        &'a self,
        name: &'a str,
        depth: usize,
        found: &mut Vec<(usize, String)>,
        visiting: &mut Vec<&'a str>,
    ) {
        let Some(descriptor) = self.get(name) else {
            return;
        };
        if visiting.contains(&name) {
            return;
        }
        match &descriptor.shape {
            TypeShape::Class { .. } => {
                if !found.iter().any(|(_, n)| n == name) {
                    found.push((depth, name.to_string()));
                }
            }
            TypeShape::Union { variants } => {
                visiting.push(name);
                for variant in variants {
                    self.collect_assignable(variant, depth + 1, found, visiting);
                }
                visiting.pop();
            }
        }
    }

    /// Unions by name with their assignable classes.
    pub fn unions(&self) -> impl Iterator<Item = (&str, Vec<String>)> {
        self.types
            .iter()
            .filter(|t| !t.is_class())
            .map(|t| (t.name.as_str(), self.assignable_types(&t.name)))
    }
}
