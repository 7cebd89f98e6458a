//! Reads a derive input into the three supported shapes.

use syn::{Data, DeriveInput, Fields, Ident, Result, Type};

use crate::attr::{validate_fields, FieldAttrs, FieldInfo, TypeAttrs};

const MIXED_VARIANTS: &str =
    "FlexData enums must have only unit variants or only single-field tuple variants";

pub enum Shape {
    /// Struct with named fields.
    Class(Vec<FieldInfo>),
    /// Enum of unit variants, written as an EnumInt of the declaration index.
    Enum(Vec<Ident>),
    /// Enum whose variants each wrap one FlexData type.
    Union(Vec<(Ident, Type)>),
}

pub struct Model {
    pub ident: Ident,
    /// Registered type name.
    pub name: String,
    pub serialize_null: bool,
    pub shape: Shape,
}

impl Model {
    pub fn from_input(input: &DeriveInput) -> Result<Self> {
        if !input.generics.params.is_empty() {
            return Err(syn::Error::new_spanned(
                &input.generics,
                "FlexData does not support generic types",
            ));
        }

        let attrs = TypeAttrs::from_attrs(&input.attrs)?;
        let shape = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(fields) => {
                    let mut infos = Vec::with_capacity(fields.named.len());
                    for field in &fields.named {
                        let Some(ident) = field.ident.clone() else {
                            continue;
                        };
                        let attrs = FieldAttrs::from_attrs(&field.attrs)?;
                        let member_name = attrs
                            .rename
                            .clone()
                            .unwrap_or_else(|| ident.to_string());
                        infos.push(FieldInfo {
                            ident,
                            ty: field.ty.clone(),
                            member_name,
                            attrs,
                        });
                    }
                    validate_fields(&infos)?;
                    Shape::Class(infos)
                }
                _ => {
                    return Err(syn::Error::new_spanned(
                        input,
                        "FlexData only supports structs with named fields",
                    ))
                }
            },
            Data::Enum(data) => {
                if attrs.serialize_null {
                    return Err(syn::Error::new_spanned(
                        input,
                        "serialize_null only applies to structs",
                    ));
                }
                if data.variants.is_empty() {
                    return Err(syn::Error::new_spanned(
                        input,
                        "FlexData enums need at least one variant",
                    ));
                }
                if data.variants.iter().all(|v| matches!(v.fields, Fields::Unit)) {
                    Shape::Enum(data.variants.iter().map(|v| v.ident.clone()).collect())
                } else {
                    let mut variants = Vec::with_capacity(data.variants.len());
                    for variant in &data.variants {
                        match &variant.fields {
                            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
                                let ty = fields.unnamed[0].ty.clone();
                                variants.push((variant.ident.clone(), ty));
                            }
                            _ => {
                                return Err(syn::Error::new_spanned(variant, MIXED_VARIANTS))
                            }
                        }
                    }
                    Shape::Union(variants)
                }
            }
            Data::Union(_) => {
                return Err(syn::Error::new_spanned(
                    input,
                    "FlexData does not support unions",
                ))
            }
        };

        Ok(Model {
            ident: input.ident.clone(),
            name: attrs.name.unwrap_or_else(|| input.ident.to_string()),
            serialize_null: attrs.serialize_null,
            shape,
        })
    }
}
