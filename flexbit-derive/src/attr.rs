//! Attribute parsing for the flexbit derive macro.

use std::collections::HashSet;

use syn::meta::ParseNestedMeta;
use syn::{Attribute, Expr, ExprLit, ExprUnary, Ident, Lit, Result, Type, UnOp};

/// Encoding override requested on a field.
#[derive(Clone, Copy)]
pub enum Encoding {
    VarInt,
    Lossy,
    EnumInt,
}

/// Parsed field attributes from #[flex(...)]
#[derive(Default)]
pub struct FieldAttrs {
    /// Leave the field out of the schema; decoding fills in Default::default().
    pub ignore: bool,
    /// Use Default::default() if the member is missing from the stream.
    pub use_default: bool,
    /// Member name used in the schema instead of the field name.
    pub rename: Option<String>,
    pub bits: Option<u8>,
    pub range: Option<(i64, i64)>,
    pub encoding: Option<Encoding>,
}

impl FieldAttrs {
    /// Parse attributes from a field.
    pub fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut result = FieldAttrs::default();

        for attr in attrs {
            if attr.path().is_ident("flex") {
                result.parse_flex_attr(attr)?;
            }
        }

        Ok(result)
    }

    fn parse_flex_attr(&mut self, attr: &Attribute) -> Result<()> {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("ignore") {
                self.ignore = true;
            } else if meta.path.is_ident("default") {
                self.use_default = true;
            } else if meta.path.is_ident("rename") {
                self.rename = Some(parse_string(&meta)?);
            } else if meta.path.is_ident("bits") {
                let value: Expr = meta.value()?.parse()?;
                let bits = parse_int(&value)?;
                if !(1..=64).contains(&bits) {
                    return Err(syn::Error::new_spanned(value, "bits must be within 1..=64"));
                }
                self.bits = Some(bits as u8);
            } else if meta.path.is_ident("range") {
                self.range = Some(parse_range(&meta)?);
            } else if meta.path.is_ident("varint") {
                self.set_encoding(&meta, Encoding::VarInt)?;
            } else if meta.path.is_ident("lossy") {
                self.set_encoding(&meta, Encoding::Lossy)?;
            } else if meta.path.is_ident("enum_int") {
                self.set_encoding(&meta, Encoding::EnumInt)?;
            } else {
                return Err(syn::Error::new_spanned(meta.path, "unknown flex attribute"));
            }
            Ok(())
        })
    }

    fn set_encoding(&mut self, meta: &ParseNestedMeta, encoding: Encoding) -> Result<()> {
        if self.encoding.is_some() {
            return Err(meta.error("only one of varint, lossy and enum_int may be given"));
        }
        self.encoding = Some(encoding);
        Ok(())
    }

    fn has_encoding_attrs(&self) -> bool {
        self.bits.is_some() || self.range.is_some() || self.encoding.is_some()
    }
}

/// Parsed type-level attributes.
#[derive(Default)]
pub struct TypeAttrs {
    /// Registered type name (defaults to the Rust type name).
    pub name: Option<String>,
    /// Write absent objects and arrays as explicit nulls.
    pub serialize_null: bool,
}

impl TypeAttrs {
    /// Parse attributes from a struct or enum.
    pub fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut result = TypeAttrs::default();

        for attr in attrs {
            if attr.path().is_ident("flex") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        result.name = Some(parse_string(&meta)?);
                    } else if meta.path.is_ident("serialize_null") {
                        result.serialize_null = true;
                    } else {
                        return Err(syn::Error::new_spanned(meta.path, "unknown flex attribute"));
                    }
                    Ok(())
                })?;
            }
        }

        Ok(result)
    }
}

fn parse_string(meta: &ParseNestedMeta) -> Result<String> {
    let value: Expr = meta.value()?.parse()?;
    match value {
        Expr::Lit(ExprLit {
            lit: Lit::Str(lit), ..
        }) => Ok(lit.value()),
        other => Err(syn::Error::new_spanned(other, "expected string literal")),
    }
}

/// Integer literal, optionally negated.
fn parse_int(expr: &Expr) -> Result<i128> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(lit), ..
        }) => lit.base10_parse::<i128>(),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => parse_int(expr).map(|v| -v),
        other => Err(syn::Error::new_spanned(other, "expected integer literal")),
    }
}

fn parse_range(meta: &ParseNestedMeta) -> Result<(i64, i64)> {
    let mut min = None;
    let mut max = None;
    meta.parse_nested_meta(|bound| {
        let value: Expr = bound.value()?.parse()?;
        let parsed = i64::try_from(parse_int(&value)?)
            .map_err(|_| syn::Error::new_spanned(&value, "bound does not fit in i64"))?;
        if bound.path.is_ident("min") {
            min = Some(parsed);
        } else if bound.path.is_ident("max") {
            max = Some(parsed);
        } else {
            return Err(syn::Error::new_spanned(bound.path, "expected `min` or `max`"));
        }
        Ok(())
    })?;
    match (min, max) {
        (Some(min), Some(max)) if min <= max => Ok((min, max)),
        (Some(_), Some(_)) => Err(meta.error("range min must not exceed max")),
        _ => Err(meta.error("range needs both `min` and `max`")),
    }
}

/// Field information collected from the struct definition.
pub struct FieldInfo {
    pub ident: Ident,
    pub ty: Type,
    /// Name of the member in the schema.
    pub member_name: String,
    pub attrs: FieldAttrs,
}

/// Validate attribute combinations and that member names are unique.
pub fn validate_fields(fields: &[FieldInfo]) -> Result<()> {
    let mut seen_names = HashSet::new();

    for field in fields {
        if field.attrs.ignore {
            if field.attrs.has_encoding_attrs() || field.attrs.rename.is_some() {
                return Err(syn::Error::new(
                    field.ident.span(),
                    "ignored fields cannot carry other flex attributes",
                ));
            }
            continue;
        }

        if field.attrs.bits.is_some() && field.attrs.range.is_some() {
            return Err(syn::Error::new(
                field.ident.span(),
                "bits and range cannot be combined",
            ));
        }

        if !seen_names.insert(field.member_name.as_str()) {
            return Err(syn::Error::new(
                field.ident.span(),
                format!("duplicate member name '{}' in struct", field.member_name),
            ));
        }
    }

    Ok(())
}
