//! Code generation for `FlexField::from_flex_value` and `missing_value`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::shape::{Model, Shape};

pub fn from_flex_value(model: &Model) -> TokenStream {
    let name = &model.name;

    match &model.shape {
        Shape::Class(fields) => {
            let temps: Vec<_> = (0..fields.len())
                .map(|i| format_ident!("__flex_field_{}", i))
                .collect();

            let extractions = fields.iter().zip(&temps).map(|(field, temp)| {
                let ty = &field.ty;
                let member_name = &field.member_name;

                if field.attrs.ignore {
                    return quote! {
                        let #temp: #ty = ::std::default::Default::default();
                    };
                }

                let missing = if field.attrs.use_default {
                    quote! { ::std::default::Default::default() }
                } else {
                    quote! {
                        match <#ty as ::flexbit::FlexField>::missing_value() {
                            ::std::option::Option::Some(v) => v,
                            ::std::option::Option::None => {
                                return ::std::result::Result::Err(
                                    ::flexbit::error::DecodeError::MissingMember {
                                        type_name: ::std::string::String::from(#name),
                                        member: ::std::string::String::from(#member_name),
                                    },
                                )
                            }
                        }
                    }
                };

                quote! {
                    let #temp: #ty = match __flex_fields.remove(#member_name) {
                        ::std::option::Option::Some(v) => {
                            <#ty as ::flexbit::FlexField>::from_flex_value(v)?
                        }
                        ::std::option::Option::None => #missing,
                    };
                }
            });

            let assigns = fields.iter().zip(&temps).map(|(field, temp)| {
                let ident = &field.ident;
                quote! { #ident: #temp }
            });

            quote! {
                #[allow(unused_mut, unused_variables)]
                let mut __flex_fields = __flex_value.into_fields(#name)?;
                #(#extractions)*
                ::std::result::Result::Ok(Self { #(#assigns),* })
            }
        }
        Shape::Enum(variants) => {
            let arms = variants.iter().enumerate().map(|(index, variant)| {
                let index = index as u64;
                quote! { #index => ::std::result::Result::Ok(Self::#variant), }
            });
            quote! {
                let __flex_index = __flex_value
                    .as_u64()
                    .ok_or_else(|| __flex_value.mismatch(#name))?;
                match __flex_index {
                    #(#arms)*
                    other => ::std::result::Result::Err(
                        ::flexbit::error::DecodeError::InvalidData(
                            ::std::format!("{} is not a variant index of {}", other, #name),
                        ),
                    ),
                }
            }
        }
        Shape::Union(variants) => {
            let checks = variants.iter().map(|(variant, ty)| {
                quote! {
                    if <#ty as ::flexbit::FlexData>::accepts(&__flex_concrete) {
                        return <#ty as ::flexbit::FlexField>::from_flex_value(__flex_value)
                            .map(Self::#variant);
                    }
                }
            });
            quote! {
                let __flex_concrete = match __flex_value.object_type() {
                    ::std::option::Option::Some(concrete) => ::std::string::String::from(concrete),
                    ::std::option::Option::None => {
                        return ::std::result::Result::Err(__flex_value.mismatch(#name))
                    }
                };
                #(#checks)*
                ::std::result::Result::Err(::flexbit::error::DecodeError::TypeMismatch {
                    member: ::std::string::String::from(#name),
                    expected: ::std::string::String::from(#name),
                    actual: __flex_concrete,
                })
            }
        }
    }
}

/// `FlexField::missing_value`: plain enums fall back to their first variant.
pub fn missing_value(model: &Model) -> TokenStream {
    match &model.shape {
        Shape::Enum(variants) => {
            let first = &variants[0];
            quote! {
                fn missing_value() -> ::std::option::Option<Self> {
                    ::std::option::Option::Some(Self::#first)
                }
            }
        }
        Shape::Class(_) | Shape::Union(_) => TokenStream::new(),
    }
}
