//! Code generation for `FlexField::to_flex_value`.

use proc_macro2::TokenStream;
use quote::quote;

use crate::shape::{Model, Shape};

pub fn to_flex_value(model: &Model) -> TokenStream {
    let name = &model.name;

    match &model.shape {
        Shape::Class(fields) => {
            let inserts = fields.iter().filter(|f| !f.attrs.ignore).map(|field| {
                let ident = &field.ident;
                let member_name = &field.member_name;
                quote! {
                    __flex_fields.insert(
                        ::std::string::String::from(#member_name),
                        ::flexbit::FlexField::to_flex_value(&self.#ident),
                    );
                }
            });
            quote! {
                #[allow(unused_mut)]
                let mut __flex_fields = ::std::collections::HashMap::new();
                #(#inserts)*
                ::flexbit::FlexValue::Object {
                    type_name: ::std::string::String::from(#name),
                    fields: __flex_fields,
                }
            }
        }
        Shape::Enum(variants) => {
            let arms = variants.iter().enumerate().map(|(index, variant)| {
                let index = index as u64;
                quote! { Self::#variant => ::flexbit::FlexValue::UInt(#index), }
            });
            quote! {
                match self {
                    #(#arms)*
                }
            }
        }
        Shape::Union(variants) => {
            let arms = variants.iter().map(|(variant, _)| {
                quote! { Self::#variant(inner) => ::flexbit::FlexField::to_flex_value(inner), }
            });
            quote! {
                match self {
                    #(#arms)*
                }
            }
        }
    }
}
