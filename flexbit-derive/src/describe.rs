//! Code generation for type descriptors and scope registration.

use proc_macro2::TokenStream;
use quote::quote;

use crate::attr::{Encoding, FieldInfo};
use crate::shape::{Model, Shape};

/// Body of `FlexField::member_type`.
pub fn member_type(model: &Model) -> TokenStream {
    let name = &model.name;
    match &model.shape {
        Shape::Enum(_) => quote! {
            ::flexbit::schema::MemberType::variable(::flexbit::schema::ScalarKind::EnumInt)
        },
        Shape::Class(_) | Shape::Union(_) => quote! {
            ::flexbit::schema::MemberType::object(#name)
        },
    }
}

/// `FlexField::register`, inserting the descriptor and then every type it
/// references. Plain enums have nothing to register.
pub fn register(model: &Model) -> TokenStream {
    let referenced: Vec<_> = match &model.shape {
        Shape::Enum(_) => return TokenStream::new(),
        Shape::Class(fields) => fields
            .iter()
            .filter(|f| !f.attrs.ignore)
            .map(|f| &f.ty)
            .collect(),
        Shape::Union(variants) => variants.iter().map(|(_, ty)| ty).collect(),
    };

    quote! {
        fn register(scope: &mut ::flexbit::schema::TypeScope) {
            if scope.insert(<Self as ::flexbit::FlexData>::descriptor()) {
                #( <#referenced as ::flexbit::FlexField>::register(scope); )*
            }
        }
    }
}

/// The `FlexData` impl for classes and unions.
pub fn data_impl(model: &Model) -> TokenStream {
    let ident = &model.ident;
    let name = &model.name;

    match &model.shape {
        Shape::Enum(_) => TokenStream::new(),
        Shape::Class(fields) => {
            let serialize_null = model.serialize_null;
            let members = fields.iter().filter(|f| !f.attrs.ignore).map(member_descriptor);
            quote! {
                impl ::flexbit::FlexData for #ident {
                    const NAME: &'static str = #name;

                    fn descriptor() -> ::flexbit::schema::TypeDescriptor {
                        ::flexbit::schema::TypeDescriptor::class(
                            #name,
                            #serialize_null,
                            ::std::vec![#(#members),*],
                        )
                    }
                }
            }
        }
        Shape::Union(variants) => {
            let types: Vec<_> = variants.iter().map(|(_, ty)| ty).collect();
            quote! {
                impl ::flexbit::FlexData for #ident {
                    const NAME: &'static str = #name;

                    fn descriptor() -> ::flexbit::schema::TypeDescriptor {
                        ::flexbit::schema::TypeDescriptor::union(
                            #name,
                            [#( <#types as ::flexbit::FlexData>::NAME ),*],
                        )
                    }

                    fn accepts(type_name: &str) -> bool {
                        false #( || <#types as ::flexbit::FlexData>::accepts(type_name) )*
                    }
                }
            }
        }
    }
}

fn member_descriptor(field: &FieldInfo) -> TokenStream {
    let member_name = &field.member_name;
    let ty = &field.ty;

    let bits = match field.attrs.bits {
        Some(bits) => quote! { ::std::option::Option::Some(#bits) },
        None => quote! { ::std::option::Option::None },
    };
    let range = match field.attrs.range {
        Some((min, max)) => quote! { ::std::option::Option::Some((#min, #max)) },
        None => quote! { ::std::option::Option::None },
    };
    let encoding = match field.attrs.encoding {
        Some(Encoding::VarInt) => quote! {
            ::std::option::Option::Some(::flexbit::schema::EncodingHint::VarInt)
        },
        Some(Encoding::Lossy) => quote! {
            ::std::option::Option::Some(::flexbit::schema::EncodingHint::Lossy)
        },
        Some(Encoding::EnumInt) => quote! {
            ::std::option::Option::Some(::flexbit::schema::EncodingHint::EnumInt)
        },
        None => quote! { ::std::option::Option::None },
    };

    quote! {
        ::flexbit::schema::MemberDescriptor::new(
            #member_name,
            <#ty as ::flexbit::FlexField>::member_type(),
        )
        .with_attrs(::flexbit::schema::MemberAttrs {
            bits: #bits,
            range: #range,
            encoding: #encoding,
        })
    }
}
