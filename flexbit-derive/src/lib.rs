//! Derive macro for flexbit serialization.
//!
//! `#[derive(FlexData)]` implements `flexbit::FlexField` (and, for structs
//! and wrapping enums, `flexbit::FlexData`) so the type can be registered in
//! a `TypeScope` and serialized through a built schema.
//!
//! # Example
//!
//! ```rust,ignore
//! use flexbit::FlexData;
//!
//! #[derive(FlexData)]
//! struct Person {
//!     name: String,
//!     #[flex(range(min = 0, max = 150))]
//!     age: i32,
//! }
//!
//! #[derive(FlexData)]
//! enum Mood {
//!     Calm,
//!     Grumpy,
//! }
//!
//! #[derive(FlexData)]
//! enum Pet {
//!     Cat(Cat),
//!     Dog(Dog),
//! }
//! ```

mod attr;
mod decode;
mod describe;
mod encode;
mod shape;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

use shape::Model;

/// Derive macro for `FlexField` and `FlexData`.
///
/// Structs with named fields become classes. Enums of unit variants become
/// EnumInt scalars. Enums whose variants each wrap one `FlexData` type
/// become unions over those types.
///
/// # Type attributes
///
/// - `#[flex(name = "...")]` - Registered name, defaults to the Rust type name.
/// - `#[flex(serialize_null)]` - Write absent objects and arrays as explicit nulls.
///
/// # Field attributes
///
/// - `#[flex(ignore)]` - Leave the field out; decoding uses Default.
/// - `#[flex(default)]` - Use Default::default() if the member is missing.
/// - `#[flex(rename = "...")]` - Member name in the schema.
/// - `#[flex(bits = N)]` - Explicit integer width.
/// - `#[flex(range(min = A, max = B))]` - Width derived from a value range.
/// - `#[flex(varint)]`, `#[flex(lossy)]`, `#[flex(enum_int)]` - Encoding override.
#[proc_macro_derive(FlexData, attributes(flex))]
pub fn derive_flex_data(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    derive_flex(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_flex(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let model = Model::from_input(input)?;
    let ident = &model.ident;

    let member_type = describe::member_type(&model);
    let register = describe::register(&model);
    let data_impl = describe::data_impl(&model);
    let to_value = encode::to_flex_value(&model);
    let from_value = decode::from_flex_value(&model);
    let missing = decode::missing_value(&model);

    Ok(quote! {
        impl ::flexbit::FlexField for #ident {
            fn member_type() -> ::flexbit::schema::MemberType {
                #member_type
            }

            fn to_flex_value(&self) -> ::flexbit::FlexValue {
                #to_value
            }

            fn from_flex_value(
                __flex_value: ::flexbit::FlexValue,
            ) -> ::std::result::Result<Self, ::flexbit::error::DecodeError> {
                #from_value
            }

            #missing

            #register
        }

        #data_impl
    })
}
