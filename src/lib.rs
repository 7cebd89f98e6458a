//! Flexbit: compact bit-packed serialization with schema evolution.
//!
//! Values are packed into a bit stream rather than whole bytes: integers use
//! only the width their range needs, floats can be quantized, and strings
//! pick the smallest character table that covers them. Every member gets a
//! wire id that is persisted between program versions, so adding, removing
//! and reordering members keeps old data readable.
//!
//! # Quick Start
//!
//! ```rust
//! use flexbit::schema::{MemoryMetaStore, SchemaBuilder, TypeScope};
//! use flexbit::FlexData;
//!
//! #[derive(Debug, PartialEq, FlexData)]
//! struct Player {
//!     name: String,
//!     #[flex(range(min = 0, max = 100))]
//!     health: i32,
//! }
//!
//! let mut scope = TypeScope::new();
//! scope.register::<Player>();
//!
//! let mut store = MemoryMetaStore::new();
//! let schema = SchemaBuilder::new(&scope).build_strict(&mut store).unwrap();
//!
//! let player = Player { name: "ada".into(), health: 87 };
//! let bytes = schema.serialize(&player).unwrap();
//! assert_eq!(schema.deserialize::<Player>(&bytes).unwrap(), player);
//! ```

pub mod error;
pub mod value;
pub mod codec;
pub mod schema;
pub mod registry;
pub mod derive_traits;

pub use error::{FlexError, Result};
pub use value::FlexValue;
pub use registry::{deserialize, deserialize_list, serialize, serialize_list, Schema};
pub use derive_traits::{FlexData, FlexField};

// Re-export the derive macro when the feature is enabled
#[cfg(feature = "derive")]
pub use flexbit_derive::FlexData;
