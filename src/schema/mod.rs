//! Class metadata and its evolution across program versions.

pub mod types;
pub mod descriptor;
pub mod builder;
pub mod meta_file;
pub mod store;

pub use builder::{BuildOptions, BuildReport, SchemaBuilder};
pub use descriptor::{
    EncodingHint, MemberAttrs, MemberDescriptor, MemberType, TypeDescriptor, TypeScope, TypeShape,
};
pub use store::{DirMetaStore, MemoryMetaStore, MetaStore, META_EXTENSION};
pub use types::{
    AssignableType, BitWidth, FlexClassInfo, FlexDetail, FlexMemberInfo, MemberKind, ObjectDetail,
    ScalarDetail, ScalarKind,
};
