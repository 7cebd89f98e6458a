use crate::codec::bit_buffer::Mode;

/// Errors raised by the bit buffer itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("bit buffer is in {actual} mode, operation requires {expected} mode")]
    WrongMode { expected: Mode, actual: Mode },

    #[error("bit buffer is closed, its bytes were already taken")]
    Closed,

    #[error("cannot access {0} bits at once, the limit is 64")]
    WidthTooLarge(u32),

    #[error("read of {requested} bits at bit {position} overruns buffer of {length} bits")]
    OutOfBounds {
        position: usize,
        requested: usize,
        length: usize,
    },
}

/// Errors from the bit encoder.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error("string of length {len} exceeds the maximum of {max}")]
    StringTooLong { len: usize, max: usize },

    #[error("{what} {value} is out of range [{min}, {max}]")]
    OutOfRange {
        what: &'static str,
        value: i128,
        min: i128,
        max: i128,
    },

    #[error("type mismatch for member '{member}': expected {expected}, got {actual}")]
    TypeMismatch {
        member: String,
        expected: String,
        actual: String,
    },

    #[error("type '{type_name}' is not assignable to member '{member}'")]
    NotAssignable { member: String, type_name: String },

    #[error("unknown type '{0}'")]
    UnknownType(String),

    #[error("null element in member '{0}' whose elements cannot be null")]
    UnexpectedNull(String),

    #[error("objects nested deeper than {limit} levels")]
    TooDeep { limit: usize },
}

/// Errors from the bit decoder.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error("invalid utf-8 string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("unknown string encoding set {0}")]
    UnknownEncodingSet(u8),

    #[error("unknown member id {id} in type '{type_name}'")]
    UnknownMember { type_name: String, id: u16 },

    #[error("unknown type '{0}'")]
    UnknownType(String),

    #[error("unknown type id {0}")]
    UnknownTypeId(u16),

    #[error("type index {index} out of range for member '{member}' with {count} assignable types")]
    TypeIndexOutOfRange {
        member: String,
        index: u16,
        count: usize,
    },

    #[error("missing member '{member}' in type '{type_name}'")]
    MissingMember { type_name: String, member: String },

    #[error("type mismatch for '{member}': expected {expected}, got {actual}")]
    TypeMismatch {
        member: String,
        expected: String,
        actual: String,
    },

    #[error("objects nested deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Errors from building or persisting schema metadata.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error(
        "configuration of member '{member}' in type '{type_name}' changed from {old} to {new}; \
         give the member a new, previously unused name"
    )]
    BreakingChange {
        type_name: String,
        member: String,
        old: String,
        new: String,
    },

    #[error("member '{member}' of type '{type_name}' is not supported: {reason}")]
    UnsupportedShape {
        type_name: String,
        member: String,
        reason: String,
    },

    #[error("type '{type_name}' has {count} members, at most 511 ids are available")]
    TooManyMembers { type_name: String, count: usize },

    #[error("no type id left for '{0}', at most 32768 types are available")]
    TooManyTypes(String),

    #[error("type '{type_name}' depends on '{dependency}', which failed to build")]
    DependencyFailed {
        type_name: String,
        dependency: String,
    },

    #[error("unknown type '{0}'")]
    UnknownType(String),

    #[error("metadata encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("metadata decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("metadata store i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error type that wraps all sub-errors.
#[derive(Debug, thiserror::Error)]
pub enum FlexError {
    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("the global schema has not been initialized")]
    NotInitialized,

    #[error("the global schema is already initialized")]
    AlreadyInitialized,
}

/// Result type alias for flexbit operations.
pub type Result<T> = std::result::Result<T, FlexError>;
