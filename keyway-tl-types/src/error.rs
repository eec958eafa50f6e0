use std::fmt;

use keyway_tl_parser::{ParseError, TypeExpr};

/// Errors produced while encoding or decoding TL values.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Ran out of bytes before the value was fully read.
    UnexpectedEof,
    /// A polymorphic read found a constructor id none of its variants use.
    UnexpectedConstructor { id: u32 },
    /// A concrete read found a constructor id other than its own.
    ConstructorMismatch { expected: u32, got: u32 },
    /// A boxed vector did not start with the vector constructor id.
    BadVectorMarker { id: u32 },
    /// A `Bool` value held neither `boolTrue` nor `boolFalse`.
    InvalidBool { id: u32 },
    /// A vector count was negative.
    InvalidLength(i32),
    /// A `string` value was not UTF-8.
    InvalidUtf8,
    /// A Rust field cannot hold the wire type the descriptor declares.
    TypeMismatch { expected: TypeExpr, rust: &'static str },
    /// The field table of a type does not line up with its descriptor.
    FieldMismatch { schema: String, param: String },
    /// A non-optional parameter had no value to write.
    MissingValue { param: &'static str },
    /// The type's descriptor could not be parsed.
    Schema(ParseError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of buffer"),
            Self::UnexpectedConstructor { id } => write!(f, "unexpected constructor id: {id:#010x}"),
            Self::ConstructorMismatch { expected, got } => {
                write!(f, "constructor mismatch: expected {expected:#010x}, got {got:#010x}")
            }
            Self::BadVectorMarker { id } => write!(f, "bad vector marker: {id:#010x}"),
            Self::InvalidBool { id } => write!(f, "invalid Bool constructor: {id:#010x}"),
            Self::InvalidLength(n) => write!(f, "invalid vector length: {n}"),
            Self::InvalidUtf8 => write!(f, "string is not valid UTF-8"),
            Self::TypeMismatch { expected, rust } => {
                write!(f, "`{rust}` cannot hold TL type `{expected}`")
            }
            Self::FieldMismatch { schema, param } => {
                write!(f, "field table of `{schema}` does not match parameter `{param}`")
            }
            Self::MissingValue { param } => write!(f, "missing value for `{param}`"),
            Self::Schema(e) => write!(f, "bad descriptor: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Schema(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Schema(e)
    }
}

/// Specialized `Result` for TL encoding and decoding.
pub type Result<T> = std::result::Result<T, Error>;
