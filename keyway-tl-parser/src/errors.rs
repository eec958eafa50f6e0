use std::fmt;
use std::num::ParseIntError;

/// Errors produced while parsing a single `name:type` token.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamParseError {
    /// An empty name or type where one was required.
    Empty,
    /// A `mask.N?Type` expression was malformed.
    InvalidFlag,
    /// A `Vector<…>` argument was malformed (missing closing `>`).
    InvalidGeneric,
    /// A token without `:type`.
    MissingType,
    /// Generic definitions (`{X:Type}`, `!X`) have no wire form the codec knows.
    Unsupported(String),
}

impl fmt::Display for ParamParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty token"),
            Self::InvalidFlag => write!(f, "invalid flag expression"),
            Self::InvalidGeneric => write!(f, "invalid generic argument (unclosed `<`)"),
            Self::MissingType => write!(f, "parameter without `:type`"),
            Self::Unsupported(tok) => write!(f, "unsupported parameter syntax: {tok}"),
        }
    }
}

impl std::error::Error for ParamParseError {}

/// Errors produced while parsing a complete descriptor.
#[derive(Clone, Debug, PartialEq)]
pub enum ParseError {
    /// The input was blank.
    Empty,
    /// No `= Type` was found.
    MissingResultType,
    /// The name (before `#` or the first parameter) was missing.
    MissingName,
    /// The `#id` hex literal was unparseable.
    InvalidId(ParseIntError),
    /// A parameter was invalid.
    InvalidParam(ParamParseError),
    /// A `mask.N?Type` parameter refers to a mask not declared before it.
    UndeclaredMask(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty descriptor"),
            Self::MissingResultType => write!(f, "missing `= Type`"),
            Self::MissingName => write!(f, "missing or malformed name"),
            Self::InvalidId(e) => write!(f, "invalid constructor id: {e}"),
            Self::InvalidParam(e) => write!(f, "invalid parameter: {e}"),
            Self::UndeclaredMask(name) => write!(f, "flag refers to undeclared mask `{name}`"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidId(e) => Some(e),
            Self::InvalidParam(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParamParseError> for ParseError {
    fn from(e: ParamParseError) -> Self {
        Self::InvalidParam(e)
    }
}
