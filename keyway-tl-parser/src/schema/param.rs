use std::fmt;
use std::str::FromStr;

use crate::errors::ParamParseError;
use crate::schema::TypeExpr;

/// A flag reference inside a parameter type, e.g. `flags.3` in `flags.3?int`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FlagRef {
    /// Name of the `#` parameter that holds the bit (usually `"flags"`).
    pub mask: String,
    /// Bit index, 0-based.
    pub bit: u32,
}

/// The kind of a single parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// A `name:#` bitmask. Never stored by objects; computed when encoding.
    Mask,
    /// A value parameter, optionally guarded by a mask bit.
    Value {
        /// Wire type of the value.
        ty: TypeExpr,
        /// When `Some`, the value is on the wire only if the bit is set.
        flag: Option<FlagRef>,
    },
}

/// A single `name:type` parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Param {
    /// Parameter name as written in the descriptor.
    pub name: String,
    /// Parsed parameter type.
    pub ty: ParamType,
}

impl Param {
    /// The wire type of a value parameter, `None` for masks.
    pub fn value_type(&self) -> Option<&TypeExpr> {
        match &self.ty {
            ParamType::Mask => None,
            ParamType::Value { ty, .. } => Some(ty),
        }
    }

    /// The guarding flag of a value parameter.
    pub fn flag(&self) -> Option<&FlagRef> {
        match &self.ty {
            ParamType::Value { flag, .. } => flag.as_ref(),
            ParamType::Mask => None,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mask => write!(f, "#"),
            Self::Value { ty, flag } => {
                if let Some(flag) = flag {
                    write!(f, "{}.{}?", flag.mask, flag.bit)?;
                }
                write!(f, "{ty}")
            }
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.ty)
    }
}

impl FromStr for ParamType {
    type Err = ParamParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "#" {
            return Ok(Self::Mask);
        }

        let Some((flag_part, ty_part)) = s.split_once('?') else {
            return Ok(Self::Value { ty: s.parse()?, flag: None });
        };

        let (mask, bit) = flag_part.split_once('.').ok_or(ParamParseError::InvalidFlag)?;
        if mask.is_empty() {
            return Err(ParamParseError::InvalidFlag);
        }
        let bit = bit.parse::<u32>().map_err(|_| ParamParseError::InvalidFlag)?;
        if bit > 31 || ty_part.contains('?') {
            return Err(ParamParseError::InvalidFlag);
        }

        Ok(Self::Value {
            ty: ty_part.parse()?,
            flag: Some(FlagRef { mask: mask.to_owned(), bit }),
        })
    }
}

impl FromStr for Param {
    type Err = ParamParseError;

    /// Parses a token such as `flags:#`, `pq:bytes` or `retry:flags.0?int`.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token.starts_with('{') {
            return Err(ParamParseError::Unsupported(token.to_owned()));
        }

        let (name, ty) = token.split_once(':').ok_or(ParamParseError::MissingType)?;
        if name.is_empty() || ty.is_empty() {
            return Err(ParamParseError::Empty);
        }

        Ok(Self { name: name.to_owned(), ty: ty.parse()? })
    }
}
