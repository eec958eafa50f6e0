use std::fmt;
use std::str::FromStr;

use crate::errors::ParamParseError;

/// The wire type of a value parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// `int`: 4 bytes little-endian.
    Int,
    /// `long`: 8 bytes little-endian.
    Long,
    /// `double`: 8 bytes IEEE-754 little-endian.
    Double,
    /// `int128`: 16 raw bytes.
    Int128,
    /// `int256`: 32 raw bytes.
    Int256,
    /// `true`: no bytes, presence is its flag bit.
    True,
    /// `Bool`: a `boolTrue`/`boolFalse` constructor id.
    Bool,
    /// `date`: 4-byte Unix seconds.
    Date,
    /// `bytes`: length-prefixed, padded to 4.
    Bytes,
    /// `string`: like `bytes`, holding UTF-8.
    String,
    /// `Vector<T>` (boxed, with the vector constructor id) or `vector<T>` (bare).
    Vector {
        /// Whether the `0x1cb5c415` marker precedes the count.
        boxed: bool,
        /// Element type.
        item: Box<TypeExpr>,
    },
    /// Any other type, encoded by its own constructor.
    Named {
        /// Full name including namespace, e.g. `Server_DH_Params`.
        name: String,
        /// Lowercase names are bare: no leading constructor id.
        bare: bool,
    },
}

impl TypeExpr {
    /// Fixed encoded width, if the type has one.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            Self::Int | Self::Date | Self::Bool => Some(4),
            Self::Long | Self::Double => Some(8),
            Self::Int128 => Some(16),
            Self::Int256 => Some(32),
            Self::True => Some(0),
            _ => None,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Long => write!(f, "long"),
            Self::Double => write!(f, "double"),
            Self::Int128 => write!(f, "int128"),
            Self::Int256 => write!(f, "int256"),
            Self::True => write!(f, "true"),
            Self::Bool => write!(f, "Bool"),
            Self::Date => write!(f, "date"),
            Self::Bytes => write!(f, "bytes"),
            Self::String => write!(f, "string"),
            Self::Vector { boxed: true, item } => write!(f, "Vector<{item}>"),
            Self::Vector { boxed: false, item } => write!(f, "vector<{item}>"),
            Self::Named { name, .. } => write!(f, "{name}"),
        }
    }
}

impl FromStr for TypeExpr {
    type Err = ParamParseError;

    /// Parses a type such as `long`, `Vector<long>` or `Server_DH_Params`.
    ///
    /// # Examples
    /// ```
    /// use keyway_tl_parser::TypeExpr;
    /// assert!(matches!("Vector<long>".parse::<TypeExpr>(), Ok(TypeExpr::Vector { boxed: true, .. })));
    /// assert!("!X".parse::<TypeExpr>().is_err());
    /// ```
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.is_empty() {
            return Err(ParamParseError::Empty);
        }
        if raw.starts_with('!') {
            return Err(ParamParseError::Unsupported(raw.to_owned()));
        }

        if let Some((outer, rest)) = raw.split_once('<') {
            let inner = rest.strip_suffix('>').ok_or(ParamParseError::InvalidGeneric)?;
            let boxed = match outer {
                "Vector" => true,
                "vector" => false,
                _ => return Err(ParamParseError::Unsupported(raw.to_owned())),
            };
            return Ok(Self::Vector { boxed, item: Box::new(inner.parse()?) });
        }

        let expr = match raw {
            "int" => Self::Int,
            "long" => Self::Long,
            "double" => Self::Double,
            "int128" => Self::Int128,
            "int256" => Self::Int256,
            "true" => Self::True,
            "Bool" => Self::Bool,
            "date" => Self::Date,
            "bytes" => Self::Bytes,
            "string" => Self::String,
            _ => {
                let name = raw.strip_prefix('%').unwrap_or(raw);
                let local = name.rsplit('.').next().unwrap_or(name);
                if name.split('.').any(str::is_empty) {
                    return Err(ParamParseError::Empty);
                }
                let bare = raw.starts_with('%') || local.starts_with(|c: char| c.is_ascii_lowercase());
                Self::Named { name: name.to_owned(), bare }
            }
        };
        Ok(expr)
    }
}
