use std::fmt;
use std::str::FromStr;

use crate::crc::descriptor_id;
use crate::errors::ParseError;
use crate::schema::{Kind, Param, ParamType};

/// A parsed constructor or function descriptor.
///
/// ```text
/// p_q_inner_data#83c95aec pq:bytes p:bytes q:bytes nonce:int128 ... = P_Q_inner_data
/// ```
/// becomes `name = "p_q_inner_data"`, `id = 0x83c95aec`,
/// `result_type = "P_Q_inner_data"` and one [`Param`] per token.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeSchema {
    /// Constructor id: the first 4 bytes of every encoded instance.
    pub id: u32,
    /// Constructor name including any namespace, e.g. `"auth.sentCode"`.
    pub name: String,
    /// The boxed type this constructor belongs to.
    pub result_type: String,
    /// Parameters in wire order, masks included.
    pub params: Vec<Param>,
    /// Constructor or function; set by the listing parser.
    pub kind: Kind,
}

impl TypeSchema {
    /// Value parameters in wire order, skipping masks.
    pub fn values(&self) -> impl Iterator<Item = &Param> {
        self.params.iter().filter(|p| !matches!(p.ty, ParamType::Mask))
    }
}

impl fmt::Display for TypeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:08x}", self.name, self.id)?;
        for p in &self.params {
            write!(f, " {p}")?;
        }
        write!(f, " = {}", self.result_type)
    }
}

impl FromStr for TypeSchema {
    type Err = ParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim().trim_end_matches(';').trim();
        if raw.is_empty() {
            return Err(ParseError::Empty);
        }

        let (lhs, result_type) = raw.split_once('=').ok_or(ParseError::MissingResultType)?;
        let result_type = result_type.trim();
        if result_type.is_empty() || result_type.contains(char::is_whitespace) {
            return Err(ParseError::MissingResultType);
        }

        let mut tokens = lhs.split_whitespace();
        let head = tokens.next().ok_or(ParseError::MissingName)?;
        let (name, explicit_id) = match head.split_once('#') {
            Some((n, id)) => (n, Some(id)),
            None => (head, None),
        };
        if name.is_empty() || name.split('.').any(str::is_empty) {
            return Err(ParseError::MissingName);
        }

        let id = match explicit_id {
            Some(hex) => u32::from_str_radix(hex, 16).map_err(ParseError::InvalidId)?,
            None => descriptor_id(raw),
        };

        let mut masks: Vec<&str> = Vec::new();
        let mut params = Vec::new();
        for token in tokens {
            let param: Param = token.parse()?;
            match &param.ty {
                ParamType::Mask => masks.push(token.split(':').next().unwrap_or_default()),
                ParamType::Value { flag: Some(flag), .. } if !masks.contains(&flag.mask.as_str()) => {
                    return Err(ParseError::UndeclaredMask(flag.mask.clone()));
                }
                ParamType::Value { .. } => {}
            }
            params.push(param);
        }

        Ok(Self {
            id,
            name: name.to_owned(),
            result_type: result_type.to_owned(),
            params,
            kind: Kind::Constructor,
        })
    }
}
