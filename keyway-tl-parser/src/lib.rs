//! Parser for TL constructor descriptors.
//!
//! A descriptor is a single line of the [Type Language]:
//!
//! ```text
//! resPQ#05162463 nonce:int128 server_nonce:int128 pq:bytes = ResPQ
//! ```
//!
//! Parsing turns it into a [`TypeSchema`]: the 32-bit constructor id, the
//! constructor name, the boxed result type and the ordered parameter list,
//! with every parameter type resolved into a [`TypeExpr`] the codec can act
//! on directly.
//!
//! # Quick start
//!
//! ```rust
//! use keyway_tl_parser::{schema_for, TypeExpr};
//!
//! let schema = schema_for("req_pq_multi#be7e8ef1 nonce:int128 = ResPQ").unwrap();
//! assert_eq!(schema.id, 0xbe7e8ef1);
//! assert_eq!(schema.params[0].value_type(), Some(&TypeExpr::Int128));
//! ```
//!
//! [Type Language]: https://core.telegram.org/mtproto/TL

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Parse error types for TL descriptors.
pub mod errors;
pub mod schema;
mod cache;
mod crc;
mod listing;

pub use cache::schema_for;
pub use errors::{ParamParseError, ParseError};
pub use schema::{FlagRef, Kind, Param, ParamType, TypeExpr, TypeSchema};

/// Parses a combined listing of descriptors, yielding [`TypeSchema`]s one by one.
///
/// Blank lines and `//` comments are skipped. A definition may span several
/// lines and ends at `;`. The `--functions--` marker (also spelled
/// `---functions---`) switches every following definition to
/// [`Kind::Function`]; `---types---` switches back.
pub fn parse_listing(contents: &str) -> impl Iterator<Item = Result<TypeSchema, ParseError>> + '_ {
    listing::Listing::new(contents)
}
