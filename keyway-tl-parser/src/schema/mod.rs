//! Parsed form of a TL descriptor.

mod kind;
mod param;
mod type_expr;
mod type_schema;

pub use kind::Kind;
pub use param::{FlagRef, Param, ParamType};
pub use type_expr::TypeExpr;
pub use type_schema::TypeSchema;
