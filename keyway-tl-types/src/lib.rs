//! Schema-driven TL codec and the MTProto handshake entities.
//!
//! Every object type carries the TL descriptor it was declared from and an
//! ordered table of field accessors. The codec walks the parsed descriptor,
//! writing masks and values in schema order, so the wire format of a type is
//! decided by its descriptor rather than by hand-written serializers.
//!
//! | Module        | Contents                                                      |
//! |---------------|---------------------------------------------------------------|
//! | [`codec`]     | [`TlObject`], [`codec::FieldValue`], `encode`/`decode`/`estimate_size` |
//! | [`mtproto`]   | Handshake constructors, functions and polymorphic results     |
//! | [`deserialize`] | [`Cursor`] and the [`Deserializable`] trait                 |
//! | [`serialize`] | [`Serializable`] and the primitive writers                    |
//!
//! # Usage
//!
//! ```rust
//! use keyway_tl_types::{mtproto, Deserializable, Serializable};
//!
//! let req = mtproto::ReqPqMulti { nonce: [7; 16] };
//! let bytes = req.to_bytes().unwrap();
//! assert_eq!(&bytes[..4], &0xbe7e8ef1u32.to_le_bytes());
//! assert_eq!(mtproto::ReqPqMulti::from_bytes(&bytes).unwrap(), req);
//! ```

#![deny(unsafe_code)]

pub mod codec;
pub mod deserialize;
mod error;
mod macros;
pub mod mtproto;
pub mod serialize;

pub use codec::TlObject;
pub use deserialize::{Cursor, Deserializable};
pub use error::{Error, Result};
pub use keyway_tl_parser::TypeExpr;
pub use serialize::Serializable;

/// Constructor id that precedes the element count of a boxed `Vector<T>`.
pub const VECTOR_ID: u32 = 0x1cb5c415;
/// `boolTrue` constructor id.
pub const BOOL_TRUE_ID: u32 = 0x997275b5;
/// `boolFalse` constructor id.
pub const BOOL_FALSE_ID: u32 = 0xbc799737;

/// Marks a function type that can be sent as an RPC call.
///
/// `Return` is the type the server responds with.
pub trait RemoteCall: Serializable {
    /// The deserialized response type.
    type Return: Deserializable;
}
