//! The [`Serializable`] trait and the primitive TL writers.
//!
//! Encoding follows the [MTProto Binary Serialization] rules.
//!
//! [MTProto Binary Serialization]: https://core.telegram.org/mtproto/serialize

use crate::error::Result;

/// Serialize `self` into TL binary format.
pub trait Serializable {
    /// Appends the serialized form of `self` to `buf`.
    fn serialize(&self, buf: &mut Vec<u8>) -> Result<()>;

    /// Exact number of bytes [`Serializable::serialize`] will append.
    fn serialized_len(&self) -> Result<usize>;

    /// Convenience: allocate an exactly sized `Vec<u8>` and serialize into it.
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut v = Vec::with_capacity(self.serialized_len()?);
        self.serialize(&mut v)?;
        Ok(v)
    }
}

pub fn write_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub fn write_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub fn write_i64(buf: &mut Vec<u8>, v: i64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// TL `bytes`/`string` encoding: a length-prefixed, 4-byte aligned byte string.
///
/// * `len < 254`: `[len as u8][data][0-padding]`
/// * `len ≥ 254`: `[0xfe][len as 3 LE bytes][data][0-padding]`
pub fn write_tl_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    let len = data.len();
    if len < 254 {
        buf.push(len as u8);
    } else {
        buf.push(0xfe);
        buf.extend_from_slice(&(len as u32).to_le_bytes()[..3]);
    }
    buf.extend_from_slice(data);
    buf.resize(buf.len() + padding(len), 0);
}

/// Encoded length of a `bytes`/`string` value holding `len` bytes.
pub fn tl_bytes_len(len: usize) -> usize {
    header_len(len) + len + padding(len)
}

fn header_len(len: usize) -> usize {
    if len < 254 { 1 } else { 4 }
}

fn padding(len: usize) -> usize {
    (4 - (header_len(len) + len) % 4) % 4
}
