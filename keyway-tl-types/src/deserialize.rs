//! The [`Deserializable`] trait and the [`Cursor`] it reads from.

use crate::error::{Error, Result};

/// A zero-copy cursor over an in-memory byte slice.
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor positioned at the start of `buf`.
    pub fn from_slice(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current byte offset.
    pub fn pos(&self) -> usize { self.pos }

    /// Remaining bytes.
    pub fn remaining(&self) -> usize { self.buf.len() - self.pos }

    /// Read a single byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        let b = *self.buf.get(self.pos).ok_or(Error::UnexpectedEof)?;
        self.pos += 1;
        Ok(b)
    }

    /// Borrow the next `len` bytes and advance past them.
    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(Error::UnexpectedEof)?;
        let out = self.buf.get(self.pos..end).ok_or(Error::UnexpectedEof)?;
        self.pos = end;
        Ok(out)
    }

    /// Read a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_slice(N)?);
        Ok(out)
    }

    pub fn read_u32(&mut self) -> Result<u32> { self.read_array().map(u32::from_le_bytes) }

    pub fn read_i32(&mut self) -> Result<i32> { self.read_array().map(i32::from_le_bytes) }

    pub fn read_i64(&mut self) -> Result<i64> { self.read_array().map(i64::from_le_bytes) }

    pub fn read_f64(&mut self) -> Result<f64> { self.read_array().map(f64::from_le_bytes) }

    /// Look at the next constructor id without consuming it.
    pub fn peek_u32(&self) -> Result<u32> {
        let raw = self.buf.get(self.pos..self.pos + 4).ok_or(Error::UnexpectedEof)?;
        let mut id = [0u8; 4];
        id.copy_from_slice(raw);
        Ok(u32::from_le_bytes(id))
    }

    /// Read a TL `bytes`/`string` body: length prefix, payload, alignment.
    pub fn read_tl_bytes(&mut self) -> Result<&'a [u8]> {
        let first = self.read_byte()?;
        let (len, header) = if first < 254 {
            (first as usize, 1)
        } else {
            let l = self.read_array::<3>()?;
            (l[0] as usize | (l[1] as usize) << 8 | (l[2] as usize) << 16, 4)
        };
        let data = self.read_slice(len)?;
        self.read_slice((4 - (header + len) % 4) % 4)?;
        Ok(data)
    }

    /// Consume all remaining bytes.
    pub fn read_to_end(&mut self) -> &'a [u8] {
        let rest = &self.buf[self.pos..];
        self.pos = self.buf.len();
        rest
    }
}

/// Alias used by the codec and the generated entity impls.
pub type Buffer<'a, 'b> = &'a mut Cursor<'b>;

/// Deserialize a value from TL binary format.
pub trait Deserializable: Sized {
    /// Read `Self` from `buf`, advancing its position.
    fn deserialize(buf: Buffer) -> Result<Self>;

    /// Convenience: deserialize from a byte slice.
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::deserialize(&mut Cursor::from_slice(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_bytes_header() {
        let mut raw = vec![254, 0x2c, 0x01, 0x00];
        raw.extend(std::iter::repeat_n(0xaa, 300));
        let mut cur = Cursor::from_slice(&raw);
        assert_eq!(cur.read_tl_bytes().unwrap().len(), 300);
        assert_eq!(cur.remaining(), 0);
    }

    #[test]
    fn peek_does_not_advance() {
        let raw = 0x05162463u32.to_le_bytes();
        let cur = Cursor::from_slice(&raw);
        assert_eq!(cur.peek_u32().unwrap(), 0x05162463);
        assert_eq!(cur.pos(), 0);
    }

    #[test]
    fn truncated_reads_fail() {
        let mut cur = Cursor::from_slice(&[5, 1, 2]);
        assert_eq!(cur.read_tl_bytes(), Err(Error::UnexpectedEof));
        assert_eq!(Cursor::from_slice(&[1, 2]).read_u32(), Err(Error::UnexpectedEof));
    }
}
