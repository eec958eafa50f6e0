//! Sans-io [MTProto Abridged] framing.
//!
//! The client opens the stream with a single `0xef` byte; after that each
//! packet is `[len/4 as 1 or 4 bytes][payload]`. A payload of exactly four
//! bytes coming from the server is a negative transport error code rather
//! than a message.
//!
//! [MTProto Abridged]: https://core.telegram.org/mtproto/mtproto-transports#abridged

use std::fmt;

use crate::ErrorKind;

/// First byte sent on a fresh connection.
pub const MARKER: u8 = 0xef;

const EXTENDED: u8 = 0x7f;
const MAX_WORDS: usize = 1 << 24;

/// Abridged framing errors.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Payload length is not a whole number of 4-byte words.
    Unaligned { len: usize },
    /// Payload is longer than a 3-byte word count can describe.
    TooLarge { len: usize },
    /// The server answered with a transport error code (e.g. `-404`).
    Code(i32),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unaligned { len } => write!(f, "payload of {len} bytes is not word aligned"),
            Self::TooLarge { len } => write!(f, "payload of {len} bytes exceeds the abridged limit"),
            Self::Code(code) => write!(f, "transport error code {code}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::TransportFailure
    }
}

/// Length prefix for a payload of `len` bytes, appended to `out`.
pub fn encode_header(len: usize, out: &mut Vec<u8>) -> Result<(), Error> {
    if len % 4 != 0 {
        return Err(Error::Unaligned { len });
    }
    let words = len / 4;
    if words >= MAX_WORDS {
        return Err(Error::TooLarge { len });
    }
    if words < EXTENDED as usize {
        out.push(words as u8);
    } else {
        out.push(EXTENDED);
        out.extend_from_slice(&(words as u32).to_le_bytes()[..3]);
    }
    Ok(())
}

/// Header followed by `payload`, ready for the wire.
pub fn frame(payload: &[u8]) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(4 + payload.len());
    encode_header(payload.len(), &mut out)?;
    out.extend_from_slice(payload);
    Ok(out)
}

/// Reassembles frames from arbitrarily split reads.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes read from the socket.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes received but not yet part of a complete frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Take the next complete payload, if one has fully arrived.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, Error> {
        let Some(&first) = self.buf.first() else {
            return Ok(None);
        };
        let (header, words) = if first == EXTENDED {
            if self.buf.len() < 4 {
                return Ok(None);
            }
            (4, u32::from_le_bytes([self.buf[1], self.buf[2], self.buf[3], 0]) as usize)
        } else {
            (1, first as usize)
        };

        let end = header + words * 4;
        if self.buf.len() < end {
            return Ok(None);
        }

        let payload: Vec<u8> = self.buf.drain(..end).skip(header).collect();
        if payload.len() == 4 {
            let code = i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
            log::debug!("abridged: server sent transport error {code}");
            return Err(Error::Code(code));
        }
        log::trace!("abridged: frame of {} bytes, {} pending", payload.len(), self.buf.len());
        Ok(Some(payload))
    }
}
