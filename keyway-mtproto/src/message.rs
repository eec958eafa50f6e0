//! Plaintext (unsecured) MTProto messages.
//!
//! ```text
//! auth_key_id:long  (0)
//! message_id:long
//! message_data_length:int
//! message_data:bytes
//! ```

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use keyway_tl_types::{Serializable, TlObject, codec};

use crate::{ErrorKind, hex};
use crate::clock::MsgIdClock;
use crate::pool::{BufferPool, PooledBuffer};

/// Size of the fixed header in front of the content.
pub const HEADER_LEN: usize = 8 + 8 + 4;

/// Errors building or parsing an [`UnsecuredMessage`].
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// The frame is shorter than its header or its declared content.
    Truncated { declared: usize, available: usize },
    /// The declared content length was negative.
    InvalidLength(i32),
    /// A non-zero auth key id: the frame is encrypted.
    Encrypted { auth_key_id: i64 },
    /// The content could not be serialized.
    Codec(keyway_tl_types::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { declared, available } => {
                write!(f, "frame truncated: needs {declared} bytes, has {available}")
            }
            Self::InvalidLength(len) => write!(f, "negative content length {len}"),
            Self::Encrypted { auth_key_id } => {
                write!(f, "expected an unsecured frame, got auth_key_id {auth_key_id:#018x}")
            }
            Self::Codec(e) => write!(f, "content serialization failed: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Encrypted { .. } => ErrorKind::Unimplemented,
            Self::Truncated { .. } | Self::InvalidLength(_) | Self::Codec(_) => ErrorKind::ProtocolViolation,
        }
    }
}

impl From<keyway_tl_types::Error> for Error {
    fn from(e: keyway_tl_types::Error) -> Self {
        Self::Codec(e)
    }
}

/// One framed plaintext message held in a pooled buffer.
pub struct UnsecuredMessage {
    buf: PooledBuffer,
    msg_id: i64,
    content: Range<usize>,
}

impl UnsecuredMessage {
    /// Frame `obj` under a fresh id from `clock`.
    pub fn from_object<T: TlObject + Serializable>(
        obj: &T,
        clock: &MsgIdClock,
        pool: &Arc<BufferPool>,
    ) -> Result<Self, Error> {
        let size = codec::estimate_size(obj)?;
        let msg_id = clock.next_id();

        let mut buf = pool.rent(HEADER_LEN + size);
        buf.extend_from_slice(&0i64.to_le_bytes());
        buf.extend_from_slice(&msg_id.to_le_bytes());
        buf.extend_from_slice(&(size as i32).to_le_bytes());
        obj.serialize(&mut buf)?;

        let content = HEADER_LEN..buf.len();
        Ok(Self { buf, msg_id, content })
    }

    /// Parse a received frame and let the server's id correct `clock`.
    pub fn from_bytes(bytes: &[u8], clock: &MsgIdClock, pool: &Arc<BufferPool>) -> Result<Self, Error> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::Truncated { declared: HEADER_LEN, available: bytes.len() });
        }
        let word = |at: usize| {
            let mut b = [0u8; 8];
            b.copy_from_slice(&bytes[at..at + 8]);
            i64::from_le_bytes(b)
        };

        let auth_key_id = word(0);
        if auth_key_id != 0 {
            return Err(Error::Encrypted { auth_key_id });
        }
        let msg_id = word(8);
        let len = i32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
        let len = usize::try_from(len).map_err(|_| Error::InvalidLength(len))?;
        let end = HEADER_LEN + len;
        if bytes.len() < end {
            return Err(Error::Truncated { declared: end, available: bytes.len() });
        }

        clock.correct_offset(msg_id);

        let mut buf = pool.rent(end);
        buf.extend_from_slice(&bytes[..end]);
        Ok(Self { buf, msg_id, content: HEADER_LEN..end })
    }

    pub fn msg_id(&self) -> i64 {
        self.msg_id
    }

    /// The whole frame, header included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn content(&self) -> &[u8] {
        &self.buf[self.content.clone()]
    }

    /// Return the buffer to its pool.
    pub fn release(self) {}
}

impl fmt::Debug for UnsecuredMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnsecuredMessage")
            .field("msg_id", &format_args!("{:#018x}", self.msg_id))
            .field("len", &self.content.len())
            .finish()
    }
}

impl fmt::Display for UnsecuredMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.as_bytes();
        writeln!(f, "auth_key_id: {}", hex(&bytes[..8]))?;
        writeln!(f, "msg_id:      {}", hex(&bytes[8..16]))?;
        writeln!(f, "length:      {}", hex(&bytes[16..20]))?;
        for (row, line) in self.content().chunks(16).enumerate() {
            write!(f, "{:04x}:", row * 16)?;
            for group in line.chunks(4) {
                write!(f, " {}", hex(group))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
