//! MTProto plaintext layer and auth key exchange.
//!
//! This crate handles:
//! * message ids from a server-corrected clock
//! * unsecured message framing over pooled buffers
//! * the abridged transport codec
//! * the sans-io auth key handshake
//!
//! It does no I/O of its own: bring your own socket.

#![deny(unsafe_code)]

use std::fmt;

pub mod authentication;
pub mod clock;
pub mod message;
pub mod pool;
pub mod random;
pub mod transport;

pub use clock::MsgIdClock;
pub use message::UnsecuredMessage;
pub use pool::{BufferPool, PooledBuffer};
pub use random::{OsRandom, RandomSource};

/// Coarse classification shared by every error the handshake can end with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The peer sent something malformed or unexpected.
    ProtocolViolation,
    CryptoFailure,
    /// No offered server key is known locally.
    KeyNotFound,
    /// A step ran without the state an earlier step should have produced.
    StateViolation,
    TransportFailure,
    /// The peer used a feature this crate does not implement.
    Unimplemented,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ProtocolViolation => "protocol violation",
            Self::CryptoFailure => "crypto failure",
            Self::KeyNotFound => "key not found",
            Self::StateViolation => "state violation",
            Self::TransportFailure => "transport failure",
            Self::Unimplemented => "unimplemented",
        };
        f.write_str(name)
    }
}

/// Lowercase hex, for log lines and message dumps.
pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    #[test]
    fn hex_is_lowercase_and_unseparated() {
        assert_eq!(super::hex(&[0x00, 0xab, 0x7f]), "00ab7f");
    }
}
