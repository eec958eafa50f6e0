//! Error types for keyway-client.

use std::{fmt, io};

use keyway_mtproto::{ErrorKind, authentication, message, transport};

// ─── TransportError ───────────────────────────────────────────────────────────

/// A connection failed or was never made.
#[derive(Debug)]
pub enum TransportError {
    /// Socket I/O failure.
    Io(io::Error),
    /// The server sent an abridged error code (e.g. `-404`).
    Code(i32),
    /// Outbound payload could not be framed.
    Framing(transport::Error),
    /// The connection or pool has shut down.
    Closed,
    /// No address is configured for this DC.
    UnknownDc(i32),
    /// Nothing arrived within the configured time.
    Timeout,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e)         => write!(f, "I/O error: {e}"),
            Self::Code(code)    => write!(f, "transport error code {code}"),
            Self::Framing(e)    => write!(f, "{e}"),
            Self::Closed        => write!(f, "connection closed"),
            Self::UnknownDc(dc) => write!(f, "no address known for DC{dc}"),
            Self::Timeout       => write!(f, "timed out waiting for the server"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Framing(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> Self { Self::Io(e) }
}

impl From<transport::Error> for TransportError {
    fn from(e: transport::Error) -> Self {
        match e {
            transport::Error::Code(code) => Self::Code(code),
            other => Self::Framing(other),
        }
    }
}

// ─── AuthError ────────────────────────────────────────────────────────────────

/// Why [`crate::AuthKeyGenerator::get_key`] produced no key.
#[derive(Debug)]
pub enum AuthError {
    /// A handshake step rejected the exchange.
    Handshake(authentication::Error),
    /// A frame was not a valid unsecured message.
    Message(message::Error),
    Transport(TransportError),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Handshake(e) => e.kind(),
            Self::Message(e)   => e.kind(),
            Self::Transport(_) => ErrorKind::TransportFailure,
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handshake(e) => write!(f, "handshake failed ({}): {e}", e.kind()),
            Self::Message(e)   => write!(f, "bad frame ({}): {e}", e.kind()),
            Self::Transport(e) => write!(f, "transport failure: {e}"),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Handshake(e) => Some(e),
            Self::Message(e)   => Some(e),
            Self::Transport(e) => Some(e),
        }
    }
}

impl From<authentication::Error> for AuthError {
    fn from(e: authentication::Error) -> Self { Self::Handshake(e) }
}

impl From<message::Error> for AuthError {
    fn from(e: message::Error) -> Self { Self::Message(e) }
}

impl From<TransportError> for AuthError {
    fn from(e: TransportError) -> Self { Self::Transport(e) }
}
