//! Source of the secret bytes the handshake needs.

use std::fmt;

/// The random source could not produce bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomError(pub String);

impl fmt::Display for RandomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "random source failed: {}", self.0)
    }
}

impl std::error::Error for RandomError {}

/// Fills buffers with cryptographically secure random bytes.
pub trait RandomSource: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<(), RandomError>;
}

/// The operating system's generator.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), RandomError> {
        getrandom::getrandom(buf).map_err(|e| RandomError(e.to_string()))
    }
}

pub(crate) fn array<const N: usize>(rng: &dyn RandomSource) -> Result<[u8; N], RandomError> {
    let mut out = [0u8; N];
    rng.fill(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_random_fills() {
        let a: [u8; 32] = array(&OsRandom).unwrap();
        let b: [u8; 32] = array(&OsRandom).unwrap();
        assert_ne!(a, b);
    }
}
