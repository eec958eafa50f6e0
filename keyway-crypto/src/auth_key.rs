//! The 256-byte key produced by the DH exchange.

use crate::sha1;

/// An authorization key plus the identifiers derived from its SHA-1.
#[derive(Clone)]
pub struct AuthKey {
    data: [u8; 256],
    aux_hash: [u8; 8],
    key_id: [u8; 8],
}

impl AuthKey {
    /// Wrap raw DH output.
    pub fn from_bytes(data: [u8; 256]) -> Self {
        let sha = sha1!(&data);
        let mut aux_hash = [0u8; 8];
        aux_hash.copy_from_slice(&sha[..8]);
        let mut key_id = [0u8; 8];
        key_id.copy_from_slice(&sha[12..]);
        Self { data, aux_hash, key_id }
    }

    pub fn to_bytes(&self) -> [u8; 256] {
        self.data
    }

    /// `SHA1(key)[12..20]`.
    pub fn key_id(&self) -> [u8; 8] {
        self.key_id
    }

    /// `SHA1(new_nonce ‖ number ‖ aux_hash)[4..20]`, the value `dh_gen_ok`
    /// (number 1), `dh_gen_retry` (2) and `dh_gen_fail` (3) carry.
    pub fn calc_new_nonce_hash(&self, new_nonce: &[u8; 32], number: u8) -> [u8; 16] {
        let sha = sha1!(new_nonce, [number], &self.aux_hash);
        let mut out = [0u8; 16];
        out.copy_from_slice(&sha[4..]);
        out
    }
}

impl std::fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthKey(id={:016x})", u64::from_le_bytes(self.key_id))
    }
}

impl PartialEq for AuthKey {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for AuthKey {}
