//! Cryptographic primitives for the MTProto auth key exchange.
//!
//! Provides:
//! - AES-256-IGE encryption/decryption
//! - a SHA-1 macro over concatenated slices
//! - Pollard-rho factorization of `pq`
//! - RSA public keys, fingerprints and the [`rsa::KeyStore`] lookup
//! - [`AuthKey`] and the new-nonce hashes derived from it
//! - the temporary AES key/IV derived from the handshake nonces

#![deny(unsafe_code)]

pub mod aes;
mod auth_key;
mod factorize;
pub mod rsa;
mod sha;

pub use auth_key::AuthKey;
pub use factorize::{factorize, FactorizeError};

#[doc(hidden)]
pub use ::sha1 as __sha1;

/// Derive the `(key, iv)` pair that protects `server_DH_inner_data` and
/// `client_DH_inner_data`.
///
/// ```text
/// key = SHA1(new_nonce ‖ server_nonce) ‖ SHA1(server_nonce ‖ new_nonce)[0..12]
/// iv  = SHA1(server_nonce ‖ new_nonce)[12..20] ‖ SHA1(new_nonce ‖ new_nonce) ‖ new_nonce[0..4]
/// ```
pub fn generate_key_data_from_nonce(server_nonce: &[u8; 16], new_nonce: &[u8; 32]) -> ([u8; 32], [u8; 32]) {
    let h1 = sha1!(new_nonce, server_nonce);
    let h2 = sha1!(server_nonce, new_nonce);
    let h3 = sha1!(new_nonce, new_nonce);

    let mut key = [0u8; 32];
    key[..20].copy_from_slice(&h1);
    key[20..].copy_from_slice(&h2[..12]);

    let mut iv = [0u8; 32];
    iv[..8].copy_from_slice(&h2[12..]);
    iv[8..28].copy_from_slice(&h3);
    iv[28..].copy_from_slice(&new_nonce[..4]);

    (key, iv)
}
