//! AES-256 in Infinite Garble Extension mode.
//!
//! The 32-byte IV holds two 16-byte halves: the first is the "previous
//! ciphertext" block and the second the "previous plaintext" block, for both
//! directions. Each call is independent; no state survives between calls.

use std::fmt;

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes256;

/// Input was not a whole number of 16-byte blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct UnalignedInput(pub usize);

impl fmt::Display for UnalignedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IGE input of {} bytes is not a multiple of 16", self.0)
    }
}

impl std::error::Error for UnalignedInput {}

fn check(len: usize) -> Result<(), UnalignedInput> {
    if len % 16 == 0 { Ok(()) } else { Err(UnalignedInput(len)) }
}

fn xor_block(block: &mut [u8], with: &[u8; 16]) {
    block.iter_mut().zip(with).for_each(|(b, w)| *b ^= w);
}

/// Encrypt `buffer` in place.
pub fn ige_encrypt(buffer: &mut [u8], key: &[u8; 32], iv: &[u8; 32]) -> Result<(), UnalignedInput> {
    check(buffer.len())?;
    let cipher = Aes256::new(GenericArray::from_slice(key));

    let mut prev_cipher = [0u8; 16];
    let mut prev_plain = [0u8; 16];
    prev_cipher.copy_from_slice(&iv[..16]);
    prev_plain.copy_from_slice(&iv[16..]);

    for block in buffer.chunks_exact_mut(16) {
        let mut plain = [0u8; 16];
        plain.copy_from_slice(block);

        xor_block(block, &prev_cipher);
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
        xor_block(block, &prev_plain);

        prev_cipher.copy_from_slice(block);
        prev_plain = plain;
    }
    Ok(())
}

/// Decrypt `buffer` in place.
pub fn ige_decrypt(buffer: &mut [u8], key: &[u8; 32], iv: &[u8; 32]) -> Result<(), UnalignedInput> {
    check(buffer.len())?;
    let cipher = Aes256::new(GenericArray::from_slice(key));

    let mut prev_cipher = [0u8; 16];
    let mut prev_plain = [0u8; 16];
    prev_cipher.copy_from_slice(&iv[..16]);
    prev_plain.copy_from_slice(&iv[16..]);

    for block in buffer.chunks_exact_mut(16) {
        let mut ciphertext = [0u8; 16];
        ciphertext.copy_from_slice(block);

        xor_block(block, &prev_plain);
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
        xor_block(block, &prev_cipher);

        prev_plain.copy_from_slice(block);
        prev_cipher = ciphertext;
    }
    Ok(())
}

/// Encrypt `src` into a new buffer.
pub fn encrypt(src: &[u8], iv: &[u8; 32], key: &[u8; 32]) -> Result<Vec<u8>, UnalignedInput> {
    let mut out = src.to_vec();
    ige_encrypt(&mut out, key, iv)?;
    Ok(out)
}

/// Decrypt `src` into a new buffer.
pub fn decrypt(src: &[u8], iv: &[u8; 32], key: &[u8; 32]) -> Result<Vec<u8>, UnalignedInput> {
    let mut out = src.to_vec();
    ige_decrypt(&mut out, key, iv)?;
    Ok(out)
}
