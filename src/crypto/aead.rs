//! ChaCha20-Poly1305 AEAD wrapper.
//!
//! Every ciphertext in the container is produced by this one function pair.
//! Nonces are always 12 bytes; callers own nonce uniqueness (the block
//! stream layer derives them from the file nonce, §3/§4.3 of the container
//! contract). Tag mismatch collapses to [`CryptoError::Aead`] — the same
//! "don't distinguish tamper from wrong-key" stance the header and block
//! layers rely on.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};

use super::CryptoError;

pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
pub const KEY_LEN: usize = 32;

pub fn seal(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], aad: &[u8], plaintext: &[u8]) -> Vec<u8> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .encrypt(Nonce::from_slice(nonce), Payload { msg: plaintext, aad })
        .expect("chacha20poly1305 encryption does not fail for well-formed inputs")
}

pub fn open(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce), Payload { msg: ciphertext, aad })
        .map_err(|_| CryptoError::Aead)
}

/// Increment a 12-byte nonce interpreted as a little-endian 96-bit counter.
///
/// Used to derive per-block nonces from the file nonce (§3: "the block
/// nonce is the file nonce interpreted as a little-endian 96-bit counter").
pub fn increment_nonce(nonce: &mut [u8; NONCE_LEN]) {
    let mut carry: u16 = 1;
    for byte in nonce.iter_mut() {
        let sum = *byte as u16 + carry;
        *byte = sum as u8;
        carry = sum >> 8;
        if carry == 0 {
            break;
        }
    }
}
