//! Signature subsystem: 80-byte attached or detached XEd25519 signature
//! blocks over the filehash (spec.md §4.5).
//!
//! AEAD authentication alone proves nothing about sender identity here —
//! the AEAD key is derivable from the filehash by anyone holding the file
//! — so [`verify`] always runs the XEdDSA check after the AEAD open
//! succeeds, matching the two-step verification spec.md calls out
//! explicitly.

use sha2::{Digest, Sha512};

use crate::crypto::aead;
use crate::error::CovertError;
use crate::identity::{self, Identity};

pub const SIGNATURE_BLOCK_LEN: usize = 80;
pub const DETACHED_LEN: usize = 64 + SIGNATURE_BLOCK_LEN;

fn signature_nonce(filehash: &[u8; 64], signer_pk: &[u8; 32]) -> [u8; 12] {
    let mut hasher = Sha512::new();
    hasher.update(filehash);
    hasher.update(signer_pk);
    let digest = hasher.finalize();
    let mut out = [0u8; 12];
    out.copy_from_slice(&digest[0..12]);
    out
}

/// Produce an 80-byte attached/appended signature block over `filehash`.
pub fn sign(filehash: &[u8; 64], signer: &Identity) -> [u8; SIGNATURE_BLOCK_LEN] {
    let sig = signer.sign(filehash);
    let key: [u8; 32] = filehash[0..32].try_into().expect("filehash is 64 bytes");
    let nonce = signature_nonce(filehash, &signer.public_key());
    let ct = aead::seal(&key, &nonce, &[], &sig);
    ct.try_into().expect("64-byte plaintext seals to 80 bytes")
}

/// Verify an 80-byte signature block against `filehash` and `signer_pk`.
///
/// Two independent checks must both pass: the AEAD tag (proves the block
/// was built from this exact filehash) and the XEdDSA signature itself
/// (proves `signer_pk`'s holder produced it).
pub fn verify(filehash: &[u8; 64], signer_pk: &[u8; 32], block: &[u8; SIGNATURE_BLOCK_LEN]) -> Result<(), CovertError> {
    let key: [u8; 32] = filehash[0..32].try_into().expect("filehash is 64 bytes");
    let nonce = signature_nonce(filehash, signer_pk);
    let sig_bytes = aead::open(&key, &nonce, &[], block).map_err(|_| CovertError::AuthFail)?;
    let sig: [u8; 64] = sig_bytes.try_into().map_err(|_| CovertError::AuthFail)?;
    identity::verify_signature(signer_pk, filehash, &sig).map_err(|_| CovertError::AuthFail)
}

/// A detached signature: the filehash it was computed over, plus the
/// 80-byte block. Verifying a detached signature means recomputing the
/// referenced file's filehash independently and comparing it here first.
pub fn sign_detached(filehash: &[u8; 64], signer: &Identity) -> [u8; DETACHED_LEN] {
    let block = sign(filehash, signer);
    let mut out = [0u8; DETACHED_LEN];
    out[..64].copy_from_slice(filehash);
    out[64..].copy_from_slice(&block);
    out
}

pub fn verify_detached(detached: &[u8; DETACHED_LEN], signer_pk: &[u8; 32], actual_filehash: &[u8; 64]) -> Result<(), CovertError> {
    let stored_hash: &[u8] = &detached[..64];
    if stored_hash != actual_filehash {
        return Err(CovertError::AuthFail);
    }
    let block: [u8; SIGNATURE_BLOCK_LEN] = detached[64..].try_into().expect("detached tail is 80 bytes");
    verify(actual_filehash, signer_pk, &block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_succeeds() {
        let signer = Identity::generate();
        let filehash = [7u8; 64];
        let block = sign(&filehash, &signer);
        verify(&filehash, &signer.public_key(), &block).unwrap();
    }

    #[test]
    fn verify_rejects_wrong_signer() {
        let signer = Identity::generate();
        let impostor = Identity::generate();
        let filehash = [7u8; 64];
        let block = sign(&filehash, &signer);
        assert!(verify(&filehash, &impostor.public_key(), &block).is_err());
    }

    #[test]
    fn verify_rejects_filehash_mismatch() {
        let signer = Identity::generate();
        let block = sign(&[7u8; 64], &signer);
        assert!(verify(&[8u8; 64], &signer.public_key(), &block).is_err());
    }

    #[test]
    fn detached_signature_roundtrips() {
        let signer = Identity::generate();
        let filehash = [9u8; 64];
        let detached = sign_detached(&filehash, &signer);
        verify_detached(&detached, &signer.public_key(), &filehash).unwrap();
    }

    #[test]
    fn detached_signature_rejects_different_file() {
        let signer = Identity::generate();
        let detached = sign_detached(&[9u8; 64], &signer);
        assert!(verify_detached(&detached, &signer.public_key(), &[10u8; 64]).is_err());
    }
}
