//! XEdDSA: Schnorr signatures directly over Montgomery-form (X25519) keys.
//!
//! Signal's XEdDSA construction lets a single X25519 keypair double as a
//! signing key without a parallel Ed25519 identity. No crate in the
//! reference pack offers this directly; the reference-pack script under
//! `other_examples/` that touches PQXDH confirms the usual practice is to
//! hand-write this as a small local module on top of `curve25519-dalek` and
//! `sha2`, which is what this file does.
//!
//! `MontgomeryPoint::to_edwards` resolves the two-to-one ambiguity between
//! a Montgomery public key and its two possible Edwards lifts by sign bit;
//! signing and verification agree on sign bit 0 by convention, matching the
//! `calculate_key_pair` step of the XEdDSA reference algorithm.

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::montgomery::MontgomeryPoint;
use curve25519_dalek::scalar::Scalar;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha512};

use super::CryptoError;

pub const SIGNATURE_LEN: usize = 64;

fn clamp(mut bytes: [u8; 32]) -> [u8; 32] {
    bytes[0] &= 248;
    bytes[31] &= 127;
    bytes[31] |= 64;
    bytes
}

/// Recover the canonical signing scalar `a` and its Edwards public point `A`
/// (always encoded with sign bit 0) from a raw Montgomery secret key.
fn calculate_key_pair(montgomery_secret: &[u8; 32]) -> (Scalar, CompressedEdwardsY) {
    let a0 = Scalar::from_bytes_mod_order(clamp(*montgomery_secret));
    let big_a0 = EdwardsPoint::mul_base(&a0).compress();
    if big_a0.as_bytes()[31] & 0x80 != 0 {
        (-a0, (-EdwardsPoint::mul_base(&a0)).compress())
    } else {
        (a0, big_a0)
    }
}

fn hash_scalar(parts: &[&[u8]]) -> Scalar {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    Scalar::from_bytes_mod_order_wide(&hasher.finalize().into())
}

/// Sign `message` with a raw Montgomery (X25519) secret key.
pub fn sign(montgomery_secret: &[u8; 32], message: &[u8]) -> [u8; SIGNATURE_LEN] {
    let (a, big_a) = calculate_key_pair(montgomery_secret);

    let mut z = [0u8; 64];
    OsRng.fill_bytes(&mut z);
    let r = hash_scalar(&[&a.to_bytes(), message, &z]);
    let big_r = EdwardsPoint::mul_base(&r).compress();

    let h = hash_scalar(&[big_r.as_bytes(), big_a.as_bytes(), message]);
    let s = r + h * a;

    let mut out = [0u8; SIGNATURE_LEN];
    out[..32].copy_from_slice(big_r.as_bytes());
    out[32..].copy_from_slice(s.as_bytes());
    out
}

/// Verify a signature produced by [`sign`] against a raw Montgomery public key.
pub fn verify(montgomery_public: &[u8; 32], message: &[u8], signature: &[u8; SIGNATURE_LEN]) -> Result<(), CryptoError> {
    let big_a = MontgomeryPoint(*montgomery_public)
        .to_edwards(0)
        .ok_or(CryptoError::InvalidPoint)?;

    let big_r = CompressedEdwardsY::from_slice(&signature[..32])
        .map_err(|_| CryptoError::SignatureInvalid)?
        .decompress()
        .ok_or(CryptoError::SignatureInvalid)?;

    let s_bytes: [u8; 32] = signature[32..].try_into().expect("slice is 32 bytes");
    let s = Option::<Scalar>::from(Scalar::from_canonical_bytes(s_bytes)).ok_or(CryptoError::SignatureInvalid)?;

    let h = hash_scalar(&[big_r.compress().as_bytes(), big_a.compress().as_bytes(), message]);

    let check = EdwardsPoint::mul_base(&s);
    let expect = big_r + big_a * h;

    if check.compress() == expect.compress() {
        Ok(())
    } else {
        Err(CryptoError::SignatureInvalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kx::Keypair;

    #[test]
    fn sign_then_verify_succeeds() {
        let kp = Keypair::generate();
        let sig = sign(&kp.secret_bytes(), b"hello covert");
        verify(&kp.public_bytes(), b"hello covert", &sig).unwrap();
    }

    #[test]
    fn verify_rejects_tampered_message() {
        let kp = Keypair::generate();
        let sig = sign(&kp.secret_bytes(), b"hello covert");
        assert!(verify(&kp.public_bytes(), b"goodbye covert", &sig).is_err());
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let kp = Keypair::generate();
        let other = Keypair::generate();
        let sig = sign(&kp.secret_bytes(), b"hello covert");
        assert!(verify(&other.public_bytes(), b"hello covert", &sig).is_err());
    }

    #[test]
    fn verify_rejects_tampered_signature() {
        let kp = Keypair::generate();
        let mut sig = sign(&kp.secret_bytes(), b"hello covert");
        sig[0] ^= 1;
        assert!(verify(&kp.public_bytes(), b"hello covert", &sig).is_err());
    }
}
