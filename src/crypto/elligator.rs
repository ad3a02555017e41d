//! Elligator2 encoding of Curve25519 public keys.
//!
//! Turns a Montgomery-form public key into a uniform-looking 32-byte string
//! and back, so an advanced-shape header's ephemeral keys are indistinguishable
//! from random noise (spec.md §4.1, §4.2). Built on `curve25519-dalek`'s
//! `elligator2` cargo feature rather than hand-rolled field arithmetic — no
//! repo in the reference pack implements Elligator2 itself, so this is the
//! one primitive grounded directly in the upstream crate's own feature
//! surface instead of a sibling example.
//!
//! Roughly half of all curve points have no representative at all; callers
//! that need an encodable ephemeral key retry key generation until one
//! lands (see [`crate::container::header`]).

use curve25519_dalek::montgomery::MontgomeryPoint;

use super::CryptoError;

/// Map a Curve25519 public key to a uniform 32-byte representative.
///
/// `low_bit` carries one bit of the two-valued ambiguity Elligator2 leaves
/// in the inverse map; the caller is free to pick either representative; we
/// take it as a parameter so tests can exercise both branches
/// deterministically instead of depending on which one a given key happens
/// to produce.
///
/// Returns `None` for the roughly half of points with no representative.
pub fn encode(public_key: &[u8; 32], low_bit: bool) -> Option<[u8; 32]> {
    let point = MontgomeryPoint(*public_key);
    point.to_representative(low_bit).map(|repr| repr.0)
}

/// Map a uniform 32-byte representative back to its Curve25519 point.
///
/// Total: every 32-byte string maps to some point (clamped exactly the way
/// X25519 itself clamps incoming scalars/points), so this never fails.
pub fn decode(representative: &[u8; 32]) -> [u8; 32] {
    MontgomeryPoint::map_to_point(representative).0
}

/// Attempt to Elligator2-encode `public_key`, trying both representative
/// branches before giving up. Used when the caller doesn't care which
/// branch wins, only whether encoding is possible at all.
pub fn try_encode_any(public_key: &[u8; 32]) -> Result<[u8; 32], CryptoError> {
    encode(public_key, false)
        .or_else(|| encode(public_key, true))
        .ok_or(CryptoError::InvalidPoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kx::Keypair;

    #[test]
    fn decode_is_total() {
        for seed in 0u8..8 {
            let repr = [seed; 32];
            let _ = decode(&repr);
        }
    }

    #[test]
    fn roundtrip_on_encodable_keys() {
        let mut found = 0;
        for attempt in 0..64u32 {
            let kp = Keypair::from_secret_bytes({
                let mut s = [0u8; 32];
                s[0] = attempt as u8;
                s[1] = (attempt >> 8) as u8;
                s
            });
            let pk = kp.public_bytes();
            if let Ok(repr) = try_encode_any(&pk) {
                let back = decode(&repr);
                assert_eq!(back, pk);
                found += 1;
            }
        }
        assert!(found > 0, "expected at least one encodable key in the sample");
    }
}
