//! Argon2id key derivation and OS randomness.
//!
//! Mirrors the teacher's `vault::crypto` split between "derive deterministic
//! key material from a password" and "pull fresh random bytes" — generalized
//! here to the two-stage passphrase KDF spec.md §4.2 requires instead of the
//! teacher's single-stage KDF-then-HKDF split.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use rand::rngs::OsRng;
use secrecy::SecretSlice;
use zeroize::Zeroizing;

use super::CryptoError;

/// Memory cost fixed at 256 MiB per spec.md §9's Open Question resolution
/// ("This specification follows the latest design: 256 MiB...").
pub const ARGON2_MEM_KIB: u32 = 256 * 1024;
pub const ARGON2_PARALLELISM: u32 = 1;
const STAGE1_SALT: &[u8] = b"covertpassphrase";

pub type SecretBytes = SecretSlice<u8>;

/// `N` cryptographically secure random bytes, straight from the OS CSPRNG.
///
/// Per spec.md §4.1: "OS CSPRNG only. Never a userspace PRNG seeded with
/// time or counters." Tests that need reproducible output inject their own
/// RNG at a higher layer instead of calling this function.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

fn argon2id(password: &[u8], salt: &[u8], hashlen: usize, time_cost: u32) -> Result<Vec<u8>, CryptoError> {
    let params = Params::new(ARGON2_MEM_KIB, time_cost, ARGON2_PARALLELISM, Some(hashlen))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut out = vec![0u8; hashlen];
    argon2.hash_password_into(password, salt, &mut out)?;
    Ok(out)
}

/// Stage 1 of the two-stage passphrase KDF (spec.md §4.2):
///
/// `pwhash = argon2id(salt="covertpassphrase", password=pw, hashlen=16,
/// time_cost = 8 << max(0, 12 - len(pw)))`.
///
/// Short passphrases get a much larger time cost so that the effective
/// work factor degrades gracefully instead of a hard length cutoff (the
/// hard cutoff is `PasswordTooShort` at 8 bytes, enforced by the caller).
///
/// `pwhash` feeds directly into stage 2 as a salt; it is held in a
/// `Zeroizing` wrapper end to end so it doesn't linger in a bare array
/// after stage 2 consumes it (spec.md §5).
pub fn passphrase_stage1(password: &[u8]) -> Result<Zeroizing<[u8; 16]>, CryptoError> {
    let shift = 12i32.saturating_sub(password.len() as i32).max(0) as u32;
    let time_cost = 8u32 << shift;
    let out = argon2id(password, STAGE1_SALT, 16, time_cost)?;
    let array: [u8; 16] = out.try_into().expect("hashlen is 16");
    Ok(Zeroizing::new(array))
}

/// Stage 2 of the two-stage passphrase KDF (spec.md §4.2):
///
/// `key = argon2id(salt=pwhash, password=nonce, hashlen=32, time_cost=2)`.
///
/// Salt and password are swapped relative to stage 1 because Argon2
/// requires a salt of at least 16 bytes and `pwhash` is exactly that size.
pub fn passphrase_stage2(pwhash: &[u8; 16], nonce: &[u8]) -> Result<SecretBytes, CryptoError> {
    let out = argon2id(nonce, pwhash, 32, 2)?;
    Ok(SecretBytes::from(out))
}

/// Derive the full passphrase-recipient candidate key from a normalized,
/// UTF-8-encoded password and the file nonce.
pub fn derive_passphrase_key(password: &[u8], nonce: &[u8]) -> Result<SecretBytes, CryptoError> {
    let pwhash = passphrase_stage1(password)?;
    passphrase_stage2(&pwhash, nonce)
}
