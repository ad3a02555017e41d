//! Primitive layer: AEAD, passphrase KDF, key exchange, Elligator2, XEdDSA.
//!
//! Split the way the teacher splits `vault::crypto` into one file per
//! primitive family rather than one flat module, since Covert's primitive
//! layer is wider (spec.md §4.1 names five distinct building blocks instead
//! of the teacher's password-hash-plus-AEAD pair).

pub mod aead;
pub mod elligator;
pub mod kdf;
pub mod kx;
pub mod xeddsa;

use thiserror::Error;

/// Errors raised by the primitive layer.
///
/// Deliberately collapsed, the same way [`aead::open`] collapses tamper and
/// wrong-key into one outcome: a caller that can tell "bad Argon2 params"
/// apart from "bad signature" apart from "bad tag" gets nothing useful out
/// of it, and the block/header layers re-collapse all of these into
/// `CovertError::AuthFail` anyway.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("AEAD authentication failed")]
    Aead,

    #[error("argon2 parameters rejected: {0}")]
    Argon2(#[from] argon2::Error),

    #[error("signature verification failed")]
    SignatureInvalid,

    #[error("point is not on the curve or not Elligator2-encodable")]
    InvalidPoint,
}
