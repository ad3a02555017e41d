//! Recipients and sender identities.
//!
//! A [`Recipient`] is consumed only during header construction/parsing
//! (spec.md §3); an [`Identity`] additionally carries XEd25519 signing
//! capability over the same Montgomery secret, mirroring how the teacher's
//! `vault::items` keeps data shapes separate from the crypto that acts on
//! them.

use secrecy::{ExposeSecret, SecretString};
use unicode_normalization::UnicodeNormalization;

use crate::crypto::{kx, xeddsa};
use crate::crypto::CryptoError;

pub const MAX_RECIPIENTS: usize = 20;
const MIN_PASSPHRASE_LEN: usize = 8;

/// A tagged recipient value: a raw public key, or a passphrase.
pub enum Recipient {
    PublicKey([u8; 32]),
    Passphrase(SecretString),
}

impl Recipient {
    /// Normalize and validate a passphrase recipient.
    ///
    /// NFKC-normalizes and UTF-8-encodes per spec.md §6, then rejects
    /// anything under 8 bytes per spec.md §4.2/§7 (`PasswordTooShort`).
    pub fn passphrase(raw: &str) -> Result<Self, crate::error::CovertError> {
        let normalized: String = raw.nfkc().collect();
        if normalized.as_bytes().len() < MIN_PASSPHRASE_LEN {
            return Err(crate::error::CovertError::PasswordTooShort);
        }
        Ok(Self::Passphrase(SecretString::from(normalized)))
    }

    pub fn public_key(bytes: [u8; 32]) -> Self {
        Self::PublicKey(bytes)
    }

    /// A cheap identity string used for the pre-hash dedup pass (spec.md
    /// §4.2: "Deduplicate the candidate set twice ... once by recipient
    /// identity string before hashing").
    pub(crate) fn identity_tag(&self) -> Vec<u8> {
        match self {
            Recipient::PublicKey(pk) => {
                let mut tag = vec![0u8];
                tag.extend_from_slice(pk);
                tag
            }
            Recipient::Passphrase(pw) => {
                let mut tag = vec![1u8];
                tag.extend_from_slice(pw.expose_secret().as_bytes());
                tag
            }
        }
    }
}

/// A sender/recipient X25519 identity, optionally used to sign.
pub struct Identity {
    keypair: kx::Keypair,
}

impl Identity {
    pub fn generate() -> Self {
        Self {
            keypair: kx::Keypair::generate(),
        }
    }

    /// Generate with an injected RNG, for deterministic `keygen` in tests.
    pub fn generate_with_rng(rng: &mut dyn rand::RngCore) -> Self {
        Self {
            keypair: kx::Keypair::generate_with_rng(rng),
        }
    }

    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        Self {
            keypair: kx::Keypair::from_secret_bytes(bytes),
        }
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.keypair.public_bytes()
    }

    pub fn secret_key(&self) -> [u8; 32] {
        self.keypair.secret_bytes()
    }

    pub(crate) fn keypair(&self) -> &kx::Keypair {
        &self.keypair
    }

    /// XEd25519-sign `message` under this identity's Montgomery secret.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        xeddsa::sign(&self.keypair.secret_bytes(), message)
    }
}

/// Verify an XEd25519 signature produced by [`Identity::sign`].
pub fn verify_signature(public_key: &[u8; 32], message: &[u8], signature: &[u8; 64]) -> Result<(), CryptoError> {
    xeddsa::verify(public_key, message, signature)
}
