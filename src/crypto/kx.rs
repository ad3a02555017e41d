//! X25519 key exchange.
//!
//! A thin wrapper over `x25519-dalek`, grounded the same way the
//! `tom-protocol` crate in the reference pack wraps `x25519_dalek::{
//! PublicKey, StaticSecret}` for its own ephemeral-DH scheme. Unlike that
//! crate, Covert never hashes the shared secret through HKDF here — per
//! spec.md §4.2 the header layer feeds the raw DH output straight into
//! SHA-512 itself, so this module only does the scalar multiplication.

use rand::RngCore;
use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};

pub const PUBLIC_KEY_LEN: usize = 32;

/// An ephemeral (or identity) X25519 keypair.
pub struct Keypair {
    pub secret: StaticSecret,
    pub public: PublicKey,
}

impl Keypair {
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Generate with an injected RNG (spec.md §9's "Global RNG → injected
    /// handle"), for deterministic `keygen` in tests.
    pub fn generate_with_rng(rng: &mut dyn RngCore) -> Self {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        Self::from_secret_bytes(bytes)
    }

    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        let secret = StaticSecret::from(bytes);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    pub fn public_bytes(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }
}

/// Raw X25519 scalar multiplication: `sk * pk`.
pub fn x25519(sk: &StaticSecret, pk_bytes: &[u8; 32]) -> [u8; 32] {
    let pk = PublicKey::from(*pk_bytes);
    sk.diffie_hellman(&pk).to_bytes()
}
