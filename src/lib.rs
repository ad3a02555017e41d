//! Covert: file-and-message encryption that produces ciphertext
//! indistinguishable from random bytes.
//!
//! The crate is organized the way the spec's own module list reads:
//! `crypto` (primitives), `identity` (recipients/senders), `container`
//! (header, block stream, archive, signature layers wired into one
//! pipeline), and `armor` (the optional ascii-text wrapper). `config`
//! carries the small amount of ambient policy data the CLI persists.

pub mod armor;
pub mod config;
pub mod container;
pub mod crypto;
pub mod error;
pub mod identity;

pub use container::signature;
pub use container::{
    append_signatures, decrypt, encrypt, encrypt_with_rng, signature_trailer, verify_appended_signatures, Attachment, Credential,
    Decrypted, Encrypted, EncryptOptions, Payload,
};
pub use error::{CovertError, Result};
pub use identity::{Identity, Recipient};
