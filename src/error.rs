//! The closed error sum the core exposes to every caller.
//!
//! `crypto::CryptoError` is the one narrow lower-layer enum, wrapped in via
//! `#[from]` the way `vault::VaultError` wraps `vault::crypto::CryptoError`
//! in the teacher crate. The container layers (`header`, `block`,
//! `archive`, `signature`) are tightly coupled enough — a malformed index
//! and a wrong key both have to collapse to the same caller-visible
//! outcome anyway — that they report straight into `CovertError` rather
//! than each keeping a private enum of their own.

use thiserror::Error;

/// Errors the Covert core can raise.
///
/// `AuthFail` is deliberately a single variant covering tampering, a wrong
/// key, truncation, and signature-verification failure: telling those
/// apart to the caller would leak which one happened, defeating the
/// indistinguishability property the format is built for.
#[derive(Debug, Error)]
pub enum CovertError {
    #[error("authentication failed")]
    AuthFail,

    #[error("malformed container: {0}")]
    FormatError(String),

    #[error("password must be at least 8 bytes")]
    PasswordTooShort,

    #[error("no recipients given and --wide-open not set")]
    NoRecipients,

    #[error("unsupported container version")]
    UnsupportedVersion,

    #[error("too many recipients (max 20)")]
    TooManyRecipients,

    #[error("--wide-open cannot be combined with explicit recipients")]
    ConflictingRecipients,

    #[error(transparent)]
    Crypto(#[from] crate::crypto::CryptoError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CovertError>;
