//! Header layer: authentication-slot negotiation, file-key derivation, and
//! the blind decryption search (spec.md §4.2).
//!
//! The short/advanced shape split and the auth-slot XOR scheme are
//! grounded in the teacher's `vault::format_v1` TLV header — both build a
//! fixed prefix, reject unrecognized shapes, and treat "doesn't parse" the
//! same as "wrong key" — generalized here to a shape that itself must look
//! like random bytes rather than a recognizable TLV stream.

use rand::RngCore;
use rand::seq::SliceRandom;
use secrecy::ExposeSecret;
use sha2::{Digest, Sha512};
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

use super::block;
use crate::crypto::{elligator, kdf, kx};
use crate::error::CovertError;
use crate::identity::{Identity, Recipient, MAX_RECIPIENTS};

const SLOT_LEN: usize = 32;

fn sha512_dh_key(nonce: &[u8; 12], shared: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha512::new();
    hasher.update(nonce);
    hasher.update(shared);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[0..32]);
    out
}

fn xor32(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    for i in 0..32 {
        out[i] = a[i] ^ b[i];
    }
    out
}

/// Derive a recipient's candidate file key. Held in a `Zeroizing` wrapper
/// end to end (spec.md §5) rather than copied into a bare array.
fn passphrase_key(pw: &[u8], nonce: &[u8; 12]) -> Result<Zeroizing<[u8; 32]>, CovertError> {
    let secret = kdf::derive_passphrase_key(pw, nonce)?;
    let mut out = [0u8; 32];
    out.copy_from_slice(secret.expose_secret());
    Ok(Zeroizing::new(out))
}

pub struct BuiltHeader {
    pub bytes: Vec<u8>,
    pub file_key: Zeroizing<[u8; 32]>,
    pub file_nonce: [u8; 12],
}

/// Build the header prefix for `recipients`, adding `decoys` random filler
/// slots. `wide_open` and non-empty `recipients` are mutually exclusive.
pub fn build(recipients: &[Recipient], decoys: u8, wide_open: bool, rng: &mut dyn RngCore) -> Result<BuiltHeader, CovertError> {
    if wide_open && !recipients.is_empty() {
        return Err(CovertError::ConflictingRecipients);
    }
    if recipients.is_empty() && !wide_open {
        return Err(CovertError::NoRecipients);
    }

    let mut seen_tags: Vec<Vec<u8>> = Vec::new();
    let mut deduped: Vec<&Recipient> = Vec::new();
    for r in recipients {
        let tag = r.identity_tag();
        if !seen_tags.contains(&tag) {
            seen_tags.push(tag);
            deduped.push(r);
        }
    }
    if deduped.len() > MAX_RECIPIENTS {
        return Err(CovertError::TooManyRecipients);
    }

    let has_pubkey = deduped.iter().any(|r| matches!(r, Recipient::PublicKey(_)));
    let use_short = decoys == 0
        && ((wide_open && deduped.is_empty()) || (deduped.len() == 1 && !has_pubkey));

    if use_short {
        let mut file_nonce = [0u8; 12];
        rng.fill_bytes(&mut file_nonce);
        let file_key = if wide_open {
            Zeroizing::new([0u8; 32])
        } else {
            match deduped[0] {
                Recipient::Passphrase(pw) => passphrase_key(pw.expose_secret().as_bytes(), &file_nonce)?,
                Recipient::PublicKey(_) => unreachable!("short mode never selects a pubkey recipient"),
            }
        };
        return Ok(BuiltHeader {
            bytes: file_nonce.to_vec(),
            file_key,
            file_nonce,
        });
    }

    let need_ephemeral = has_pubkey;
    let (slot0, ephemeral_sk): ([u8; 32], Option<kx::Keypair>) = if need_ephemeral {
        loop {
            let kp = kx::Keypair::generate();
            if let Ok(repr) = elligator::try_encode_any(&kp.public_bytes()) {
                break (repr, Some(kp));
            }
        }
    } else {
        let mut filler = [0u8; 32];
        rng.fill_bytes(&mut filler);
        (filler, None)
    };
    let file_nonce: [u8; 12] = slot0[0..12].try_into().expect("slot is 32 bytes");

    let mut keys: Vec<Zeroizing<[u8; 32]>> = Vec::new();
    for r in &deduped {
        let candidate = match r {
            Recipient::Passphrase(pw) => passphrase_key(pw.expose_secret().as_bytes(), &file_nonce)?,
            Recipient::PublicKey(pk) => {
                let eph_sk = ephemeral_sk.as_ref().expect("pubkey recipient requires an ephemeral key");
                let shared = kx::x25519(&eph_sk.secret, pk);
                Zeroizing::new(sha512_dh_key(&file_nonce, &shared))
            }
        };
        if !keys.iter().any(|k| **k == *candidate) {
            keys.push(candidate);
        }
    }

    let file_key = if wide_open { Zeroizing::new([0u8; 32]) } else { keys[0].clone() };
    let real_extra = if wide_open { 0 } else { keys.len() - 1 };

    let mut slot_values: Vec<[u8; 32]> = Vec::with_capacity(real_extra + decoys as usize);
    if !wide_open {
        for k in &keys[1..] {
            slot_values.push(xor32(&file_key, k));
        }
    }
    for _ in 0..decoys {
        let mut filler = [0u8; 32];
        rng.fill_bytes(&mut filler);
        slot_values.push(filler);
    }
    slot_values.shuffle(rng);

    let mut bytes = Vec::with_capacity(SLOT_LEN * (1 + slot_values.len()));
    bytes.extend_from_slice(&slot0);
    for s in &slot_values {
        bytes.extend_from_slice(s);
    }

    Ok(BuiltHeader { bytes, file_key, file_nonce })
}

/// A reader-supplied credential usable during the blind search.
pub enum Credential {
    SecretKey(Identity),
    Passphrase(secrecy::SecretString),
    WideOpen,
}

impl Credential {
    /// Build a passphrase credential, NFKC-normalizing the raw input the
    /// same way `Recipient::passphrase` does on the encrypt side (spec.md
    /// §6), so the two sides agree on the same bytes.
    pub fn passphrase(raw: &str) -> Self {
        let normalized: String = raw.nfkc().collect();
        Self::Passphrase(secrecy::SecretString::from(normalized))
    }
}

pub struct OpenedHeader {
    pub file_key: Zeroizing<[u8; 32]>,
    pub file_nonce: [u8; 12],
    pub header_len: usize,
    pub block0: block::OpenedBlock0,
}

/// Blind trial search over header shape, candidate key, and auth-slot
/// offset (spec.md §4.2 steps 1-4). A successful AEAD open on block 0 is
/// the only accepted proof; every other combination is expected to fail.
pub fn open(container: &[u8], credentials: &[Credential]) -> Result<OpenedHeader, CovertError> {
    if container.len() < 12 {
        return Err(CovertError::AuthFail);
    }

    let short_nonce: [u8; 12] = container[0..12].try_into().expect("checked length");
    let short_aad = &container[0..12];
    let short_rest = &container[12..];
    for cred in credentials {
        let candidate = match cred {
            Credential::WideOpen => Some(Zeroizing::new([0u8; 32])),
            Credential::Passphrase(pw) => passphrase_key(pw.expose_secret().as_bytes(), &short_nonce).ok(),
            Credential::SecretKey(_) => None,
        };
        if let Some(key) = candidate {
            if let Some(block0) = block::try_open_block0(short_rest, &key, &short_nonce, short_aad) {
                return Ok(OpenedHeader {
                    file_key: key,
                    file_nonce: short_nonce,
                    header_len: 12,
                    block0,
                });
            }
        }
    }

    if container.len() < 32 {
        return Err(CovertError::AuthFail);
    }
    let ephash: [u8; 32] = container[0..32].try_into().expect("checked length");
    let eph_pk = elligator::decode(&ephash);
    let nonce: [u8; 12] = ephash[0..12].try_into().expect("slot is 32 bytes");

    let mut candidate_keys: Vec<Zeroizing<[u8; 32]>> = Vec::new();
    for cred in credentials {
        match cred {
            Credential::WideOpen => candidate_keys.push(Zeroizing::new([0u8; 32])),
            Credential::Passphrase(pw) => {
                if let Ok(k) = passphrase_key(pw.expose_secret().as_bytes(), &nonce) {
                    candidate_keys.push(k);
                }
            }
            Credential::SecretKey(identity) => {
                let shared = kx::x25519(&identity.keypair().secret, &eph_pk);
                candidate_keys.push(Zeroizing::new(sha512_dh_key(&nonce, &shared)));
            }
        }
    }

    let max_slots = MAX_RECIPIENTS + 1; // recipients plus headroom for decoys
    for k in &candidate_keys {
        let mut header_len = SLOT_LEN;
        while header_len <= SLOT_LEN * (1 + max_slots) && header_len <= container.len() {
            let aad = &container[0..header_len];
            let rest = &container[header_len..];

            if let Some(block0) = block::try_open_block0(rest, k, &nonce, aad) {
                return Ok(OpenedHeader {
                    file_key: k.clone(),
                    file_nonce: nonce,
                    header_len,
                    block0,
                });
            }

            for slot in container[SLOT_LEN..header_len].chunks_exact(SLOT_LEN) {
                let slot: [u8; 32] = slot.try_into().expect("chunk is 32 bytes");
                let candidate = Zeroizing::new(xor32(k, &slot));
                if let Some(block0) = block::try_open_block0(rest, &candidate, &nonce, aad) {
                    return Ok(OpenedHeader {
                        file_key: candidate,
                        file_nonce: nonce,
                        header_len,
                        block0,
                    });
                }
            }

            header_len += SLOT_LEN;
        }
    }

    Err(CovertError::AuthFail)
}
