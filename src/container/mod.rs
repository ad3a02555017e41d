//! Covert container format: the header, block-stream, archive, and
//! signature layers wired into one encrypt/decrypt pipeline (spec.md §2).

pub mod archive;
pub mod block;
pub mod header;
pub mod signature;

use rand::RngCore;
use rand::rngs::OsRng;

pub use archive::{Attachment, Payload};
pub use header::Credential;

use crate::error::CovertError;
use crate::identity::{Identity, Recipient};

const DEFAULT_CHUNK_SIZE: usize = 1 << 20;

pub struct EncryptOptions {
    pub pad_proportion: f64,
    pub decoys: u8,
    pub wide_open: bool,
}

impl Default for EncryptOptions {
    fn default() -> Self {
        Self {
            pad_proportion: archive::DEFAULT_PAD_PROPORTION,
            decoys: 0,
            wide_open: false,
        }
    }
}

pub struct Decrypted {
    pub entries: Vec<Attachment>,
    pub filehash: [u8; 64],
}

/// A freshly built container plus the filehash it commits to, ready to
/// feed straight into [`append_signatures`] without a round trip through
/// [`decrypt`] (which a sender encrypting to someone else's public key
/// could not do anyway, since they don't hold the recipient's secret key).
pub struct Encrypted {
    pub bytes: Vec<u8>,
    pub filehash: [u8; 64],
}

/// Encrypt `entries` to `recipients` using an OS-seeded RNG.
pub fn encrypt(recipients: &[Recipient], entries: &[Attachment], options: &EncryptOptions) -> Result<Encrypted, CovertError> {
    encrypt_with_rng(recipients, entries, options, &mut OsRng)
}

/// Encrypt with an injected RNG (spec.md §9: "Global RNG → injected
/// handle"), for deterministic tests.
pub fn encrypt_with_rng(
    recipients: &[Recipient],
    entries: &[Attachment],
    options: &EncryptOptions,
    rng: &mut dyn RngCore,
) -> Result<Encrypted, CovertError> {
    let built = header::build(recipients, options.decoys, options.wide_open, rng)?;
    let inner = archive::encode(entries, options.pad_proportion, rng)?;
    let encoded = block::encode(&built.file_key, &built.file_nonce, &built.bytes, &inner, DEFAULT_CHUNK_SIZE);

    let mut bytes = built.bytes;
    bytes.extend_from_slice(&encoded.bytes);
    Ok(Encrypted { bytes, filehash: encoded.signing_hash })
}

/// Decrypt `container`, trying each credential against the blind search
/// and then parsing the archive layer. Returns the entries plus the
/// filehash, which the caller can feed to [`verify_appended_signatures`].
pub fn decrypt(container: &[u8], credentials: &[Credential]) -> Result<Decrypted, CovertError> {
    let opened = header::open(container, credentials)?;
    let block0 = opened.block0;

    let initial_hash = block::chain_signing_hash(&block::initial_signing_hash(), &block0.tag);
    let rest_start = opened.header_len + block0.consumed;
    let rest = &container[rest_start..];

    let (inner, filehash) = if block0.next_len == 0 {
        (block0.data, initial_hash)
    } else {
        let (tail, hash, _consumed) = block::decode_rest(&opened.file_key, opened.file_nonce, block0.next_len, rest, initial_hash)?;
        let mut inner = block0.data;
        inner.extend_from_slice(&tail);
        (inner, hash)
    };

    let entries = archive::decode(&inner)?;
    Ok(Decrypted { entries, filehash })
}

/// Byte offset in `container` where the block stream ends and an optional
/// run of 80-byte signature blocks begins. Call after [`decrypt`] succeeds;
/// recomputes the same search rather than threading the offset through
/// `Decrypted` so callers that only need plaintext pay nothing extra.
pub fn signature_trailer<'a>(container: &'a [u8], credentials: &[Credential]) -> Result<&'a [u8], CovertError> {
    let opened = header::open(container, credentials)?;
    let rest_start = opened.header_len + opened.block0.consumed;
    let rest = &container[rest_start..];
    if opened.block0.next_len == 0 {
        return Ok(rest);
    }
    let initial_hash = block::chain_signing_hash(&block::initial_signing_hash(), &opened.block0.tag);
    let (_, _, consumed) = block::decode_rest(&opened.file_key, opened.file_nonce, opened.block0.next_len, rest, initial_hash)?;
    Ok(&rest[consumed..])
}

/// Append one signature block per signer after the block stream.
pub fn append_signatures(container: &mut Vec<u8>, filehash: &[u8; 64], signers: &[&Identity]) {
    for signer in signers {
        let block = signature::sign(filehash, signer);
        container.extend_from_slice(&block);
    }
}

/// Verify every 80-byte block in `trailer` against `signer_pk`, returning
/// true if at least one verifies.
pub fn verify_appended_signatures(trailer: &[u8], filehash: &[u8; 64], signer_pk: &[u8; 32]) -> bool {
    trailer
        .chunks_exact(signature::SIGNATURE_BLOCK_LEN)
        .any(|block| {
            let block: [u8; signature::SIGNATURE_BLOCK_LEN] = block.try_into().expect("chunk is exact length");
            signature::verify(filehash, signer_pk, &block).is_ok()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn wide_open_roundtrip(message: &[u8]) -> Decrypted {
        let mut rng = StdRng::seed_from_u64(100);
        let entries = vec![Attachment::message(message.to_vec())];
        let options = EncryptOptions {
            pad_proportion: 0.0,
            decoys: 0,
            wide_open: true,
        };
        let container = encrypt_with_rng(&[], &entries, &options, &mut rng).unwrap();
        decrypt(&container.bytes, &[Credential::WideOpen]).unwrap()
    }

    #[test]
    fn s1_wide_open_roundtrip() {
        let decrypted = wide_open_roundtrip(b"Hello");
        assert_eq!(decrypted.entries.len(), 1);
        let Payload::Fixed(bytes) = &decrypted.entries[0].payload else { panic!() };
        assert_eq!(bytes, b"Hello");
    }

    #[test]
    fn s2_single_passphrase_empty_message() {
        let mut rng = StdRng::seed_from_u64(101);
        let recipients = vec![Recipient::passphrase("oliveanglepeaceethics").unwrap()];
        let entries = vec![Attachment::message(Vec::new())];
        let options = EncryptOptions { pad_proportion: 0.0, decoys: 0, wide_open: false };
        let container = encrypt_with_rng(&recipients, &entries, &options, &mut rng).unwrap();

        let credentials = vec![Credential::passphrase("oliveanglepeaceethics")];
        let decrypted = decrypt(&container.bytes, &credentials).unwrap();
        let Payload::Fixed(bytes) = &decrypted.entries[0].payload else { panic!() };
        assert!(bytes.is_empty());
    }

    #[test]
    fn passphrase_with_non_nfkc_sequence_round_trips() {
        // "é" as "e" + combining acute (U+0065 U+0301) vs. its precomposed
        // NFKC form (U+00E9). Encrypt and decrypt see different raw bytes;
        // both sides must normalize to the same key.
        let decomposed = "caf\u{0065}\u{0301}passphrase";
        let precomposed = "caf\u{00e9}passphrase";
        assert_ne!(decomposed, precomposed);

        let mut rng = StdRng::seed_from_u64(103);
        let recipients = vec![Recipient::passphrase(decomposed).unwrap()];
        let entries = vec![Attachment::message(b"unicode".to_vec())];
        let options = EncryptOptions { pad_proportion: 0.0, decoys: 0, wide_open: false };
        let container = encrypt_with_rng(&recipients, &entries, &options, &mut rng).unwrap();

        let credentials = vec![Credential::passphrase(precomposed)];
        let decrypted = decrypt(&container.bytes, &credentials).unwrap();
        let Payload::Fixed(bytes) = &decrypted.entries[0].payload else { panic!() };
        assert_eq!(bytes, b"unicode");
    }

    #[test]
    fn s3_two_pubkey_recipients_each_open_third_does_not() {
        let mut rng = StdRng::seed_from_u64(102);
        let alice = Identity::generate();
        let bob = Identity::generate();
        let mallory = Identity::generate();

        let recipients = vec![Recipient::public_key(alice.public_key()), Recipient::public_key(bob.public_key())];
        let entries = vec![Attachment::message(b"shared secret".to_vec())];
        let options = EncryptOptions { pad_proportion: 0.0, decoys: 0, wide_open: false };
        let container = encrypt_with_rng(&recipients, &entries, &options, &mut rng).unwrap();

        for identity in [alice, bob] {
            let secret = identity.secret_key();
            let credentials = vec![Credential::SecretKey(Identity::from_secret_bytes(secret))];
            let decrypted = decrypt(&container.bytes, &credentials).unwrap();
            let Payload::Fixed(bytes) = &decrypted.entries[0].payload else { panic!() };
            assert_eq!(bytes, b"shared secret");
        }

        let credentials = vec![Credential::SecretKey(Identity::from_secret_bytes(mallory.secret_key()))];
        assert!(decrypt(&container.bytes, &credentials).is_err());
    }

    #[test]
    fn s4_attachment_plus_message() {
        let mut rng = StdRng::seed_from_u64(103);
        let entries = vec![
            Attachment::message(b"hi".to_vec()),
            Attachment::file("a.txt", b"abc".to_vec(), false).unwrap(),
        ];
        let options = EncryptOptions { pad_proportion: 0.0, decoys: 0, wide_open: true };
        let container = encrypt_with_rng(&[], &entries, &options, &mut rng).unwrap();
        let decrypted = decrypt(&container.bytes, &[Credential::WideOpen]).unwrap();
        assert_eq!(decrypted.entries.len(), 2);
    }

    #[test]
    fn s5_signed_wide_open() {
        let mut rng = StdRng::seed_from_u64(104);
        let signer = Identity::generate();
        let impostor = Identity::generate();

        let entries = vec![Attachment::message(b"data".to_vec())];
        let options = EncryptOptions { pad_proportion: 0.0, decoys: 0, wide_open: true };
        let encrypted = encrypt_with_rng(&[], &entries, &options, &mut rng).unwrap();

        let mut container = encrypted.bytes;
        append_signatures(&mut container, &encrypted.filehash, &[&signer]);

        let trailer = signature_trailer(&container, &[Credential::WideOpen]).unwrap();
        assert!(verify_appended_signatures(trailer, &encrypted.filehash, &signer.public_key()));
        assert!(!verify_appended_signatures(trailer, &encrypted.filehash, &impostor.public_key()));
    }

    #[test]
    fn bit_flip_is_rejected() {
        let mut rng = StdRng::seed_from_u64(105);
        let entries = vec![Attachment::message(b"Hello".to_vec())];
        let options = EncryptOptions { pad_proportion: 0.0, decoys: 0, wide_open: true };
        let mut container = encrypt_with_rng(&[], &entries, &options, &mut rng).unwrap().bytes;
        let last = container.len() - 1;
        container[last] ^= 1;
        assert!(decrypt(&container, &[Credential::WideOpen]).is_err());
    }

    #[test]
    fn truncation_is_rejected() {
        let mut rng = StdRng::seed_from_u64(106);
        let entries = vec![Attachment::message(vec![0u8; 5000])];
        let options = EncryptOptions { pad_proportion: 0.0, decoys: 0, wide_open: true };
        let container = encrypt_with_rng(&[], &entries, &options, &mut rng).unwrap().bytes;
        let truncated = &container[..container.len() - 10];
        assert!(decrypt(truncated, &[Credential::WideOpen]).is_err());
    }

    #[test]
    fn s6_streaming_attachment_straddles_blocks() {
        let mut rng = StdRng::seed_from_u64(107);
        let chunks = vec![vec![1u8; 900], vec![2u8; 900], vec![3u8; 900]];
        let entries = vec![Attachment::streaming_file("stream.bin", chunks, false).unwrap()];
        let options = EncryptOptions { pad_proportion: 0.0, decoys: 0, wide_open: true };
        let container = encrypt_with_rng(&[], &entries, &options, &mut rng).unwrap();
        let decrypted = decrypt(&container.bytes, &[Credential::WideOpen]).unwrap();
        let Payload::Streaming(chunks) = &decrypted.entries[0].payload else { panic!() };
        assert_eq!(chunks.concat().len(), 2700);
    }
}
