//! Block stream layer: chained authenticated blocks with length-prefixed
//! continuation (spec.md §4.3).
//!
//! Every ciphertext byte in a Covert file belongs to exactly one block.
//! Block 0 is authenticated with the full header as AAD; every later block
//! has empty AAD. The running signing hash folds in each block's Poly1305
//! tag so the signature subsystem (`container::signature`) can bind a
//! signature to the entire stream without re-reading it.

use sha2::{Digest, Sha512};

use crate::crypto::aead;
use crate::error::CovertError;

const NEXTLEN_FIELD_LEN: usize = 3;
pub const MAX_BLOCK_PLAINTEXT: usize = (1 << 24) - 1;
/// How far past a candidate block-0 start the blind search will try before
/// giving up on that (key, header_len) combination. spec.md §4.2 bounds
/// this at "any position up to 1024 bytes from file start"; we bound it
/// relative to block 0's own start instead, which is equivalent for the
/// header lengths this crate ever produces.
const BLOCK0_SEARCH_WINDOW: usize = 1024;

pub fn initial_signing_hash() -> [u8; 64] {
    let digest = Sha512::digest(b"");
    let mut out = [0u8; 64];
    out.copy_from_slice(&digest);
    out
}

/// `h_{i+1} = SHA512(h_i || tag_i)`.
pub fn chain_signing_hash(h: &[u8; 64], tag: &[u8; 16]) -> [u8; 64] {
    let mut hasher = Sha512::new();
    hasher.update(h);
    hasher.update(tag);
    let mut out = [0u8; 64];
    out.copy_from_slice(&hasher.finalize());
    out
}

fn next_len_bytes(value: u32) -> [u8; 3] {
    let le = value.to_le_bytes();
    [le[0], le[1], le[2]]
}

fn read_next_len(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0])
}

pub struct EncodedStream {
    pub bytes: Vec<u8>,
    pub signing_hash: [u8; 64],
}

/// Encode `payload` as a chained block stream under `file_key`/`file_nonce`,
/// binding `header_aad` to block 0 only. `chunk_size` is an encoder policy
/// knob (spec.md §4.3: "choice of next block length is an encoder policy,
/// not a wire requirement"), clamped to the wire's maximum block plaintext.
pub fn encode(file_key: &[u8; 32], file_nonce: &[u8; 12], header_aad: &[u8], payload: &[u8], chunk_size: usize) -> EncodedStream {
    let chunk_size = chunk_size.min(MAX_BLOCK_PLAINTEXT - NEXTLEN_FIELD_LEN).max(1);

    let mut nonce = *file_nonce;
    let mut signing_hash = initial_signing_hash();
    let mut out = Vec::new();
    let mut offset = 0usize;
    let mut first = true;

    loop {
        let remaining = payload.len() - offset;
        let this_len = remaining.min(chunk_size);
        let data = &payload[offset..offset + this_len];
        offset += this_len;

        let remaining_after = payload.len() - offset;
        let next_len: u32 = if remaining_after == 0 {
            0
        } else {
            (remaining_after.min(chunk_size) + NEXTLEN_FIELD_LEN) as u32
        };

        let mut plaintext = Vec::with_capacity(data.len() + NEXTLEN_FIELD_LEN);
        plaintext.extend_from_slice(data);
        plaintext.extend_from_slice(&next_len_bytes(next_len));

        let aad: &[u8] = if first { header_aad } else { &[] };
        let ct = aead::seal(file_key, &nonce, aad, &plaintext);
        let tag: [u8; 16] = ct[ct.len() - 16..].try_into().expect("aead tag is 16 bytes");
        signing_hash = chain_signing_hash(&signing_hash, &tag);
        out.extend_from_slice(&ct);

        first = false;
        if next_len == 0 {
            break;
        }
        aead::increment_nonce(&mut nonce);
    }

    EncodedStream { bytes: out, signing_hash }
}

/// Result of successfully opening block 0 during the header layer's blind
/// search (spec.md §4.2 step 4).
pub struct OpenedBlock0 {
    pub data: Vec<u8>,
    pub next_len: u32,
    pub tag: [u8; 16],
    /// Total bytes of `transport` block 0's ciphertext+tag occupied.
    pub consumed: usize,
}

/// Try every plausible block-0 ciphertext length against `file_key`/`nonce`
/// with `aad`. A single successful AEAD open is definitive (false positive
/// probability 2⁻¹²⁸); every other length is expected to fail the tag check.
pub fn try_open_block0(transport: &[u8], file_key: &[u8; 32], nonce: &[u8; 12], aad: &[u8]) -> Option<OpenedBlock0> {
    let min_len = NEXTLEN_FIELD_LEN + aead::TAG_LEN;
    let max_len = transport.len().min(min_len + BLOCK0_SEARCH_WINDOW);

    for total in min_len..=max_len {
        let ct = &transport[..total];
        if let Ok(pt) = aead::open(file_key, nonce, aad, ct) {
            let (data, nextlen_bytes) = pt.split_at(pt.len() - NEXTLEN_FIELD_LEN);
            let tag: [u8; 16] = ct[ct.len() - 16..].try_into().expect("aead tag is 16 bytes");
            return Some(OpenedBlock0 {
                data: data.to_vec(),
                next_len: read_next_len(nextlen_bytes),
                tag,
                consumed: total,
            });
        }
    }
    None
}

/// Continue decoding a stream after block 0: `nonce` is the file nonce
/// (block 0's nonce), `next_len` is the length block 0 announced, and
/// `signing_hash` already has block 0's tag folded in.
pub fn decode_rest(
    file_key: &[u8; 32],
    mut nonce: [u8; 12],
    mut next_len: u32,
    transport: &[u8],
    mut signing_hash: [u8; 64],
) -> Result<(Vec<u8>, [u8; 64], usize), CovertError> {
    let mut payload = Vec::new();
    let mut pos = 0usize;

    while next_len != 0 {
        aead::increment_nonce(&mut nonce);
        let total = next_len as usize + aead::TAG_LEN;
        if pos + total > transport.len() {
            return Err(CovertError::AuthFail);
        }
        let ct = &transport[pos..pos + total];
        let pt = aead::open(file_key, &nonce, &[], ct).map_err(|_| CovertError::AuthFail)?;
        let tag: [u8; 16] = ct[ct.len() - 16..].try_into().expect("aead tag is 16 bytes");
        signing_hash = chain_signing_hash(&signing_hash, &tag);

        let (data, nextlen_bytes) = pt.split_at(pt.len() - NEXTLEN_FIELD_LEN);
        payload.extend_from_slice(data);
        next_len = read_next_len(nextlen_bytes);
        pos += total;
    }

    Ok((payload, signing_hash, pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(payload: &[u8], chunk_size: usize) {
        let key = [3u8; 32];
        let nonce = [9u8; 12];
        let aad = b"header-aad";

        let encoded = encode(&key, &nonce, aad, payload, chunk_size);

        let block0 = try_open_block0(&encoded.bytes, &key, &nonce, aad).expect("block0 opens");
        let (rest, final_hash, consumed) =
            decode_rest(&key, nonce, block0.next_len, &encoded.bytes[block0.consumed..], chain_signing_hash(&initial_signing_hash(), &block0.tag)).unwrap();

        let mut out = block0.data;
        out.extend_from_slice(&rest);
        assert_eq!(out, payload);
        assert_eq!(final_hash, encoded.signing_hash);
        assert_eq!(block0.consumed + consumed, encoded.bytes.len());
    }

    #[test]
    fn single_block_roundtrip() {
        roundtrip(b"hello covert", 4096);
    }

    #[test]
    fn empty_payload_roundtrip() {
        roundtrip(b"", 4096);
    }

    #[test]
    fn multi_block_roundtrip() {
        let payload = vec![0xABu8; 5000];
        roundtrip(&payload, 777);
    }

    #[test]
    fn tamper_detected() {
        let key = [3u8; 32];
        let nonce = [9u8; 12];
        let aad = b"header-aad";
        let mut encoded = encode(&key, &nonce, aad, b"hello covert", 4096).bytes;
        *encoded.last_mut().unwrap() ^= 1;
        assert!(try_open_block0(&encoded, &key, &nonce, aad).is_none());
    }

    #[test]
    fn truncation_detected() {
        let key = [3u8; 32];
        let nonce = [9u8; 12];
        let aad = b"header-aad";
        let payload = vec![0x11u8; 5000];
        let encoded = encode(&key, &nonce, aad, &payload, 777);
        let block0 = try_open_block0(&encoded.bytes, &key, &nonce, aad).unwrap();
        let rest = &encoded.bytes[block0.consumed..encoded.bytes.len() - 1];
        let err = decode_rest(&key, nonce, block0.next_len, rest, chain_signing_hash(&initial_signing_hash(), &block0.tag)).unwrap_err();
        assert!(matches!(err, CovertError::AuthFail));
    }
}
