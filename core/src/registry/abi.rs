//! Just enough Ethereum ABI for the listings registry: selectors, event
//! topics, and fixed 32-byte words.

use crate::core::source::SourceError;
use sha3::{Digest, Keccak256};

pub const WORD_LEN: usize = 32;
pub type Word = [u8; WORD_LEN];

/// Multihash prefix of a sha2-256 digest: code 0x12, length 0x20.
const SHA2_256_MULTIHASH_PREFIX: [u8; 2] = [0x12, 0x20];

pub fn keccak256(data: &[u8]) -> Word {
    Keccak256::digest(data).into()
}

/// First four bytes of `keccak256(signature)`, e.g. `ipfsHash()`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// `0x`-prefixed topic of an event signature, e.g. `NewListing(uint256,address)`.
pub fn event_topic(signature: &str) -> String {
    encode_hex(&keccak256(signature.as_bytes()))
}

/// Call data for a method taking only static 32-byte arguments.
pub fn call_data(selector: [u8; 4], args: &[Word]) -> String {
    let mut data = Vec::with_capacity(4 + args.len() * WORD_LEN);
    data.extend_from_slice(&selector);
    for arg in args {
        data.extend_from_slice(arg);
    }
    encode_hex(&data)
}

pub fn encode_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

pub fn decode_hex(value: &str) -> Result<Vec<u8>, SourceError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(digits).map_err(|err| SourceError::Decode(format!("bad hex '{}': {}", value, err)))
}

/// The `index`-th 32-byte word of ABI-encoded data.
pub fn word(data: &[u8], index: usize) -> Result<Word, SourceError> {
    let start = index * WORD_LEN;
    data.get(start..start + WORD_LEN)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| {
            SourceError::Decode(format!(
                "expected at least {} bytes of ABI data, got {}",
                start + WORD_LEN,
                data.len()
            ))
        })
}

/// An `address` return value: the low 20 bytes of the word.
pub fn address_from_word(word: &Word) -> Result<[u8; 20], SourceError> {
    if word[..12].iter().any(|b| *b != 0) {
        return Err(SourceError::Decode(format!(
            "word {} is not a left-padded address",
            encode_hex(word)
        )));
    }
    let mut address = [0u8; 20];
    address.copy_from_slice(&word[12..]);
    Ok(address)
}

/// CIDv0 (`Qm...`) of a sha2-256 digest stored on chain as `bytes32`.
pub fn cid_v0_from_digest(digest: &Word) -> String {
    let mut multihash = Vec::with_capacity(2 + WORD_LEN);
    multihash.extend_from_slice(&SHA2_256_MULTIHASH_PREFIX);
    multihash.extend_from_slice(digest);
    bs58::encode(multihash).into_string()
}
