//! Fixed-width binary decoding of explorer hex fields.
//!
//! Explorer logs carry every value as a hex string. These helpers decode them
//! into byte buffers first and then read fixed-size big-endian words, so
//! padding and offsets are checked by length instead of by string slicing.

use alloy::primitives::{hex, Address, B256, U256};

use crate::error::DecodeError;

/// Size of one ABI word in bytes.
pub const WORD_SIZE: usize = 32;

/// Number of leading zero bytes in an address left-padded to a word.
const ADDRESS_PADDING: usize = WORD_SIZE - 20;

fn digits(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Decode a `0x`-prefixed hex blob into bytes. A bare `0x` is an empty blob.
pub fn decode_hex(field: &'static str, value: &str) -> Result<Vec<u8>, DecodeError> {
    hex::decode(digits(value)).map_err(|_| DecodeError::MalformedHex {
        field,
        value: value.to_string(),
    })
}

/// Parse a hex quantity. A bare `0x` is malformed here.
pub fn parse_quantity(field: &'static str, value: &str) -> Result<u64, DecodeError> {
    let d = digits(value);
    if d.is_empty() {
        return Err(DecodeError::MalformedHex {
            field,
            value: value.to_string(),
        });
    }
    u64::from_str_radix(d, 16).map_err(|_| DecodeError::MalformedHex {
        field,
        value: value.to_string(),
    })
}

/// Same as [`parse_quantity`] but wide enough for gas prices.
pub fn parse_quantity_u128(field: &'static str, value: &str) -> Result<u128, DecodeError> {
    let d = digits(value);
    if d.is_empty() {
        return Err(DecodeError::MalformedHex {
            field,
            value: value.to_string(),
        });
    }
    u128::from_str_radix(d, 16).map_err(|_| DecodeError::MalformedHex {
        field,
        value: value.to_string(),
    })
}

/// Parse a log or transaction index. The explorer reports index zero as a bare `0x`.
pub fn parse_index(field: &'static str, value: &str) -> Result<u64, DecodeError> {
    if digits(value).is_empty() {
        return Ok(0);
    }
    parse_quantity(field, value)
}

/// Parse a 32-byte topic.
pub fn parse_word(field: &'static str, value: &str) -> Result<B256, DecodeError> {
    let bytes = decode_hex(field, value)?;
    if bytes.len() != WORD_SIZE {
        return Err(DecodeError::MalformedHex {
            field,
            value: value.to_string(),
        });
    }
    Ok(B256::from_slice(&bytes))
}

/// Read the low 20 bytes of a word holding a zero-padded address.
///
/// Returns `None` when the 12 padding bytes are not all zero, i.e. the word is
/// a hash or a full-width value rather than an address.
pub fn word_to_address(word: &B256) -> Option<Address> {
    let (padding, address) = word.as_slice().split_at(ADDRESS_PADDING);
    if padding.iter().any(|b| *b != 0) {
        return None;
    }
    Some(Address::from_slice(address))
}

/// Left-pad an address into a topic word, the way indexed addresses are emitted.
pub fn address_to_word(address: &Address) -> B256 {
    address.into_word()
}

/// Split `data` into exactly `N` big-endian unsigned words.
pub fn read_words<const N: usize>(data: &[u8]) -> Result<[U256; N], DecodeError> {
    if data.len() != N * WORD_SIZE {
        return Err(DecodeError::DataLengthMismatch {
            expected: N * WORD_SIZE,
            actual: data.len(),
        });
    }

    let mut words = [U256::ZERO; N];
    for (word, chunk) in words.iter_mut().zip(data.chunks_exact(WORD_SIZE)) {
        *word = U256::from_be_slice(chunk);
    }
    Ok(words)
}

/// Concatenate words into a data blob, the inverse of [`read_words`].
pub fn write_words(words: &[U256]) -> Vec<u8> {
    let mut data = Vec::with_capacity(words.len() * WORD_SIZE);
    for word in words {
        data.extend_from_slice(&word.to_be_bytes::<WORD_SIZE>());
    }
    data
}
