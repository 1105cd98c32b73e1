//! Utility functions for swaplens.
//!
//! - [`binary`] - Fixed-width decoding of explorer hex fields (quantities, words, addresses)
//! - [`conversion`] - Hex encoding and decimal-adjusted U256 conversion

mod binary;
mod conversion;

// ============================================
// Re-exports
// ============================================

pub use binary::{
    address_to_word, decode_hex, parse_index, parse_quantity, parse_quantity_u128, parse_word,
    read_words, word_to_address, write_words, WORD_SIZE,
};
pub use conversion::{hex_encode, u256_to_f64, u256_to_f64_safe};
