//! Typed errors for the resolver, the log fetcher and the decoder.
//!
//! Fetch and resolver errors abort the whole run. Decode errors are scoped to
//! one log entry: the decoder counts them and moves on.

use alloy::primitives::B256;
use thiserror::Error;

/// Errors raised while deriving event signatures from a contract ABI.
#[derive(Error, Debug)]
pub enum AbiError {
    #[error("ABI is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("malformed ABI: event descriptor #{index} is missing `{field}`")]
    MalformedAbi { index: usize, field: &'static str },
}

/// Errors raised while paging logs out of the explorer.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Definitive non-success answer from the explorer.
    #[error("explorer request failed with status {status}: {body}")]
    FetchFailed { status: u16, body: String },
    /// Full pages keep coming back without moving the block high-water mark.
    #[error("pagination stalled at block {block} after {pages} full pages without progress")]
    StalledPagination { block: u64, pages: usize },
    /// Failure worth retrying (transport error, 429, 5xx, rate-limit notice).
    #[error("transient explorer failure: {0}")]
    Transient(String),
    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
    #[error("malformed explorer response: {0}")]
    MalformedResponse(String),
    #[error("log entry {tx_hash} has unreadable `{field}`: {value:?}")]
    InvalidEntry {
        tx_hash: String,
        field: &'static str,
        value: String,
    },
    #[error("log fetch cancelled at block {0}")]
    Cancelled(u64),
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transient(err.to_string())
    }
}

/// Per-entry decode failures. The decoder drops the entry and counts it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("log has no topics")]
    MissingTopics,
    #[error("topic {0} does not match any known event")]
    UnknownTopic(B256),
    #[error("swap data is {actual} bytes, expected {expected}")]
    DataLengthMismatch { expected: usize, actual: usize },
    #[error("{event} log carries {found} address topics, expected {expected}")]
    MissingAddressTopic {
        event: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("field `{field}` is not valid hex: {value:?}")]
    MalformedHex { field: &'static str, value: String },
    #[error("timestamp {0} is out of range")]
    InvalidTimestamp(u64),
}
