use alloy::{
    primitives::{Address, B256},
    sol_types::SolEvent,
};
use serde::{Deserialize, Serialize};

use crate::{
    abis::{Swap, PANCAKE_ROUTER_V2},
    error::DecodeError,
    utils::{address_to_word, parse_index, parse_quantity},
};

/// A log entry as returned by the explorer `getLogs` endpoint.
///
/// Every numeric field is a hex string; `logIndex` and `transactionIndex`
/// come back as a bare `0x` when they are zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLogEntry {
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
    pub block_number: String,
    #[serde(default)]
    pub time_stamp: String,
    #[serde(default)]
    pub gas_price: String,
    #[serde(default)]
    pub gas_used: String,
    #[serde(default)]
    pub log_index: String,
    #[serde(default)]
    pub transaction_index: String,
    pub transaction_hash: String,
}

impl RawLogEntry {
    pub fn block_number(&self) -> Result<u64, DecodeError> {
        parse_quantity("blockNumber", &self.block_number)
    }

    pub fn log_index(&self) -> Result<u64, DecodeError> {
        parse_index("logIndex", &self.log_index)
    }

    /// Identity of a log across overlapping pages.
    pub fn key(&self) -> Result<(String, u64), DecodeError> {
        Ok((self.transaction_hash.to_lowercase(), self.log_index()?))
    }
}

/// Parameters of one `getLogs` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogQuery {
    pub from_block: u64,
    pub to_block: u64,
    pub address: Option<Address>,
    pub topic0: Option<B256>,
    pub topic1: Option<B256>,
}

impl LogQuery {
    /// Every log emitted by `address` in `[from_block, to_block]`.
    pub fn for_address(address: Address, from_block: u64, to_block: u64) -> Self {
        Self {
            from_block,
            to_block,
            address: Some(address),
            topic0: None,
            topic1: None,
        }
    }

    /// Swap logs whose `sender` is the PancakeSwap V2 router, across all pairs.
    pub fn router_swaps(from_block: u64, to_block: u64) -> Self {
        Self {
            from_block,
            to_block,
            address: None,
            topic0: Some(Swap::SIGNATURE_HASH),
            topic1: Some(address_to_word(&PANCAKE_ROUTER_V2)),
        }
    }

    /// Same filter, re-anchored at `from_block`.
    pub fn starting_at(&self, from_block: u64) -> Self {
        Self { from_block, ..*self }
    }
}

/// Envelope of every explorer API answer.
#[derive(Debug, Deserialize)]
pub(crate) struct ExplorerResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: serde_json::Value,
}
