use alloy::primitives::{Address, Bytes, B256, U256};
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::{error::DecodeError, signatures::EventSignatures};

/// Pair events the decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    Swap,
    Mint,
    Transfer,
    Sync,
}

impl EventKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Swap" => Some(Self::Swap),
            "Mint" => Some(Self::Mint),
            "Transfer" => Some(Self::Transfer),
            "Sync" => Some(Self::Sync),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Swap => "Swap",
            Self::Mint => "Mint",
            Self::Transfer => "Transfer",
            Self::Sync => "Sync",
        }
    }
}

/// Topic0 → event lookup built from resolved signatures.
///
/// Events of the ABI outside [`EventKind`] (Approval, Burn, ...) are left out,
/// so their logs decode as [`DecodeError::UnknownTopic`].
#[derive(Debug, Clone, Default)]
pub struct TopicMap {
    kinds: FxHashMap<B256, EventKind>,
}

impl TopicMap {
    pub fn from_signatures(signatures: &EventSignatures) -> Self {
        let kinds = signatures
            .iter()
            .filter_map(|sig| EventKind::from_name(&sig.name).map(|kind| (sig.topic_hash, kind)))
            .collect();
        Self { kinds }
    }

    pub fn kind_of(&self, topic: &B256) -> Result<EventKind, DecodeError> {
        self.kinds
            .get(topic)
            .copied()
            .ok_or(DecodeError::UnknownTopic(*topic))
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// The four amounts of a Uniswap-V2 style Swap, in data-blob order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwapAmounts {
    pub amount0_in: U256,
    pub amount1_in: U256,
    pub amount0_out: U256,
    pub amount1_out: U256,
}

impl From<[U256; 4]> for SwapAmounts {
    fn from([amount0_in, amount1_in, amount0_out, amount1_out]: [U256; 4]) -> Self {
        Self {
            amount0_in,
            amount1_in,
            amount0_out,
            amount1_out,
        }
    }
}

impl SwapAmounts {
    /// Sum of all four legs, saturating.
    pub fn total(&self) -> U256 {
        self.amount0_in
            .saturating_add(self.amount1_in)
            .saturating_add(self.amount0_out)
            .saturating_add(self.amount1_out)
    }
}

/// A decoded pair log.
///
/// `from`/`to` are absent for Sync. For Swap, `to` is the trader receiving
/// the output; for Mint, `to` is always the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapRecord {
    pub event: EventKind,
    pub contract_address: Address,
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub data: Bytes,
    pub block_number: u64,
    pub timestamp: u64,
    pub date_time: DateTime<Utc>,
    pub gas_price: u128,
    pub gas_used: u64,
    pub log_index: u64,
    pub transaction_index: u64,
    pub transaction_hash: B256,
    /// Present for Swap only.
    pub amounts: Option<SwapAmounts>,
}

/// Counts of a decode pass, so dropped entries are visible to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    pub decoded: usize,
    pub zero_block: usize,
    pub unknown_topic: usize,
    pub data_length_mismatch: usize,
    pub missing_address: usize,
    pub malformed: usize,
}

impl DecodeReport {
    pub fn dropped(&self) -> usize {
        self.zero_block
            + self.unknown_topic
            + self.data_length_mismatch
            + self.missing_address
            + self.malformed
    }

    pub(crate) fn count(&mut self, err: &DecodeError) {
        match err {
            DecodeError::UnknownTopic(_) | DecodeError::MissingTopics => self.unknown_topic += 1,
            DecodeError::DataLengthMismatch { .. } => self.data_length_mismatch += 1,
            DecodeError::MissingAddressTopic { .. } => self.missing_address += 1,
            DecodeError::MalformedHex { .. } | DecodeError::InvalidTimestamp(_) => {
                self.malformed += 1
            },
        }
    }
}
