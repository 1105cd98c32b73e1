//! In-memory explorer used by tests.
//!
//! Serves a fixed, ordered set of logs the way the real endpoint does: the
//! first `page_size` logs whose block falls in the requested range.

use std::{collections::VecDeque, sync::Mutex};

use alloy::{
    primitives::{address, Address, B256, U256},
    sol_types::SolEvent,
};
use async_trait::async_trait;

use crate::{
    abis::{Mint, Swap, Sync as SyncEvent, Transfer, PANCAKE_ROUTER_V2},
    error::FetchError,
    explorer::{LogQuery, LogSource, RawLogEntry},
    utils::{address_to_word, hex_encode, write_words},
};

/// Pair contract every fixture log is emitted by.
pub const PAIR: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");

/// Unix time of block 0 in fixture logs; one block every 3 seconds.
const GENESIS_TIME: u64 = 1_600_000_000;

pub struct FixtureExplorer {
    logs: Vec<RawLogEntry>,
    page_size: usize,
    failures: Mutex<VecDeque<FetchError>>,
    requests: Mutex<Vec<LogQuery>>,
}

impl FixtureExplorer {
    pub fn new(logs: Vec<RawLogEntry>, page_size: usize) -> Self {
        Self {
            logs,
            page_size,
            failures: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Make the next request fail with `err`. Calls queue up.
    pub fn fail_next(&self, err: FetchError) {
        self.failures.lock().unwrap().push_back(err);
    }

    /// Every request received so far, failed ones included.
    pub fn requests(&self) -> Vec<LogQuery> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogSource for FixtureExplorer {
    async fn get_logs(&self, query: &LogQuery) -> Result<Vec<RawLogEntry>, FetchError> {
        self.requests.lock().unwrap().push(*query);

        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }

        Ok(self
            .logs
            .iter()
            .filter(|log| {
                log.block_number()
                    .map_or(true, |b| b >= query.from_block && b <= query.to_block)
            })
            .take(self.page_size)
            .cloned()
            .collect())
    }
}

fn tx_hash(seed: u64) -> String {
    hex_encode(B256::left_padding_from(&seed.to_be_bytes()).as_slice())
}

fn topic(word: B256) -> String {
    format!("{word:#x}")
}

fn raw_log(block: u64, log_index: u64, tx_seed: u64, topics: Vec<B256>, data: &[u8]) -> RawLogEntry {
    RawLogEntry {
        address: format!("{PAIR:#x}"),
        topics: topics.into_iter().map(topic).collect(),
        data: hex_encode(data),
        block_number: format!("{block:#x}"),
        time_stamp: format!("{:#x}", GENESIS_TIME + block * 3),
        gas_price: "0x12a05f200".to_string(),
        gas_used: "0x2a9a7".to_string(),
        log_index: if log_index == 0 { "0x".to_string() } else { format!("{log_index:#x}") },
        transaction_index: "0x".to_string(),
        transaction_hash: tx_hash(tx_seed),
    }
}

/// A Swap log with `sender = router` and the given `to`.
pub fn swap_log(
    block: u64,
    log_index: u64,
    tx_seed: u64,
    amounts: [U256; 4],
    to: Address,
) -> RawLogEntry {
    raw_log(
        block,
        log_index,
        tx_seed,
        vec![
            Swap::SIGNATURE_HASH,
            address_to_word(&PANCAKE_ROUTER_V2),
            address_to_word(&to),
        ],
        &write_words(&amounts),
    )
}

pub fn transfer_log(
    block: u64,
    log_index: u64,
    tx_seed: u64,
    from: Address,
    to: Address,
    value: U256,
) -> RawLogEntry {
    raw_log(
        block,
        log_index,
        tx_seed,
        vec![
            Transfer::SIGNATURE_HASH,
            address_to_word(&from),
            address_to_word(&to),
        ],
        &write_words(&[value]),
    )
}

pub fn mint_log(block: u64, log_index: u64, tx_seed: u64, sender: Address) -> RawLogEntry {
    raw_log(
        block,
        log_index,
        tx_seed,
        vec![Mint::SIGNATURE_HASH, address_to_word(&sender)],
        &write_words(&[U256::from(5u64), U256::from(7u64)]),
    )
}

pub fn sync_log(block: u64, log_index: u64, tx_seed: u64) -> RawLogEntry {
    raw_log(
        block,
        log_index,
        tx_seed,
        vec![SyncEvent::SIGNATURE_HASH],
        &write_words(&[U256::from(1_000u64), U256::from(2_000u64)]),
    )
}
