//! Active-address filtering.
//!
//! Keeps the records of counterparties that traded in at least `k` distinct
//! transactions, counting an address once per transaction no matter how many
//! logs that transaction emitted.

use alloy::primitives::{Address, B256};
use log::info;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::decoder::SwapRecord;

/// Distinct transactions per `To` address.
pub fn transaction_counts(records: &[SwapRecord]) -> FxHashMap<Address, usize> {
    let mut seen: FxHashSet<(Address, B256)> = FxHashSet::default();
    let mut counts: FxHashMap<Address, usize> = FxHashMap::default();

    for record in records {
        let Some(to) = record.to else {
            continue;
        };
        if seen.insert((to, record.transaction_hash)) {
            *counts.entry(to).or_default() += 1;
        }
    }

    counts
}

/// Records whose `To` address appears in at least `min_transactions` distinct
/// transactions, sorted by `To` ascending; within one address the input order
/// is kept.
///
/// `min_transactions <= 1` keeps every record (only the ordering changes).
/// Records without a `To` sort first in that case and are dropped otherwise.
pub fn keep_active_addresses(records: &[SwapRecord], min_transactions: usize) -> Vec<SwapRecord> {
    let mut kept: Vec<SwapRecord> = if min_transactions <= 1 {
        records.to_vec()
    } else {
        let counts = transaction_counts(records);
        records
            .iter()
            .filter(|record| {
                record
                    .to
                    .and_then(|to| counts.get(&to))
                    .is_some_and(|count| *count >= min_transactions)
            })
            .cloned()
            .collect()
    };

    // Stable sort keeps event order within an address
    kept.sort_by_key(|record| record.to);

    info!(
        "Kept {} of {} records with at least {} transactions per address",
        kept.len(),
        records.len(),
        min_transactions
    );

    kept
}
