//! Raw explorer log → [`SwapRecord`].
//!
//! Decoding is fixed-layout: topics are 32-byte words, indexed addresses are
//! left-padded words and the Swap data blob is exactly four big-endian words.
//! It does not consult the ABI beyond topic0 identification.

use alloy::primitives::{Address, Bytes, B256};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::{
    abis::PANCAKE_ROUTER_V2,
    decoder::record::{DecodeReport, EventKind, SwapAmounts, SwapRecord, TopicMap},
    error::DecodeError,
    explorer::RawLogEntry,
    utils::{
        decode_hex, parse_index, parse_quantity, parse_quantity_u128, parse_word, read_words,
        word_to_address,
    },
};

/// Result of decoding a batch of logs.
#[derive(Debug, Default)]
pub struct DecodeResult {
    /// Decoded records in input order.
    pub records: Vec<SwapRecord>,
    pub report: DecodeReport,
}

/// Decode every log, dropping (and counting) the ones that cannot be decoded.
///
/// Entries with `blockNumber == 0` are pending or malformed and are dropped too.
pub fn decode_logs(logs: impl IntoIterator<Item = RawLogEntry>, topics: &TopicMap) -> DecodeResult {
    let logs = logs.into_iter();
    let mut result = DecodeResult {
        records: Vec::with_capacity(logs.size_hint().0),
        report: DecodeReport::default(),
    };

    for log in logs {
        match decode_log(&log, topics) {
            Ok(Some(record)) => {
                result.records.push(record);
                result.report.decoded += 1;
            },
            Ok(None) => result.report.zero_block += 1,
            Err(err) => {
                debug!("Skipping log {} #{}: {}", log.transaction_hash, log.log_index, err);
                result.report.count(&err);
            },
        }
    }

    let report = &result.report;
    if report.dropped() > 0 {
        warn!(
            "Throwing out {} logs: {} at block 0, {} unknown topic, {} bad swap data, {} missing addresses, {} malformed",
            report.dropped(),
            report.zero_block,
            report.unknown_topic,
            report.data_length_mismatch,
            report.missing_address,
            report.malformed
        );
    }
    info!("Decoded {} records", report.decoded);

    result
}

/// Decode one log. `Ok(None)` means the entry sits at block 0 and is dropped.
pub fn decode_log(log: &RawLogEntry, topics: &TopicMap) -> Result<Option<SwapRecord>, DecodeError> {
    // Pending entries may leave every other field empty
    let block_number = parse_quantity("blockNumber", &log.block_number)?;
    if block_number == 0 {
        return Ok(None);
    }

    let words = log
        .topics
        .iter()
        .map(|topic| parse_word("topics", topic))
        .collect::<Result<Vec<B256>, _>>()?;

    let topic0 = words.first().ok_or(DecodeError::MissingTopics)?;
    let event = topics.kind_of(topic0)?;

    let (from, to) = counterparties(event, &words[1..])?;

    let data = decode_hex("data", &log.data)?;
    let amounts = match event {
        EventKind::Swap => Some(SwapAmounts::from(read_words::<4>(&data)?)),
        _ => None,
    };

    let timestamp = parse_quantity("timeStamp", &log.time_stamp)?;
    let gas_price = parse_quantity_u128("gasPrice", &log.gas_price)?;
    let gas_used = parse_quantity("gasUsed", &log.gas_used)?;
    let log_index = parse_index("logIndex", &log.log_index)?;
    let transaction_index = parse_index("transactionIndex", &log.transaction_index)?;

    let date_time = i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .ok_or(DecodeError::InvalidTimestamp(timestamp))?;

    let contract_address: Address = log.address.parse().map_err(|_| DecodeError::MalformedHex {
        field: "address",
        value: log.address.clone(),
    })?;
    let transaction_hash = parse_word("transactionHash", &log.transaction_hash)?;

    Ok(Some(SwapRecord {
        event,
        contract_address,
        from,
        to,
        data: Bytes::from(data),
        block_number,
        timestamp,
        date_time,
        gas_price,
        gas_used,
        log_index,
        transaction_index,
        transaction_hash,
        amounts,
    }))
}

/// `From`/`To` of an event from its indexed topics (topic0 excluded).
///
/// Only address-shaped topics (12 zero bytes of padding) count. The first is
/// `From`, the second is `To`.
fn counterparties(
    event: EventKind,
    indexed: &[B256],
) -> Result<(Option<Address>, Option<Address>), DecodeError> {
    let addresses: Vec<Address> = indexed.iter().filter_map(word_to_address).collect();

    match event {
        EventKind::Swap | EventKind::Transfer => match addresses.as_slice() {
            [from, to, ..] => Ok((Some(*from), Some(*to))),
            _ => Err(DecodeError::MissingAddressTopic {
                event: event.as_str(),
                expected: 2,
                found: addresses.len(),
            }),
        },
        // The payer of a Mint on these pairs is always the router
        EventKind::Mint => Ok((addresses.first().copied(), Some(PANCAKE_ROUTER_V2))),
        EventKind::Sync => Ok((None, None)),
    }
}
