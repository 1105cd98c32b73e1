//! One analysis run: resolve event signatures, page the logs out of the
//! explorer, decode them and optionally keep only active addresses.

use alloy::primitives::Address;
use anyhow::{Context, Result};
use log::info;
use tokio_util::sync::CancellationToken;

use crate::{
    abis::PAIR_ABI_JSON,
    config::{AnalysisSettings, FetchMode},
    decoder::{decode_logs, DecodeReport, SwapRecord, TopicMap},
    explorer::{ExplorerClient, LogFetcher, LogQuery, LogSource},
    filter::keep_active_addresses,
    signatures::EventSignatures,
};

/// Counts of one run, so dropped and deduplicated entries are visible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub pages: usize,
    /// Logs returned by the explorer, overlap removed.
    pub fetched: usize,
    /// Entries repeated across page boundaries and removed.
    pub duplicates: usize,
    pub decode: DecodeReport,
    /// Records left after the active-address filter.
    pub active: usize,
}

#[derive(Debug)]
pub struct Analysis {
    /// Every decoded record, in chain order.
    pub records: Vec<SwapRecord>,
    /// Records of active addresses, sorted by `To`.
    pub active: Vec<SwapRecord>,
    pub report: RunReport,
}

/// Build the log query described by the analysis settings.
pub fn log_query(settings: &AnalysisSettings) -> Result<LogQuery> {
    if settings.from_block > settings.to_block {
        anyhow::bail!(
            "from_block {} is after to_block {}",
            settings.from_block,
            settings.to_block
        );
    }

    let query = match settings.mode {
        FetchMode::Pair => {
            let pair: Address = settings
                .pair_address
                .parse()
                .context("Invalid pair address")?;
            LogQuery::for_address(pair, settings.from_block, settings.to_block)
        },
        FetchMode::RouterSwaps => LogQuery::router_swaps(settings.from_block, settings.to_block),
    };

    Ok(query)
}

/// Event signatures of the pair, from the explorer or the bundled ABI.
pub async fn resolve_signatures(
    client: &ExplorerClient,
    pair: &Address,
    fetch_abi: bool,
) -> Result<EventSignatures> {
    let signatures = if fetch_abi {
        let abi = client
            .get_abi(pair)
            .await
            .context("Failed to fetch pair ABI")?;
        EventSignatures::from_abi_value(abi)?
    } else {
        EventSignatures::from_abi_json(PAIR_ABI_JSON)?
    };

    info!("Resolved {} event signatures", signatures.len());
    Ok(signatures)
}

/// Fetch, decode and filter the logs of `query`.
pub async fn analyze<S: LogSource>(
    fetcher: &LogFetcher<S>,
    signatures: &EventSignatures,
    query: &LogQuery,
    min_transactions: usize,
    cancellation_token: &CancellationToken,
) -> Result<Analysis> {
    let topics = TopicMap::from_signatures(signatures);

    let outcome = fetcher
        .fetch(query, cancellation_token)
        .await
        .context("Failed to fetch logs")?;

    let mut report = RunReport {
        pages: outcome.pages,
        fetched: outcome.logs.len(),
        duplicates: outcome.duplicates,
        ..Default::default()
    };

    let decoded = decode_logs(outcome.logs, &topics);
    report.decode = decoded.report;

    let active = keep_active_addresses(&decoded.records, min_transactions);
    report.active = active.len();

    info!(
        "Run finished: {} pages, {} logs ({} duplicates removed), {} records, {} dropped, {} active",
        report.pages,
        report.fetched,
        report.duplicates,
        report.decode.decoded,
        report.decode.dropped(),
        report.active
    );

    Ok(Analysis {
        records: decoded.records,
        active,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        decoder::EventKind,
        explorer::{
            fixture::{swap_log, sync_log, FixtureExplorer, PAIR},
            PagingConfig, RawLogEntry,
        },
    };
    use alloy::primitives::U256;
    use std::time::Duration;

    const SWAP_ONLY_ABI: &str = r#"[{
        "anonymous": false,
        "inputs": [
            {"indexed": true, "name": "sender", "type": "address"},
            {"indexed": false, "name": "amount0In", "type": "uint256"},
            {"indexed": false, "name": "amount1In", "type": "uint256"},
            {"indexed": false, "name": "amount0Out", "type": "uint256"},
            {"indexed": false, "name": "amount1Out", "type": "uint256"},
            {"indexed": true, "name": "to", "type": "address"}
        ],
        "name": "Swap",
        "type": "event"
    }]"#;

    fn paging(page_size: usize) -> PagingConfig {
        PagingConfig {
            page_size,
            max_retries: 0,
            retry_delay: Duration::from_millis(1),
            max_stalled_pages: 3,
        }
    }

    /// 1003 swaps. Blocks 1..=99 hold 10 each; block 100 holds the last 13,
    /// so a 1000-entry first page ends inside block 100.
    fn boundary_dataset() -> Vec<RawLogEntry> {
        (0..1_003usize)
            .map(|i| {
                let block = if i < 990 { 1 + (i / 10) as u64 } else { 100 };
                let log_index = if i < 990 { (i % 10) as u64 } else { (i - 990) as u64 };
                let trader = Address::repeat_byte((i % 7) as u8 + 1);
                swap_log(
                    block,
                    log_index,
                    i as u64,
                    [U256::from(i), U256::ZERO, U256::ZERO, U256::from(i + 1)],
                    trader,
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_end_to_end_page_boundary() {
        let signatures = EventSignatures::from_abi_json(SWAP_ONLY_ABI).unwrap();
        let fetcher = LogFetcher::new(FixtureExplorer::new(boundary_dataset(), 1_000), paging(1_000));
        let query = LogQuery::for_address(PAIR, 0, 200);

        let analysis = analyze(&fetcher, &signatures, &query, 1, &CancellationToken::new())
            .await
            .unwrap();

        // Page one ends in block 100, page two re-reads block 100 in full
        let requests = fetcher.source().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].from_block, 100);

        assert_eq!(analysis.report.pages, 2);
        assert_eq!(analysis.report.fetched, 1_003);
        assert_eq!(analysis.report.duplicates, 10);
        assert_eq!(analysis.report.decode.decoded, 1_003);
        assert_eq!(analysis.report.decode.dropped(), 0);

        let block_100 = analysis
            .records
            .iter()
            .filter(|r| r.block_number == 100)
            .count();
        assert_eq!(block_100, 13);

        for record in &analysis.records {
            assert_eq!(record.event, EventKind::Swap);
            let amounts = record.amounts.unwrap();
            assert_eq!(amounts.amount1_out, amounts.amount0_in + U256::from(1u64));
            assert_eq!(record.date_time.timestamp(), record.timestamp as i64);
        }
        assert_eq!(analysis.active.len(), 1_003);
    }

    #[tokio::test]
    async fn test_events_outside_the_abi_are_counted() {
        let signatures = EventSignatures::from_abi_json(SWAP_ONLY_ABI).unwrap();
        let logs = vec![
            swap_log(1, 0, 1, [U256::from(1u64); 4], Address::repeat_byte(0x01)),
            sync_log(1, 1, 1),
            swap_log(2, 0, 2, [U256::from(1u64); 4], Address::repeat_byte(0x01)),
        ];
        let fetcher = LogFetcher::new(FixtureExplorer::new(logs, 1_000), paging(1_000));
        let query = LogQuery::for_address(PAIR, 0, 10);

        let analysis = analyze(&fetcher, &signatures, &query, 2, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(analysis.report.fetched, 3);
        assert_eq!(analysis.report.decode.unknown_topic, 1);
        assert_eq!(analysis.records.len(), 2);
        assert_eq!(analysis.active.len(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_entry_is_dropped_not_fatal() {
        let signatures = EventSignatures::from_abi_json(SWAP_ONLY_ABI).unwrap();
        let mut logs: Vec<RawLogEntry> = (1..=5u64)
            .map(|block| {
                swap_log(block, 1, block, [U256::from(block); 4], Address::repeat_byte(0x01))
            })
            .collect();
        logs[2].log_index = "0xzz".to_string();
        let fetcher = LogFetcher::new(FixtureExplorer::new(logs, 1_000), paging(1_000));

        let analysis = analyze(
            &fetcher,
            &signatures,
            &LogQuery::for_address(PAIR, 0, 100),
            1,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(analysis.report.fetched, 5);
        assert_eq!(analysis.report.decode.malformed, 1);
        assert_eq!(analysis.records.len(), 4);
        assert!(analysis.records.iter().all(|r| r.block_number != 3));
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_run() {
        let explorer = FixtureExplorer::new(boundary_dataset(), 1_000);
        explorer.fail_next(crate::error::FetchError::FetchFailed {
            status: 500,
            body: "boom".to_string(),
        });
        let fetcher = LogFetcher::new(explorer, paging(1_000));
        let signatures = EventSignatures::from_abi_json(SWAP_ONLY_ABI).unwrap();

        let result = analyze(
            &fetcher,
            &signatures,
            &LogQuery::for_address(PAIR, 0, 200),
            1,
            &CancellationToken::new(),
        )
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_log_query_from_settings() {
        let settings = AnalysisSettings {
            pair_address: "0x16b9a82891338f9ba80e2d6970fdda79d1eb0dae".to_string(),
            from_block: 10,
            to_block: 20,
            mode: FetchMode::Pair,
            fetch_abi: false,
            target_address: None,
            min_transactions: 1,
            output_path: "trades.json".to_string(),
        };

        let query = log_query(&settings).unwrap();
        assert!(query.address.is_some());
        assert!(query.topic0.is_none());

        let router = log_query(&AnalysisSettings {
            mode: FetchMode::RouterSwaps,
            ..settings.clone()
        })
        .unwrap();
        assert!(router.address.is_none());
        assert!(router.topic1.is_some());

        assert!(log_query(&AnalysisSettings {
            from_block: 30,
            ..settings
        })
        .is_err());
    }
}
