//! Gap-free paging over a page-capped `getLogs` endpoint.
//!
//! The explorer returns at most `page_size` logs per request, ordered by
//! `(blockNumber, logIndex)`. When a page comes back full, the next request is
//! re-anchored at the block of the last log of the page, not the block after
//! it: several logs can share that block and the page may have cut through
//! them. Re-reading that block means consecutive pages overlap, so logs are
//! deduplicated by `(transactionHash, logIndex)`.
//!
//! Entries whose block or log index cannot be read are passed through as-is
//! for the decoder to drop. Only the last entry of a full page must be readable.

use std::time::Duration;

use log::{debug, info, warn};
use rustc_hash::FxHashSet;
use tokio_util::sync::CancellationToken;

use crate::{
    config::ExplorerSettings,
    error::{DecodeError, FetchError},
    explorer::{
        types::{LogQuery, RawLogEntry},
        LogSource,
    },
};

/// Paging and retry parameters of a [`LogFetcher`].
#[derive(Debug, Clone, Copy)]
pub struct PagingConfig {
    /// Page cap of the source. A page this long means the range is not drained.
    pub page_size: usize,
    pub max_retries: u32,
    /// Base delay of the exponential backoff between retries.
    pub retry_delay: Duration,
    /// Consecutive full pages tolerated without the block high-water mark advancing.
    pub max_stalled_pages: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self::from(&ExplorerSettings::default())
    }
}

impl From<&ExplorerSettings> for PagingConfig {
    fn from(settings: &ExplorerSettings) -> Self {
        Self {
            page_size: settings.page_size.max(1),
            max_retries: settings.max_retries,
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
            max_stalled_pages: settings.max_stalled_pages.max(1),
        }
    }
}

/// Logs of one fetch, plus paging statistics.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Unique logs in source order.
    pub logs: Vec<RawLogEntry>,
    pub pages: usize,
    /// Entries dropped because an earlier page already returned them.
    pub duplicates: usize,
    /// Entries kept without deduplication because their block or key is unreadable.
    pub malformed: usize,
}

/// Pages through a [`LogSource`] until a block range is drained.
pub struct LogFetcher<S> {
    source: S,
    config: PagingConfig,
}

impl<S: LogSource> LogFetcher<S> {
    pub fn new(source: S, config: PagingConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch every log in `[query.from_block, query.to_block]` matching the
    /// query filter, exactly once each.
    ///
    /// Pages are requested one after another. The cancellation token is
    /// checked before every page and during retry backoff.
    pub async fn fetch(
        &self,
        query: &LogQuery,
        cancellation_token: &CancellationToken,
    ) -> Result<FetchOutcome, FetchError> {
        info!(
            "Fetching logs from block {} to block {}",
            query.from_block, query.to_block
        );

        let mut outcome = FetchOutcome::default();
        let mut seen: FxHashSet<(String, u64)> = FxHashSet::default();
        let mut cursor = query.from_block;
        let mut high_water: Option<u64> = None;
        let mut stalled_pages = 0usize;

        loop {
            if cancellation_token.is_cancelled() {
                return Err(FetchError::Cancelled(cursor));
            }

            let page = self
                .fetch_page_with_retry(&query.starting_at(cursor), cancellation_token)
                .await?;
            outcome.pages += 1;

            let page_len = page.len();

            // The next request is anchored on this block, so it has to be readable
            if page_len >= self.config.page_size {
                if let Some(last) = page.last() {
                    last.block_number().map_err(|e| invalid_entry(last, e))?;
                }
            }

            let mut first_block = None;
            let mut last_block = None;

            for entry in page {
                let (block, key) = match (entry.block_number(), entry.key()) {
                    (Ok(block), Ok(key)) => (block, key),
                    (Err(err), _) | (_, Err(err)) => {
                        // Left for the decoder to drop and count
                        debug!(
                            "Passing through unreadable log {}: {}",
                            entry.transaction_hash, err
                        );
                        outcome.malformed += 1;
                        outcome.logs.push(entry);
                        continue;
                    },
                };

                first_block.get_or_insert(block);
                last_block = Some(block);

                if seen.insert(key) {
                    outcome.logs.push(entry);
                } else {
                    outcome.duplicates += 1;
                }
            }

            let (Some(first_block), Some(last_block)) = (first_block, last_block) else {
                info!(
                    "No logs from block {} to block {}. Found {} logs in total",
                    cursor,
                    query.to_block,
                    outcome.logs.len()
                );
                break;
            };

            if page_len < self.config.page_size {
                info!(
                    "Found {} logs from block {} to block {}. Finishing. Found {} logs in total",
                    page_len,
                    first_block,
                    last_block,
                    outcome.logs.len()
                );
                break;
            }

            // A full page that ends at or below the previous high-water mark
            // means the next request would return the same page again
            match high_water {
                Some(mark) if last_block <= mark => {
                    stalled_pages += 1;
                    warn!(
                        "Full page ended at block {} without passing block {} ({}/{})",
                        last_block, mark, stalled_pages, self.config.max_stalled_pages
                    );
                    if stalled_pages >= self.config.max_stalled_pages {
                        return Err(FetchError::StalledPagination {
                            block: mark,
                            pages: stalled_pages,
                        });
                    }
                },
                _ => {
                    high_water = Some(last_block);
                    stalled_pages = 0;
                },
            }

            cursor = cursor.max(last_block);
            info!(
                "Found {} logs from block {} to block {}. Scraping again from block {}",
                page_len, first_block, last_block, cursor
            );
        }

        if outcome.duplicates > 0 {
            debug!(
                "Dropped {} logs repeated across page boundaries",
                outcome.duplicates
            );
        }

        Ok(outcome)
    }

    /// Request one page, retrying transient failures with exponential backoff.
    async fn fetch_page_with_retry(
        &self,
        query: &LogQuery,
        cancellation_token: &CancellationToken,
    ) -> Result<Vec<RawLogEntry>, FetchError> {
        let mut attempt: u32 = 0;

        loop {
            match self.source.get_logs(query).await {
                Ok(page) => return Ok(page),
                Err(err) if err.is_transient() => {
                    attempt += 1;
                    if attempt > self.config.max_retries {
                        return Err(FetchError::RetriesExhausted {
                            attempts: attempt,
                            last: err.to_string(),
                        });
                    }

                    let delay = self.config.retry_delay * 2_u32.saturating_pow(attempt - 1);
                    warn!(
                        "Page from block {} failed ({}), retrying in {:?} ({}/{})",
                        query.from_block, err, delay, attempt, self.config.max_retries
                    );

                    tokio::select! {
                        _ = cancellation_token.cancelled() => {
                            return Err(FetchError::Cancelled(query.from_block));
                        },
                        _ = tokio::time::sleep(delay) => {},
                    }
                },
                Err(err) => return Err(err),
            }
        }
    }
}

fn invalid_entry(entry: &RawLogEntry, err: DecodeError) -> FetchError {
    let (field, value) = match err {
        DecodeError::MalformedHex { field, value } => (field, value),
        other => ("log", other.to_string()),
    };
    FetchError::InvalidEntry {
        tx_hash: entry.transaction_hash.clone(),
        field,
        value,
    }
}
