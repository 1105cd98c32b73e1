//! Block explorer access: the HTTP client, the paging log fetcher and the
//! [`LogSource`] seam between them.

pub mod client;
pub mod fetcher;
pub mod types;

#[cfg(test)]
pub(crate) mod fixture;

use async_trait::async_trait;

pub use client::ExplorerClient;
pub use fetcher::{FetchOutcome, LogFetcher, PagingConfig};
pub use types::{LogQuery, RawLogEntry};

use crate::error::FetchError;

/// One page of logs per call, in `(blockNumber, logIndex)` order, starting at
/// `query.from_block` and capped by the source's page size.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn get_logs(&self, query: &LogQuery) -> Result<Vec<RawLogEntry>, FetchError>;
}
