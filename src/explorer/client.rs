use std::time::Duration;

use alloy::primitives::Address;
use anyhow::Context;
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::{
    config::ExplorerSettings,
    error::FetchError,
    explorer::{
        types::{ExplorerResponse, LogQuery, RawLogEntry},
        LogSource,
    },
};

/// Message the explorer returns with status "0" when a range has no logs.
const NO_RECORDS: &str = "No records found";

/// HTTP client for an Etherscan-compatible explorer API (BscScan, Etherscan, ...).
#[derive(Clone)]
pub struct ExplorerClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl ExplorerClient {
    pub fn new(settings: &ExplorerSettings) -> anyhow::Result<Self> {
        let base_url = Url::parse(&settings.base_url).context("Invalid explorer URL")?;

        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("Failed to build explorer HTTP client")?;

        Ok(Self {
            http,
            base_url,
            api_key: settings.api_key.clone(),
        })
    }

    fn logs_url(&self, query: &LogQuery) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("module", "logs")
                .append_pair("action", "getLogs")
                .append_pair("fromBlock", &query.from_block.to_string())
                .append_pair("toBlock", &query.to_block.to_string());
            if let Some(address) = query.address {
                pairs.append_pair("address", &format!("{address:#x}"));
            }
            if let Some(topic0) = query.topic0 {
                pairs.append_pair("topic0", &format!("{topic0:#x}"));
            }
            if let Some(topic1) = query.topic1 {
                pairs.append_pair("topic1", &format!("{topic1:#x}"));
            }
            // Explorers require the AND operator when two topics are given
            if query.topic0.is_some() && query.topic1.is_some() {
                pairs.append_pair("topic0_1_opr", "and");
            }
            pairs.append_pair("apikey", &self.api_key);
        }
        url
    }

    fn abi_url(&self, address: &Address) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("module", "contract")
            .append_pair("action", "getabi")
            .append_pair("address", &format!("{address:#x}"))
            .append_pair("apikey", &self.api_key);
        url
    }

    /// Perform one request and return the `result` member of the envelope.
    async fn get_result(&self, url: Url) -> Result<serde_json::Value, FetchError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(FetchError::Transient(format!("HTTP {status}: {body}")));
        }
        if !status.is_success() {
            return Err(FetchError::FetchFailed {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: ExplorerResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::MalformedResponse(format!("{e}: {body}")))?;

        interpret_envelope(status.as_u16(), envelope, body)
    }

    /// Fetch a verified contract's ABI. The explorer returns it as a JSON string.
    pub async fn get_abi(&self, address: &Address) -> Result<serde_json::Value, FetchError> {
        let result = self.get_result(self.abi_url(address)).await?;
        let abi = result.as_str().ok_or_else(|| {
            FetchError::MalformedResponse(format!("ABI result is not a string: {result}"))
        })?;
        serde_json::from_str(abi).map_err(|e| FetchError::MalformedResponse(e.to_string()))
    }
}

/// Map the explorer's `status`/`message` envelope onto a page result.
fn interpret_envelope(
    status: u16,
    envelope: ExplorerResponse,
    body: String,
) -> Result<serde_json::Value, FetchError> {
    if envelope.status != "0" {
        return Ok(envelope.result);
    }

    if envelope.message.starts_with(NO_RECORDS) {
        return Ok(serde_json::Value::Array(Vec::new()));
    }

    let detail = envelope.result.as_str().unwrap_or(&envelope.message);
    if detail.to_lowercase().contains("rate limit") {
        return Err(FetchError::Transient(detail.to_string()));
    }

    Err(FetchError::FetchFailed { status, body })
}

#[async_trait]
impl LogSource for ExplorerClient {
    async fn get_logs(&self, query: &LogQuery) -> Result<Vec<RawLogEntry>, FetchError> {
        debug!(
            "getLogs fromBlock={} toBlock={} address={:?}",
            query.from_block, query.to_block, query.address
        );

        let result = self.get_result(self.logs_url(query)).await?;
        serde_json::from_value(result).map_err(|e| FetchError::MalformedResponse(e.to_string()))
    }
}
