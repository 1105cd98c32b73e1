use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Block explorer API configuration.
///
/// Controls the endpoint, credentials and the paging/retry behaviour of the
/// log fetcher. The explorer caps every `getLogs` answer at `page_size` entries.
#[derive(Debug, Deserialize, Clone)]
pub struct ExplorerSettings {
    #[serde(default = "default_explorer_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    // Retries apply to transient failures only (transport, 429, 5xx)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    // Full pages in a row that may end without passing the previous last
    // block. A block holding more logs than a page can never be drained.
    #[serde(default = "default_max_stalled_pages")]
    pub max_stalled_pages: usize,
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self {
            base_url: default_explorer_url(),
            api_key: String::new(),
            page_size: default_page_size(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            max_stalled_pages: default_max_stalled_pages(),
        }
    }
}

fn default_explorer_url() -> String {
    "https://api.bscscan.com/api".to_string()
}

fn default_page_size() -> usize {
    1_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_max_stalled_pages() -> usize {
    1
}

/// Chain RPC endpoint used for pair metadata (reserves, token symbols).
#[derive(Debug, Deserialize, Clone)]
pub struct RpcSettings {
    #[serde(default = "default_rpc_url")]
    pub url: String,
}

fn default_rpc_url() -> String {
    "https://bsc-dataseed.binance.org".to_string()
}

/// Which logs to pull from the explorer.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Every log emitted by the pair contract.
    #[default]
    Pair,
    /// Swap logs routed through the router, across all pairs.
    RouterSwaps,
}

/// What to analyse: the pair, the block range and the target address.
#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisSettings {
    pub pair_address: String,
    pub from_block: u64,
    pub to_block: u64,
    #[serde(default)]
    pub mode: FetchMode,
    /// Query the explorer for the pair ABI instead of using the bundled one
    #[serde(default)]
    pub fetch_abi: bool,
    #[serde(default)]
    pub target_address: Option<String>,
    #[serde(default = "default_min_transactions")]
    pub min_transactions: usize,
    #[serde(default = "default_output_path")]
    pub output_path: String,
}

fn default_min_transactions() -> usize {
    1
}

fn default_output_path() -> String {
    "trades.json".to_string()
}

/// Root application configuration.
///
/// Loaded from an optional `config.yaml` (or any format the `config` crate
/// recognises) and `SWAPLENS__*` environment variables, e.g.
/// `SWAPLENS__EXPLORER__API_KEY`.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub explorer: ExplorerSettings,
    #[serde(default)]
    pub rpc: Option<RpcSettings>,
    pub analysis: AnalysisSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("SWAPLENS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }
}
