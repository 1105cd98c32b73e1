//! Pool-level context read from the chain: reserves, `kLast` and the two
//! tokens' metadata. Fetched once per analysis run.

use std::{future::IntoFuture, time::Duration};

use alloy::{
    primitives::{Address, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
};
use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use url::Url;

use crate::abis::{IPair, IERC20};

/// Timeout for individual RPC calls (30 seconds)
const RPC_CALL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

/// Snapshot of a pair contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairInfo {
    pub pair_contract_address: Address,
    pub k_last: U256,
    pub reserve0: U256,
    pub reserve1: U256,
    /// Block timestamp of the last reserve update.
    pub timestamp: u32,
    pub token0: TokenInfo,
    pub token1: TokenInfo,
}

/// HTTP provider for the chain RPC endpoint.
pub fn connect(rpc_url: &str) -> Result<DynProvider> {
    let url = Url::parse(rpc_url).context("Invalid RPC URL")?;
    Ok(DynProvider::new(ProviderBuilder::new().connect_http(url)))
}

async fn with_timeout<T, E, F>(what: &str, call: F) -> Result<T>
where
    F: IntoFuture<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    tokio::time::timeout(RPC_CALL_TIMEOUT, call)
        .await
        .with_context(|| format!("{what} timed out"))?
        .with_context(|| format!("{what} failed"))
}

async fn fetch_token(provider: &DynProvider, address: Address) -> Result<TokenInfo> {
    let token = IERC20::new(address, provider);

    let symbol = with_timeout("symbol()", token.symbol().call()).await?;
    let decimals = with_timeout("decimals()", token.decimals().call()).await?;

    Ok(TokenInfo {
        address,
        symbol,
        decimals,
    })
}

/// Read `kLast`, `getReserves` and both tokens' `symbol`/`decimals`.
pub async fn fetch_pair_info(provider: &DynProvider, pair_address: Address) -> Result<PairInfo> {
    let pair = IPair::new(pair_address, provider);

    let k_last = with_timeout("kLast()", pair.kLast().call()).await?;
    let reserves = with_timeout("getReserves()", pair.getReserves().call()).await?;
    let token0 = with_timeout("token0()", pair.token0().call()).await?;
    let token1 = with_timeout("token1()", pair.token1().call()).await?;

    let token0 = fetch_token(provider, token0)
        .await
        .with_context(|| format!("Failed to read token0 {token0:#x}"))?;
    let token1 = fetch_token(provider, token1)
        .await
        .with_context(|| format!("Failed to read token1 {token1:#x}"))?;

    info!(
        "Pair {:#x}: {} / {}, reserves {} / {}",
        pair_address, token0.symbol, token1.symbol, reserves.reserve0, reserves.reserve1
    );

    Ok(PairInfo {
        pair_contract_address: pair_address,
        k_last,
        reserve0: U256::from(reserves.reserve0),
        reserve1: U256::from(reserves.reserve1),
        timestamp: reserves.blockTimestampLast,
        token0,
        token1,
    })
}

/// True when `address` has deployed code, i.e. is a contract rather than an EOA.
pub async fn address_is_contract(provider: &DynProvider, address: Address) -> Result<bool> {
    let code = with_timeout("eth_getCode", provider.get_code_at(address)).await?;
    Ok(!code.is_empty())
}
