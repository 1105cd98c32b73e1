//! Chart data for the plotting layer.
//!
//! Splits decoded swaps into the target address's trades and everyone
//! else's, with the per-point values a price/time scatter needs. Rendering
//! itself happens outside this crate, from the JSON written here.

use std::{fs::File, io::BufWriter, path::Path};

use alloy::primitives::{Address, B256, U256};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

use crate::{
    decoder::{EventKind, SwapRecord},
    pair::PairInfo,
    utils::u256_to_f64,
};

/// Series longer than this are thinned before export.
const MAX_SERIES_POINTS: usize = 1_000;
const THINNING_STEP: usize = 10;

/// Decimals assumed when no pair info is available.
const DEFAULT_DECIMALS: u8 = 18;

#[derive(Debug, Clone, Serialize)]
pub struct TradePoint {
    pub date_time: DateTime<Utc>,
    pub block_number: u64,
    pub transaction_hash: B256,
    pub to: Option<Address>,
    /// Token1 priced in token0; `None` when no token1 moved.
    pub price: Option<f64>,
    /// log2 of the sum of the four raw swap amounts.
    pub swap_size: f64,
    /// The trader received token1.
    pub is_buying: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TradeChart {
    pub title: String,
    pub y_label: String,
    pub target: Vec<TradePoint>,
    pub other: Vec<TradePoint>,
}

fn net(a: U256, b: U256) -> U256 {
    if a > b {
        a - b
    } else {
        b - a
    }
}

fn trade_point(record: &SwapRecord, decimals: (u8, u8)) -> Option<TradePoint> {
    let amounts = record.amounts?;

    let amount0 = u256_to_f64(net(amounts.amount0_in, amounts.amount0_out), decimals.0);
    let amount1 = u256_to_f64(net(amounts.amount1_in, amounts.amount1_out), decimals.1);
    let price = (amount1 > 0.0).then(|| amount0 / amount1);

    let total = u256_to_f64(amounts.total(), 0);
    let swap_size = if total > 0.0 { total.log2() } else { 0.0 };

    Some(TradePoint {
        date_time: record.date_time,
        block_number: record.block_number,
        transaction_hash: record.transaction_hash,
        to: record.to,
        price,
        swap_size,
        is_buying: amounts.amount1_out > U256::ZERO,
    })
}

fn thin(points: Vec<TradePoint>) -> Vec<TradePoint> {
    if points.len() > MAX_SERIES_POINTS {
        points.into_iter().step_by(THINNING_STEP).collect()
    } else {
        points
    }
}

/// Build the target/other series from decoded records. Non-Swap records are ignored.
pub fn build_chart(
    records: &[SwapRecord],
    target: Option<Address>,
    pair: Option<&PairInfo>,
) -> TradeChart {
    let decimals = pair
        .map(|p| (p.token0.decimals, p.token1.decimals))
        .unwrap_or((DEFAULT_DECIMALS, DEFAULT_DECIMALS));

    let (target_points, other_points): (Vec<TradePoint>, Vec<TradePoint>) = records
        .iter()
        .filter(|record| record.event == EventKind::Swap)
        .filter_map(|record| trade_point(record, decimals))
        .partition(|point| target.is_some() && point.to == target);

    let (title, y_label) = match pair {
        Some(p) => (
            format!(
                "{} price in {}\nPair: ({:#x})",
                p.token1.symbol, p.token0.symbol, p.pair_contract_address
            ),
            p.token0.symbol.clone(),
        ),
        None => ("token1 price in token0".to_string(), "token0".to_string()),
    };

    TradeChart {
        title,
        y_label,
        target: thin(target_points),
        other: thin(other_points),
    }
}

/// Write the chart as pretty JSON.
pub fn write_chart(chart: &TradeChart, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), chart)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(
        "Wrote {} target and {} other trades to {}",
        chart.target.len(),
        chart.other.len(),
        path.display()
    );
    Ok(())
}
