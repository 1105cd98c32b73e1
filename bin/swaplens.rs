use std::path::Path;

use alloy::primitives::Address;
use anyhow::Context;
use jemallocator::Jemalloc;
use log::{info, warn, LevelFilter};
use simple_logger::SimpleLogger;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use swaplens::{
    analyze,
    config::FetchMode,
    explorer::PagingConfig,
    pair::{address_is_contract, connect, fetch_pair_info},
    pipeline::{log_query, resolve_signatures},
    plot::{build_chart, write_chart},
    ExplorerClient, LogFetcher, Settings,
};

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .context("Failed to initialize logger")?;

    let settings = Settings::new()
        .context("Failed to load config.yaml. Please ensure it exists and is valid")?;
    let analysis = &settings.analysis;

    let cancellation_token = CancellationToken::new();
    let shutdown_token = cancellation_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal (Ctrl+C), cancelling...");
            shutdown_token.cancel();
        }
    });

    let client = ExplorerClient::new(&settings.explorer)?;
    let query = log_query(analysis)?;

    let pair_address: Address = analysis
        .pair_address
        .parse()
        .context("Invalid pair address")?;
    let target = analysis
        .target_address
        .as_deref()
        .map(str::parse::<Address>)
        .transpose()
        .context("Invalid target address")?;

    let signatures = resolve_signatures(&client, &pair_address, analysis.fetch_abi).await?;

    let fetcher = LogFetcher::new(client, PagingConfig::from(&settings.explorer));
    let result = analyze(
        &fetcher,
        &signatures,
        &query,
        analysis.min_transactions,
        &cancellation_token,
    )
    .await?;

    // Pair metadata is optional: without an RPC endpoint the chart uses raw amounts
    let pair = match &settings.rpc {
        Some(rpc) => {
            let provider = connect(&rpc.url)?;
            if let Some(target) = target {
                match address_is_contract(&provider, target).await {
                    Ok(true) => info!("Target {:#x} is a contract", target),
                    Ok(false) => info!("Target {:#x} is an externally owned account", target),
                    Err(e) => warn!("Could not inspect target {:#x}: {:#}", target, e),
                }
            }
            match fetch_pair_info(&provider, pair_address).await {
                Ok(info) => Some(info),
                Err(e) => {
                    warn!("Failed to fetch pair info: {:#}", e);
                    None
                },
            }
        },
        None => None,
    };

    let records = if analysis.min_transactions > 1 {
        &result.active
    } else {
        &result.records
    };
    let chart_pair = match analysis.mode {
        FetchMode::Pair => pair.as_ref(),
        FetchMode::RouterSwaps => None,
    };
    let chart = build_chart(records, target, chart_pair);
    write_chart(&chart, Path::new(&analysis.output_path))?;

    let report = &result.report;
    info!(
        "Done: {} pages, {} logs, {} duplicates, {} records decoded, {} dropped, {} kept",
        report.pages,
        report.fetched,
        report.duplicates,
        report.decode.decoded,
        report.decode.dropped(),
        report.active
    );

    Ok(())
}
