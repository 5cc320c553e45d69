//! Wiring for the `alphascan` binary.
//!
//! Environment:
//!
//! - `NETWORK_CONFIG`: path to a network configuration document (required)
//! - `WALLETS`: comma-separated wallet addresses (required)
//! - `DAY`: trading day as `YYYY-MM-DD` (defaults to the current trading day)
//! - `PAGE_SIZE`: transfer page size (defaults to the explorer maximum)
//! - `LOG_FORMAT`: `json` for JSON log lines

use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use dotenvy::dotenv;
use tracing::info;

use crate::{
    parse_query_date, AlphascanConfig, AlphascanConfigBuilder, ApiFlavor, ApiKeyPool,
    ChainDataSource, ExplorerApi, IndexerApi, NetworkConfig, RevenueOrchestrator,
    UpstreamClient,
};

/// Installs the log subscriber; `RUST_LOG` filters, `LOG_FORMAT=json` switches format.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = dotenvy::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Main entry point for the application.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();

    let config_path = dotenvy::var("NETWORK_CONFIG").context("NETWORK_CONFIG must be set")?;
    let document = std::fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read {config_path}"))?;
    let network = NetworkConfig::from_json(&document)?;
    network.validate_credentials()?;

    let wallets = parse_wallet_list(&dotenvy::var("WALLETS").context("WALLETS must be set")?);
    let date = match dotenvy::var("DAY") {
        Ok(day) => parse_query_date(&day)?,
        Err(_) => current_trading_day(&network)?,
    };

    let mut builder = AlphascanConfigBuilder::with_defaults();
    if let Ok(page_size) = dotenvy::var("PAGE_SIZE") {
        builder = builder.page_size(page_size.parse().context("PAGE_SIZE must be a number")?);
    }
    let config = builder.build();

    info!(
        network = %network.name,
        chain = %network.chain,
        api = %network.api.flavor,
        wallets = wallets.len(),
        date = %date,
        "Starting revenue analysis"
    );

    let orchestrator = build_orchestrator(network, &config)?;
    let snapshots = orchestrator.analyze_batch(&wallets, date).await?;
    println!("{}", serde_json::to_string_pretty(&snapshots)?);

    Ok(())
}

/// Builds the production pipeline for `network`: key pool, paced HTTP client and
/// the adapter for the network's API flavor.
pub fn build_orchestrator(
    network: NetworkConfig,
    config: &AlphascanConfig,
) -> anyhow::Result<RevenueOrchestrator> {
    let pool = Arc::new(ApiKeyPool::new(network.credentials.clone()));
    let client = UpstreamClient::http(
        pool.clone(),
        config.http_timeout,
        config.base_interval,
        config.retry,
    )?;

    let base_url = network.api.base_url.clone();
    let source: Arc<dyn ChainDataSource> = match network.api.flavor {
        ApiFlavor::Explorer => Arc::new(ExplorerApi::new(client, base_url, network.chain_id())),
        ApiFlavor::Indexer => {
            let wrapped_native = network
                .token(&format!("W{}", network.native_symbol))
                .map(|token| token.address);
            Arc::new(IndexerApi::new(
                client,
                base_url,
                network.chain_id(),
                wrapped_native,
            ))
        }
    };

    Ok(RevenueOrchestrator::new(network, source, pool, config))
}

fn parse_wallet_list(raw: &str) -> Vec<String> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|wallet| !wallet.is_empty())
        .map(str::to_string)
        .collect()
}

fn current_trading_day(network: &NetworkConfig) -> anyhow::Result<NaiveDate> {
    network
        .boundary
        .trading_date(Utc::now())
        .context("trading-day boundary has an invalid UTC offset")
}
