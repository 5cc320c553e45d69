// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the batch revenue pipeline
//!
//! Drives [`RevenueOrchestrator`] end to end over a scripted chain: block range,
//! transfers, swap reconstruction, price discovery, loss and points.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use alloy_chains::NamedChain;
use alphascan::{
    AlphascanConfig, ApiEndpoint, ApiFlavor, ApiKeyPool, BlockRangeResolver, ConfigError,
    Credential, ManualClock, NetworkConfig, RevenueError, RevenueOrchestrator, ValidationError,
};
use bigdecimal::Zero;
use chrono::NaiveDate;
use helpers::*;
use url::Url;

/// 2025-06-01T00:00:00Z
const DAY_START: i64 = 1_748_736_000;

fn trading_day() -> NaiveDate {
    date(2025, 6, 1)
}

/// An orchestrator whose clock sits on the day after [`trading_day`].
fn orchestrator(network: NetworkConfig, source: Arc<MockDataSource>) -> RevenueOrchestrator {
    let pool = pool_for(&network);
    orchestrator_with_pool(network, source, pool)
}

fn orchestrator_with_pool(
    network: NetworkConfig,
    source: Arc<MockDataSource>,
    pool: Arc<ApiKeyPool>,
) -> RevenueOrchestrator {
    let resolver = BlockRangeResolver::new(source.clone(), network.boundary)
        .with_clock(Arc::new(ManualClock::new(at(2025, 6, 2, 12))));
    RevenueOrchestrator::new(network, source, pool, &AlphascanConfig::minimal())
        .with_resolver(resolver)
}

/// `100 USDT -> 50 TOKEN` at t+100, then `25 TOKEN -> 60 USDT` at t+200.
fn scenario_trades(wallet: alloy_primitives::Address, first_tx: u8) -> Vec<alphascan::RawTransferEvent> {
    let mut transfers = swap_legs(
        first_tx,
        wallet,
        &usdt_token(),
        100,
        &alpha_token(),
        50,
        DAY_START + 100,
    );
    transfers.extend(swap_legs(
        first_tx + 1,
        wallet,
        &alpha_token(),
        25,
        &usdt_token(),
        60,
        DAY_START + 200,
    ));
    transfers
}

#[tokio::test]
async fn test_usdt_token_scenario() {
    let trader = wallet(1);
    let source = Arc::new(MockDataSource::new().with_transfers(scenario_trades(trader, 1)));
    let orchestrator = orchestrator(bsc_network(), source);

    let snapshot = orchestrator
        .analyze_wallet(&trader.to_string(), trading_day())
        .await
        .unwrap();
    let summary = snapshot.summary().expect("wallet should be analyzed");

    assert_eq!(summary.transfer_count, 4);
    assert_eq!(summary.exchanges.len(), 2);
    assert_eq!(summary.exchanges[0].from_symbol, "USDT");
    assert_eq!(summary.exchanges[1].from_symbol, "TOKEN");

    // price(TOKEN) = 2 from tx1; tx2's richer rate is reported, not applied
    assert_eq!(summary.loss.valid_volume, dec("100"));
    assert_eq!(summary.loss.trading_loss, dec("-10"));
    assert_eq!(summary.loss.sold.get("TOKEN"), Some(&dec("25")));
    assert_eq!(summary.loss.bought.get("USDT"), Some(&dec("60")));

    // 2 x 100_000 gas at 1 gwei, BNB at 600
    assert_eq!(summary.loss.gas_native, dec("0.0002"));
    assert_eq!(summary.loss.gas_loss, dec("0.12"));
    assert_eq!(summary.total_loss, dec("-9.88"));
    assert!(summary.unpriced_symbols.is_empty());

    // No promotion window: 100 x 1 -> floor(log2(100)) = 6
    assert_eq!(summary.points.volume_points, 6);
    assert_eq!(summary.points.balance_points, 0);
}

#[tokio::test]
async fn test_holdings_are_valued_and_feed_balance_points() {
    let holder = wallet(1);
    let source = Arc::new(
        MockDataSource::new()
            .with_transfers(scenario_trades(holder, 1))
            .with_native_balance(holder, units(1, 18))
            .with_token_balance(holder, TOKEN, units(10, 18))
            .with_token_balance(holder, USDT, units(5, 18)),
    );
    let orchestrator = orchestrator(bsc_network(), source);

    let snapshot = orchestrator
        .analyze_wallet(&holder.to_string(), trading_day())
        .await
        .unwrap();

    // 1 BNB x 600 + 10 TOKEN x 2 + 5 USDT
    assert_eq!(snapshot.tokens_value, dec("625"));
    let points = snapshot.summary().unwrap().points;
    assert_eq!(points.balance_points, 1);
    assert_eq!(points.total, points.balance_points + points.volume_points);
}

#[tokio::test]
async fn test_promotion_window_multiplies_volume() {
    let trader = wallet(1);
    let promoted = alpha_token().with_promotion(date(2025, 5, 20), 30);
    let mut network = bsc_network();
    network.tokens = vec![usdt_token(), promoted];

    let source = Arc::new(MockDataSource::new().with_transfers(scenario_trades(trader, 1)));
    let snapshot = orchestrator(network, source)
        .analyze_wallet(&trader.to_string(), trading_day())
        .await
        .unwrap();

    // Primary network inside the window: 100 x 4 = 400 -> 8
    assert_eq!(snapshot.summary().unwrap().points.volume_points, 8);
}

#[tokio::test]
async fn test_upstream_price_seed_wins_over_swaps() {
    let trader = wallet(1);
    let source = Arc::new(
        MockDataSource::new()
            .with_transfers(scenario_trades(trader, 1))
            .with_token_price(TOKEN, dec("3")),
    );
    let snapshot = orchestrator(bsc_network(), source)
        .analyze_wallet(&trader.to_string(), trading_day())
        .await
        .unwrap();

    // sold 100 + 25 x 3, bought 50 x 3 + 60
    assert_eq!(snapshot.summary().unwrap().loss.trading_loss, dec("-35"));
}

#[tokio::test]
async fn test_batch_with_one_failing_wallet() {
    let wallets: Vec<_> = (1..=5).map(wallet).collect();
    let mut source = MockDataSource::new().failing_for(wallets[2]);
    for (i, w) in wallets.iter().enumerate() {
        source = source.with_transfers(scenario_trades(*w, 10 * (i as u8 + 1)));
    }
    let orchestrator = orchestrator(bsc_network(), Arc::new(source));

    let inputs: Vec<String> = wallets.iter().map(ToString::to_string).collect();
    let snapshots = orchestrator
        .analyze_batch(&inputs, trading_day())
        .await
        .unwrap();

    assert_eq!(snapshots.len(), 5);
    for (i, snapshot) in snapshots.iter().enumerate() {
        assert_eq!(snapshot.wallet_address, inputs[i]);
        assert_eq!(snapshot.query_date, trading_day());
        if i == 2 {
            let error = snapshot.error().expect("wallet #3 should fail");
            assert!(!error.is_empty());
            assert!(snapshot.summary().is_none());
            assert!(snapshot.tokens_value.is_zero());
        } else {
            let summary = snapshot.summary().expect("other wallets should succeed");
            assert_eq!(summary.exchanges.len(), 2);
            assert_eq!(summary.loss.trading_loss, dec("-10"));
        }
    }
}

#[tokio::test]
async fn test_shared_stage_failure_is_recorded_on_every_wallet() {
    let source = Arc::new(MockDataSource::new().with_native_price(None));
    let orchestrator = orchestrator(bsc_network(), source);
    let inputs = vec![wallet(1).to_string(), wallet(2).to_string()];

    let snapshots = orchestrator
        .analyze_batch(&inputs, trading_day())
        .await
        .unwrap();

    assert_eq!(snapshots.len(), 2);
    for snapshot in &snapshots {
        let error = snapshot.error().unwrap();
        assert!(error.contains("Shared batch stage failed"), "{error}");
        assert!(error.contains("BNB"), "{error}");
    }
}

#[tokio::test]
async fn test_future_date_is_rejected_before_any_lookup() {
    let source = Arc::new(MockDataSource::new());
    let orchestrator = orchestrator(bsc_network(), source.clone());

    let result = orchestrator
        .analyze_batch(&[wallet(1).to_string()], date(2025, 6, 3))
        .await;

    assert!(matches!(
        result,
        Err(RevenueError::Validation(ValidationError::FutureDate { .. }))
    ));
    assert_eq!(source.block_lookups(), 0);
}

#[tokio::test]
async fn test_malformed_wallet_only_fails_itself() {
    let trader = wallet(1);
    let source = Arc::new(MockDataSource::new().with_transfers(scenario_trades(trader, 1)));
    let orchestrator = orchestrator(bsc_network(), source);

    let inputs = vec!["not-a-wallet".to_string(), trader.to_string()];
    let snapshots = orchestrator
        .analyze_batch(&inputs, trading_day())
        .await
        .unwrap();

    assert!(snapshots[0].error().unwrap().contains("Invalid wallet address"));
    assert!(snapshots[1].summary().is_some());

    let single = orchestrator.analyze_wallet("0x1234", trading_day()).await;
    assert!(matches!(
        single,
        Err(RevenueError::Validation(ValidationError::InvalidWalletAddress { .. }))
    ));
}

#[tokio::test]
async fn test_incomplete_network_aborts_the_batch() {
    let network = NetworkConfig::new(
        "bsc",
        NamedChain::BinanceSmartChain,
        "BNB",
        ApiEndpoint {
            flavor: ApiFlavor::Explorer,
            base_url: Url::parse("https://api.example/v2/api").unwrap(),
        },
    )
    .with_token(usdt_token())
    .with_credential(Credential::new("KEY-000000000001", "primary"));

    let result = orchestrator(network, Arc::new(MockDataSource::new()))
        .analyze_batch(&[wallet(1).to_string()], trading_day())
        .await;

    assert!(matches!(
        result,
        Err(RevenueError::Config(ConfigError::NoTradingPairs { .. }))
    ));
}

#[tokio::test]
async fn test_live_pool_decides_whether_a_batch_can_run() {
    let trader = wallet(1);
    let source = Arc::new(MockDataSource::new().with_transfers(scenario_trades(trader, 1)));

    // Keys added at runtime live only in the pool
    let pool = pool_for(&bsc_network());
    let mut network = bsc_network();
    network.credentials.clear();
    let snapshots = orchestrator_with_pool(network, source.clone(), pool)
        .analyze_batch(&[trader.to_string()], trading_day())
        .await
        .unwrap();
    assert!(snapshots[0].summary().is_some());

    // Configured keys that were all removed from the pool
    let empty = Arc::new(ApiKeyPool::new(Vec::new()));
    let result = orchestrator_with_pool(bsc_network(), source, empty)
        .analyze_batch(&[trader.to_string()], trading_day())
        .await;
    assert!(matches!(
        result,
        Err(RevenueError::Config(ConfigError::NoActiveCredentials { ref network })) if network == "bsc"
    ));
}

#[tokio::test(start_paused = true)]
async fn test_batch_runs_in_waves_of_healthy_keys() {
    let wallets: Vec<_> = (1..=5).map(wallet).collect();
    let mut source = MockDataSource::new().with_listing_delay(Duration::from_secs(1));
    for (i, w) in wallets.iter().enumerate() {
        source = source.with_transfers(scenario_trades(*w, 10 * (i as u8 + 1)));
    }
    let source = Arc::new(source);
    let orchestrator = orchestrator(bsc_network(), source.clone());

    let inputs: Vec<String> = wallets.iter().map(ToString::to_string).collect();
    let snapshots = orchestrator
        .analyze_batch(&inputs, trading_day())
        .await
        .unwrap();

    // Two healthy keys, two wallets at a time
    assert_eq!(source.peak_listings_in_flight(), 2);

    let started: Vec<_> = wallets
        .iter()
        .map(|w| source.first_listing_at(*w).expect("wallet was never fetched"))
        .collect();
    assert_eq!(started[0], started[1]);
    assert_eq!(started[2], started[3]);
    assert!(started[2] > started[1]);
    assert!(started[4] > started[3]);

    // Each wallet lists two tokens, one second apiece
    assert_eq!(started[2] - started[0], Duration::from_secs(2));
    assert_eq!(started[4] - started[2], Duration::from_secs(2));

    let reported: Vec<_> = snapshots.iter().map(|s| s.wallet_address.clone()).collect();
    assert_eq!(reported, inputs);
    assert!(snapshots.iter().all(|s| s.summary().is_some()));
}

#[tokio::test]
async fn test_empty_batch_and_concurrency() {
    let orchestrator = orchestrator(bsc_network(), Arc::new(MockDataSource::new()));

    let snapshots = orchestrator.analyze_batch(&[], trading_day()).await.unwrap();
    assert!(snapshots.is_empty());

    // Two healthy keys
    assert_eq!(orchestrator.concurrency(5), 2);
    assert_eq!(orchestrator.concurrency(1), 1);
    assert_eq!(orchestrator.concurrency(0), 1);
}

#[tokio::test]
async fn test_snapshot_json_shape() {
    let trader = wallet(1);
    let source = Arc::new(MockDataSource::new().with_transfers(scenario_trades(trader, 1)));
    let snapshot = orchestrator(bsc_network(), source)
        .analyze_wallet(&trader.to_string(), trading_day())
        .await
        .unwrap();

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["query_date"], "2025-06-01");
    assert!(json.get("error").is_none());
    assert!(json["summary"]["trading_loss"].is_string());
    assert_eq!(json["summary"]["points"]["volume_points"], 6);
}
