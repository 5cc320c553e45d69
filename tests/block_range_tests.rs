// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for trading-day block ranges

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use alloy_chains::NamedChain;
use alphascan::transport::HttpResponse;
use alphascan::{
    ApiError, BlockRangeError, BlockRangeResolver, ExplorerApi, ManualClock, NoOpCache,
    RetryPolicy, TradingDayBoundary, UpstreamClient, ValidationError,
};
use helpers::*;
use url::Url;

const BSC: NamedChain = NamedChain::BinanceSmartChain;

fn resolver(source: Arc<MockDataSource>, clock: Arc<ManualClock>) -> BlockRangeResolver {
    BlockRangeResolver::new(source, TradingDayBoundary::UTC_MIDNIGHT).with_clock(clock)
}

#[tokio::test]
async fn test_completed_day_uses_timestamp_lookups() {
    let source = Arc::new(MockDataSource::new());
    let clock = Arc::new(ManualClock::new(at(2025, 6, 2, 1)));

    let range = resolver(source.clone(), clock)
        .resolve(date(2025, 6, 1), BSC)
        .await
        .unwrap();

    assert!(range.is_completed);
    assert_eq!(range.start_timestamp, 1_748_736_000);
    assert_eq!(range.end_timestamp, 1_748_822_399);
    // After(1_748_736_000) and Before(1_748_822_399) on a 3s chain
    assert_eq!(range.start_block, 582_912_000);
    assert_eq!(range.end_block, 582_940_799);
    assert_eq!(range.block_count(), 28_800);
    assert_eq!(source.block_lookups(), 2);
}

#[tokio::test]
async fn test_day_in_progress_ends_before_latest_block() {
    let source = Arc::new(MockDataSource::new().with_latest_block(582_926_400));
    let now = at(2025, 6, 1, 12);
    let clock = Arc::new(ManualClock::new(now));

    let range = resolver(source.clone(), clock)
        .resolve(date(2025, 6, 1), BSC)
        .await
        .unwrap();

    assert!(!range.is_completed);
    assert_eq!(range.end_block, 582_926_399);
    assert_eq!(range.end_timestamp, now.timestamp());
    // Only the start is looked up by timestamp
    assert_eq!(source.block_lookups(), 1);
}

#[tokio::test]
async fn test_completed_ranges_are_cached() {
    let source = Arc::new(MockDataSource::new());
    let clock = Arc::new(ManualClock::new(at(2025, 6, 10, 0)));
    let resolver = resolver(source.clone(), clock);

    let first = resolver.resolve(date(2025, 6, 1), BSC).await.unwrap();
    let second = resolver.resolve(date(2025, 6, 1), BSC).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(source.block_lookups(), 2);

    let stats = resolver.cache_stats().await;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn test_ranges_in_progress_are_not_cached() {
    let source = Arc::new(MockDataSource::new().with_latest_block(582_926_400));
    let clock = Arc::new(ManualClock::new(at(2025, 6, 1, 12)));
    let resolver = resolver(source.clone(), clock.clone());

    let partial = resolver.resolve(date(2025, 6, 1), BSC).await.unwrap();
    assert!(!partial.is_completed);

    clock.set(at(2025, 6, 2, 0));
    let complete = resolver.resolve(date(2025, 6, 1), BSC).await.unwrap();
    assert!(complete.is_completed);
    assert_eq!(complete.end_block, 582_940_799);
}

#[tokio::test]
async fn test_without_cache_always_looks_up() {
    let source = Arc::new(MockDataSource::new());
    let clock = Arc::new(ManualClock::new(at(2025, 6, 10, 0)));
    let resolver = BlockRangeResolver::new(source.clone(), TradingDayBoundary::UTC_MIDNIGHT)
        .with_clock(clock)
        .with_cache(Box::new(NoOpCache));

    resolver.resolve(date(2025, 6, 1), BSC).await.unwrap();
    resolver.resolve(date(2025, 6, 1), BSC).await.unwrap();
    assert_eq!(source.block_lookups(), 4);
}

#[tokio::test]
async fn test_future_date_fails_without_network_calls() {
    let source = Arc::new(MockDataSource::new());
    let clock = Arc::new(ManualClock::new(at(2025, 6, 1, 12)));

    let result = resolver(source.clone(), clock)
        .resolve(date(2025, 6, 2), BSC)
        .await;

    assert!(matches!(
        result,
        Err(BlockRangeError::Validation(ValidationError::FutureDate { .. }))
    ));
    assert_eq!(source.block_lookups(), 0);
}

#[tokio::test]
async fn test_offset_boundary_shifts_the_day() {
    let source = Arc::new(MockDataSource::new());
    let clock = Arc::new(ManualClock::new(at(2025, 6, 10, 0)));
    // Trading day starts at 08:00 in UTC+8, i.e. midnight UTC of the same date
    let boundary = TradingDayBoundary {
        utc_offset_minutes: 480,
        start_hour: 8,
    };

    let range = BlockRangeResolver::new(source, boundary)
        .with_clock(clock)
        .resolve(date(2025, 6, 1), BSC)
        .await
        .unwrap();

    assert_eq!(range.start_timestamp, 1_748_736_000);
    assert_eq!(range.end_timestamp - range.start_timestamp, 86_399);
}

fn bad_gateway() -> HttpResponse {
    HttpResponse {
        status: 502,
        body: "Bad Gateway".to_string(),
    }
}

/// An explorer whose client retries with the default policy, sharing `clock`.
fn explorer_source(transport: &MockTransport, clock: Arc<ManualClock>) -> Arc<ExplorerApi<MockTransport>> {
    let client = UpstreamClient::new(transport.clone(), pool_for(&bsc_network()), RetryPolicy::default())
        .with_clock(clock);
    Arc::new(ExplorerApi::new(
        client,
        Url::parse("https://api.example/v2/api").unwrap(),
        56,
    ))
}

#[tokio::test]
async fn test_failing_lookup_is_attempted_three_times_with_linear_backoff() {
    let transport = MockTransport::new();
    for _ in 0..9 {
        transport.respond_with("getblocknobytime", bad_gateway());
    }
    let clock = Arc::new(ManualClock::new(at(2025, 6, 2, 1)));
    let resolver = BlockRangeResolver::new(
        explorer_source(&transport, clock.clone()),
        TradingDayBoundary::UTC_MIDNIGHT,
    )
    .with_clock(clock.clone());

    let result = resolver.resolve(date(2025, 6, 1), BSC).await;

    assert!(matches!(
        result,
        Err(BlockRangeError::Api(ApiError::Http { status: 502, .. }))
    ));
    assert_eq!(transport.requests().len(), 3);
    assert_eq!(
        clock.sleeps(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
}

#[tokio::test]
async fn test_lookup_recovers_on_a_later_attempt() {
    let transport = MockTransport::new();
    transport
        .respond_with("getblocknobytime", bad_gateway())
        .respond(
            "getblocknobytime",
            r#"{"status":"1","message":"OK","result":"582912000"}"#,
        )
        .respond(
            "getblocknobytime",
            r#"{"status":"1","message":"OK","result":"582940799"}"#,
        );
    let clock = Arc::new(ManualClock::new(at(2025, 6, 2, 1)));
    let resolver = BlockRangeResolver::new(
        explorer_source(&transport, clock.clone()),
        TradingDayBoundary::UTC_MIDNIGHT,
    )
    .with_clock(clock.clone());

    let range = resolver.resolve(date(2025, 6, 1), BSC).await.unwrap();

    assert_eq!(range.start_block, 582_912_000);
    assert_eq!(range.end_block, 582_940_799);
    assert_eq!(transport.requests().len(), 3);
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(1)]);
}
