// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for key-aware dispatch pacing
//!
//! These tests run on a paused tokio clock, so spacing is checked exactly and
//! without real delays.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alphascan::{ApiKeyPool, Credential, KeyedRateLimiter};
use futures::future::join_all;
use proptest::prelude::*;
use tokio::time::Instant;

/// Test that calls submitted at once start at least `min_interval` apart
#[tokio::test(start_paused = true)]
async fn test_simultaneous_calls_are_spaced() {
    // Four keys: max(100ms, 1s / 4) = 250ms
    let limiter = Arc::new(KeyedRateLimiter::fixed(Duration::from_millis(100), 4));
    let min_interval = limiter.min_interval();

    let mut starts = join_all((0..6).map(|_| {
        let limiter = limiter.clone();
        async move { limiter.execute(|| async { Instant::now() }).await }
    }))
    .await;
    starts.sort();

    for pair in starts.windows(2) {
        assert!(
            pair[1] - pair[0] >= min_interval,
            "dispatches {:?} apart, expected at least {:?}",
            pair[1] - pair[0],
            min_interval
        );
    }
    assert!(starts[5] - starts[0] >= min_interval * 5);
}

/// Test that slow responses do not hold back later dispatches
#[tokio::test(start_paused = true)]
async fn test_in_flight_calls_are_not_bounded() {
    let limiter = Arc::new(KeyedRateLimiter::fixed(Duration::ZERO, 4));
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    join_all((0..6).map(|_| {
        let limiter = limiter.clone();
        let in_flight = in_flight.clone();
        let peak = peak.clone();
        async move {
            limiter
                .execute(|| async {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    // Each response takes four dispatch intervals
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                })
                .await
        }
    }))
    .await;

    assert!(peak.load(Ordering::SeqCst) >= 4);
    assert_eq!(in_flight.load(Ordering::SeqCst), 0);
}

/// Test that spacing follows the pool's active key count
#[test]
fn test_spacing_follows_active_keys() {
    let pool = ApiKeyPool::new(vec![
        Credential::new("KEY-000000000001", "one"),
        Credential::new("KEY-000000000002", "two").with_priority(1),
    ]);
    let limiter = KeyedRateLimiter::new(Duration::from_millis(100), pool.subscribe_active_count());
    assert_eq!(limiter.min_interval(), Duration::from_millis(500));

    pool.toggle("KEY-000000000002").unwrap();
    assert_eq!(limiter.min_interval(), Duration::from_secs(1));

    pool.add("KEY-000000000003", "three").unwrap();
    pool.add("KEY-000000000004", "four").unwrap();
    pool.add("KEY-000000000005", "five").unwrap();
    assert_eq!(limiter.min_interval(), Duration::from_millis(250));
}

proptest! {
    /// Property: the interval is the larger of the base interval and the per-key share
    #[test]
    fn prop_min_interval_is_max_of_base_and_key_share(
        base_ms in 0u64..=2_000,
        keys in 1usize..=64,
    ) {
        let base = Duration::from_millis(base_ms);
        let limiter = KeyedRateLimiter::fixed(base, keys);

        let interval = limiter.min_interval();
        prop_assert!(interval >= base);
        prop_assert!(interval >= Duration::from_secs(1) / keys as u32);
        prop_assert!(interval == base || interval == Duration::from_secs(1) / keys as u32);
    }

    /// Property: more keys never slow dispatch down
    #[test]
    fn prop_more_keys_never_increase_interval(
        base_ms in 0u64..=2_000,
        keys in 1usize..=63,
    ) {
        let base = Duration::from_millis(base_ms);
        let fewer = KeyedRateLimiter::fixed(base, keys).min_interval();
        let more = KeyedRateLimiter::fixed(base, keys + 1).min_interval();
        prop_assert!(more <= fewer);
    }
}
