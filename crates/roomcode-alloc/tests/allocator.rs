//! Integration tests for the allocator under real concurrency.
//!
//! These run on the multi-threaded runtime so allocate / confirm /
//! release calls genuinely race each other and the timeout reclaimers.
//! Timing-sensitive properties use short real timeouts rather than the
//! paused clock, because the paused clock only exists on the
//! current-thread runtime. Assertions never depend on who wins a race;
//! they poll until every pending allocation has been reclaimed.

use std::collections::HashSet;
use std::time::Duration;

use futures_util::future::join_all;
use roomcode_alloc::{AllocError, Allocator, AllocatorConfig, AllocatorStats, ReleaseOutcome};
use roomcode_protocol::Code;

// =========================================================================
// Helpers
// =========================================================================

fn allocator(pool_size: u16, reclaim_after: Duration) -> Allocator {
    Allocator::new(AllocatorConfig {
        pool_size,
        reclaim_after,
    })
}

/// A timeout long enough that no reclaimer fires during the test.
const NEVER: Duration = Duration::from_secs(3600);

/// Upper bound on how long reclaimers may take to drain on a loaded machine.
const DRAIN_LIMIT: Duration = Duration::from_secs(10);

/// Polls until no allocation is pending, then returns the final stats.
async fn wait_for_reclaimers(alloc: &Allocator) -> AllocatorStats {
    tokio::time::timeout(DRAIN_LIMIT, async {
        loop {
            let stats = alloc.stats().await;
            if stats.pending == 0 {
                return stats;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("pending allocations were never reclaimed")
}

// =========================================================================
// No double allocation
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_allocate_full_pool_yields_distinct_codes() {
    const N: u16 = 1_000;
    let alloc = allocator(N, NEVER);

    let tasks = (0..N).map(|_| {
        let alloc = alloc.clone();
        tokio::spawn(async move { alloc.allocate().await })
    });
    let results = join_all(tasks).await;

    let codes: Vec<Code> = results
        .into_iter()
        .map(|r| r.expect("task panicked").expect("pool sized for all callers"))
        .collect();
    let distinct: HashSet<Code> = codes.iter().copied().collect();

    assert_eq!(distinct.len(), usize::from(N), "some code was handed out twice");
    assert_eq!(alloc.stats().await.free, 0);
    alloc.verify_partition().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_allocate_oversubscribed_exhausts_cleanly() {
    const N: u16 = 100;
    let alloc = allocator(N, NEVER);

    let tasks = (0..N * 2).map(|_| {
        let alloc = alloc.clone();
        tokio::spawn(async move { alloc.allocate().await })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.expect("task panicked"))
        .collect();

    let ok: HashSet<Code> = results.iter().filter_map(|r| r.as_ref().ok()).copied().collect();
    let exhausted = results
        .iter()
        .filter(|r| matches!(r, Err(AllocError::PoolExhausted)))
        .count();

    assert_eq!(ok.len(), usize::from(N));
    assert_eq!(exhausted, usize::from(N));
    alloc.verify_partition().await.unwrap();
}

// =========================================================================
// Idempotent release
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_release_same_code_returns_it_once() {
    let alloc = allocator(10, NEVER);
    let code = alloc.allocate().await.unwrap();

    let tasks = (0..32).map(|_| {
        let alloc = alloc.clone();
        tokio::spawn(async move { alloc.release(code).await })
    });
    let outcomes: Vec<ReleaseOutcome> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.expect("task panicked"))
        .collect();

    let released = outcomes
        .iter()
        .filter(|o| **o == ReleaseOutcome::Released)
        .count();
    assert_eq!(released, 1, "exactly one release should win");
    assert_eq!(alloc.stats().await.free, 10);
    alloc.verify_partition().await.unwrap();
}

// =========================================================================
// Release racing the timeout reclaimer
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_release_racing_timeout_returns_each_code_once() {
    const N: u16 = 200;
    let reclaim_after = Duration::from_millis(20);
    let alloc = allocator(N, reclaim_after);

    let mut codes = Vec::new();
    for _ in 0..N {
        codes.push(alloc.allocate().await.unwrap());
    }

    // Release right around the deadline so some releases win and some
    // find the code already reclaimed.
    tokio::time::sleep(reclaim_after).await;
    let tasks = codes.into_iter().map(|code| {
        let alloc = alloc.clone();
        tokio::spawn(async move { alloc.release(code).await })
    });
    join_all(tasks).await;

    let stats = wait_for_reclaimers(&alloc).await;
    assert_eq!(stats.free, usize::from(N));
    assert_eq!(stats.pending + stats.confirmed, 0);
    alloc.verify_partition().await.unwrap();
}

// =========================================================================
// Confirm racing the timeout reclaimer
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_confirm_racing_timeout_is_all_or_nothing() {
    // For each code, either confirm won (record stays, confirmed) or the
    // reclaimer won (confirm saw UnknownCode, code is free). Never both.
    const N: u16 = 200;
    let reclaim_after = Duration::from_millis(20);
    let alloc = allocator(N, reclaim_after);

    let mut codes = Vec::new();
    for _ in 0..N {
        codes.push(alloc.allocate().await.unwrap());
    }

    tokio::time::sleep(reclaim_after).await;
    let tasks = codes.into_iter().map(|code| {
        let alloc = alloc.clone();
        tokio::spawn(async move { (code, alloc.confirm(code).await) })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.expect("task panicked"))
        .collect();

    wait_for_reclaimers(&alloc).await;

    for (code, result) in results {
        match result {
            Ok(()) => {
                let record = alloc.get(code).await.expect("confirmed code must stay");
                assert!(record.confirmed);
                assert!(!alloc.is_free(code).await);
            }
            Err(AllocError::UnknownCode(c)) => {
                assert_eq!(c, code);
                assert!(alloc.is_free(code).await);
            }
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    alloc.verify_partition().await.unwrap();
}

// =========================================================================
// Mixed stress
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_mixed_workload_preserves_partition() {
    let alloc = allocator(64, Duration::from_millis(5));

    let workers = (0..16).map(|worker| {
        let alloc = alloc.clone();
        tokio::spawn(async move {
            for i in 0..200u32 {
                let Ok(code) = alloc.allocate().await else {
                    tokio::task::yield_now().await;
                    continue;
                };
                match (worker + i) % 4 {
                    0 => {
                        alloc.release(code).await;
                    }
                    1 => {
                        let _ = alloc.confirm(code).await;
                        alloc.release(code).await;
                    }
                    2 => {
                        let _ = alloc.confirm(code).await;
                        alloc.release(code).await;
                        alloc.release(code).await;
                    }
                    // Abandon it and let the reclaimer take it back.
                    _ => {}
                }
            }
        })
    });
    for result in join_all(workers).await {
        result.expect("worker panicked");
    }

    alloc.verify_partition().await.unwrap();

    // Every abandoned code comes back once its timeout passes.
    let stats = wait_for_reclaimers(&alloc).await;
    assert_eq!(stats.free, 64);
    alloc.verify_partition().await.unwrap();
}
