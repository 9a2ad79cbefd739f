//! Admission flow against the SQLite store
//!
//! Same scenarios the core tests run against the in-memory mock, here with
//! real SQL ordering and the transactional move.

mod common;

use std::sync::Arc;
use waitroom_core::domain::{DomainError, Rank};
use waitroom_core::error::AppError;
use waitroom_core::port::time_provider::mocks::ManualTimeProvider;
use waitroom_core::port::time_provider::SystemTimeProvider;
use waitroom_core::port::OrderedSetStore;

const START_MILLIS: i64 = 1_700_000_000_000;

/// Register three, promote three, check status and rank
#[tokio::test]
async fn test_register_promote_and_check() {
    let store = common::memory_store().await;
    let queue = common::admission(store, Arc::new(SystemTimeProvider));

    assert_eq!(queue.register("default", "1").await.unwrap(), Rank::from_zero_based(Some(0)));
    assert_eq!(queue.register("default", "2").await.unwrap(), Rank::from_zero_based(Some(1)));
    assert_eq!(queue.register("default", "3").await.unwrap(), Rank::from_zero_based(Some(2)));

    assert_eq!(queue.promote("default", 3).await.unwrap(), 3);

    assert!(queue.is_allowed("default", "1").await.unwrap());
    assert_eq!(queue.rank("default", "1").await.unwrap(), Rank::ABSENT);
}

/// Promoting more than are waiting moves only what is there
#[tokio::test]
async fn test_promote_more_than_waiting() {
    let store = common::memory_store().await;
    let queue = common::admission(store, Arc::new(SystemTimeProvider));

    for id in ["1", "2", "3"] {
        queue.register("default", id).await.unwrap();
    }

    assert_eq!(queue.promote("default", 5).await.unwrap(), 3);
    assert_eq!(queue.promote("default", 5).await.unwrap(), 0);
}

/// Nobody registered in the queue: not allowed, no rank
#[tokio::test]
async fn test_unknown_participant() {
    let store = common::memory_store().await;
    let queue = common::admission(store, Arc::new(SystemTimeProvider));

    assert!(!queue.is_allowed("default", "2").await.unwrap());
    assert_eq!(queue.rank("default", "2").await.unwrap(), Rank::ABSENT);
}

/// Second registration of a waiting participant fails and leaves the rank alone
#[tokio::test]
async fn test_duplicate_registration() {
    let store = common::memory_store().await;
    let queue = common::admission(store, Arc::new(SystemTimeProvider));

    queue.register("default", "1").await.unwrap();
    queue.register("default", "2").await.unwrap();

    let err = queue.register("default", "2").await.unwrap_err();
    assert!(err.is_already_registered());
    assert!(matches!(
        err,
        AppError::Domain(DomainError::AlreadyRegistered { ref queue, ref participant })
            if queue == "default" && participant == "2"
    ));

    assert_eq!(queue.rank("default", "2").await.unwrap(), Rank::from_zero_based(Some(1)));
}

/// Promotion follows registration order when timestamps differ
#[tokio::test]
async fn test_promotion_is_fifo() {
    let store = common::memory_store().await;
    let clock = Arc::new(ManualTimeProvider::with_step(START_MILLIS, 1000));
    let queue = common::admission(store.clone(), clock);

    // Reverse lexical order so member tie-breaking cannot fake FIFO
    let ids = ["u9", "u8", "u7", "u6", "u5"];
    for id in ids {
        queue.register("fifo", id).await.unwrap();
    }

    assert_eq!(queue.promote("fifo", 2).await.unwrap(), 2);

    assert!(queue.is_allowed("fifo", "u9").await.unwrap());
    assert!(queue.is_allowed("fifo", "u8").await.unwrap());
    assert!(!queue.is_allowed("fifo", "u7").await.unwrap());
    assert_eq!(queue.rank("fifo", "u7").await.unwrap(), Rank::from_zero_based(Some(0)));
    assert_eq!(queue.rank("fifo", "u5").await.unwrap(), Rank::from_zero_based(Some(2)));

    let keyspace = queue.keyspace();
    assert_eq!(store.rank(&keyspace.wait("fifo"), "u9").await.unwrap(), None);
    assert!(store
        .rank(&keyspace.proceed("fifo"), "u9")
        .await
        .unwrap()
        .is_some());
}

/// Same second: the member string breaks the tie
#[tokio::test]
async fn test_same_second_ties_break_by_member() {
    let store = common::memory_store().await;
    let clock = Arc::new(ManualTimeProvider::new(START_MILLIS));
    let queue = common::admission(store, clock);

    queue.register("ties", "b").await.unwrap();
    queue.register("ties", "a").await.unwrap();

    assert_eq!(queue.rank("ties", "a").await.unwrap(), Rank::from_zero_based(Some(0)));
    assert_eq!(queue.rank("ties", "b").await.unwrap(), Rank::from_zero_based(Some(1)));
}

/// Queues are independent of each other
#[tokio::test]
async fn test_queue_isolation() {
    let store = common::memory_store().await;
    let queue = common::admission(store, Arc::new(SystemTimeProvider));

    queue.register("alpha", "1").await.unwrap();
    queue.register("beta", "1").await.unwrap();

    assert_eq!(queue.promote("alpha", 10).await.unwrap(), 1);

    assert!(queue.is_allowed("alpha", "1").await.unwrap());
    assert!(!queue.is_allowed("beta", "1").await.unwrap());
    assert_eq!(queue.rank("beta", "1").await.unwrap(), Rank::from_zero_based(Some(0)));
}

/// An admitted participant can join the wait set again
#[tokio::test]
async fn test_reregistration_after_promotion() {
    let store = common::memory_store().await;
    let queue = common::admission(store, Arc::new(SystemTimeProvider));

    queue.register("default", "1").await.unwrap();
    queue.promote("default", 1).await.unwrap();

    assert_eq!(queue.register("default", "1").await.unwrap(), Rank::from_zero_based(Some(0)));
    assert!(queue.is_allowed("default", "1").await.unwrap());
}

/// Zero count is a no-op
#[tokio::test]
async fn test_promote_zero() {
    let store = common::memory_store().await;
    let queue = common::admission(store, Arc::new(SystemTimeProvider));

    queue.register("default", "1").await.unwrap();
    assert_eq!(queue.promote("default", 0).await.unwrap(), 0);
    assert_eq!(queue.rank("default", "1").await.unwrap(), Rank::from_zero_based(Some(0)));
}
