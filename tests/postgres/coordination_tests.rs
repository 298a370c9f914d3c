//! Coordination store behaviour against a real `PostgreSQL` table.

use super::helpers::{ManualClock, TestDatabase, shared_test_cluster, test_runtime};
use crate::test_helpers::hatchery_named;
use hatchery::worker_model::{
    domain::ModelId,
    ports::{CoordinationError, CoordinationStore},
    services::{LeaseError, RegistrationLease, WorkerModelConfig},
};
use pg_embedded_setup_unpriv::TestCluster;
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;

const BOOKING_TTL: Duration = Duration::from_secs(360);

#[rstest]
fn exactly_one_concurrent_conditional_write_wins(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "coord_race").expect("database setup");
    let clock = Arc::new(ManualClock::new());
    let store = Arc::new(db.store(&clock, 8));
    let rt = test_runtime();

    let outcomes: Vec<(String, bool)> = rt.block_on(async {
        let handles: Vec<_> = (0..16)
            .map(|contender| {
                let racer = Arc::clone(&store);
                tokio::spawn(async move {
                    let value = format!("hatchery-{contender}");
                    let won = racer
                        .set_if_absent_with_ttl("book:workermodel:1", &value, BOOKING_TTL)
                        .await
                        .expect("conditional write should succeed");
                    (value, won)
                })
            })
            .collect();
        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await.expect("contender task should finish"));
        }
        results
    });

    let winners: Vec<&String> = outcomes
        .iter()
        .filter(|(_, won)| *won)
        .map(|(value, _)| value)
        .collect();
    assert_eq!(winners.len(), 1, "exactly one writer should win: {outcomes:?}");
    let stored = rt
        .block_on(store.get("book:workermodel:1"))
        .expect("read should succeed");
    assert_eq!(stored.as_ref(), winners.first().copied());
}

#[rstest]
fn expired_entry_is_absent_and_can_be_reacquired(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "coord_expiry").expect("database setup");
    let clock = Arc::new(ManualClock::new());
    let store = db.store(&clock, 1);
    let rt = test_runtime();

    assert!(
        rt.block_on(store.set_if_absent_with_ttl("book:workermodel:7", "alpha", BOOKING_TTL))
            .expect("first write")
    );
    assert!(
        !rt.block_on(store.set_if_absent_with_ttl("book:workermodel:7", "bravo", BOOKING_TTL))
            .expect("second write")
    );

    clock.advance_secs(361);
    assert_eq!(
        rt.block_on(store.get("book:workermodel:7")).expect("read"),
        None
    );
    assert!(
        rt.block_on(store.set_if_absent_with_ttl("book:workermodel:7", "bravo", BOOKING_TTL))
            .expect("write after expiry")
    );
    assert_eq!(
        rt.block_on(store.get("book:workermodel:7"))
            .expect("read")
            .as_deref(),
        Some("bravo")
    );
}

#[rstest]
fn overwrite_and_delete_apply_immediately(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "coord_overwrite").expect("database setup");
    let clock = Arc::new(ManualClock::new());
    let store = db.store(&clock, 1);
    let rt = test_runtime();

    rt.block_on(store.set_with_ttl("api:workermodels:group:10", "[]", Duration::from_secs(30)))
        .expect("first write");
    rt.block_on(store.set_with_ttl("api:workermodels:group:10", "[1]", Duration::from_secs(30)))
        .expect("overwrite");
    assert_eq!(
        rt.block_on(store.get("api:workermodels:group:10"))
            .expect("read")
            .as_deref(),
        Some("[1]")
    );

    rt.block_on(store.delete("api:workermodels:group:10"))
        .expect("delete");
    rt.block_on(store.delete("api:workermodels:group:10"))
        .expect("deleting a missing key is fine");
    assert_eq!(
        rt.block_on(store.get("api:workermodels:group:10")).expect("read"),
        None
    );
}

#[rstest]
fn concurrent_increments_hand_out_distinct_values(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "coord_counter").expect("database setup");
    let clock = Arc::new(ManualClock::new());
    let store = Arc::new(db.store(&clock, 8));
    let rt = test_runtime();

    let mut values: Vec<u64> = rt.block_on(async {
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let counter = Arc::clone(&store);
                tokio::spawn(async move {
                    counter
                        .increment("workermodel:recheck:epoch")
                        .await
                        .expect("increment should succeed")
                })
            })
            .collect();
        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await.expect("increment task should finish"));
        }
        results
    });
    values.sort_unstable();

    assert_eq!(values, (1..=10).collect::<Vec<u64>>());
    assert_eq!(
        rt.block_on(store.get("workermodel:recheck:epoch"))
            .expect("read")
            .as_deref(),
        Some("10")
    );
}

#[rstest]
fn incrementing_a_non_numeric_value_is_rejected(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "coord_not_counter").expect("database setup");
    let clock = Arc::new(ManualClock::new());
    let store = db.store(&clock, 1);
    let rt = test_runtime();

    rt.block_on(store.set_with_ttl("book:workermodel:3", "hatchery-a", BOOKING_TTL))
        .expect("write");
    let result = rt.block_on(store.increment("book:workermodel:3"));

    assert!(matches!(
        result,
        Err(CoordinationError::NotACounter(key)) if key == "book:workermodel:3"
    ));
}

#[rstest]
fn competing_hatcheries_book_a_model_once(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "coord_booking").expect("database setup");
    let clock = Arc::new(ManualClock::new());
    let store = Arc::new(db.store(&clock, 4));
    let lease = RegistrationLease::new(Arc::clone(&store), &WorkerModelConfig::default());
    let alpha = hatchery_named("hatchery-a");
    let bravo = hatchery_named("hatchery-b");
    let model = ModelId::new(42);
    let rt = test_runtime();

    rt.block_on(lease.acquire(model, &alpha))
        .expect("first hatchery books the model");
    match rt.block_on(lease.acquire(model, &bravo)) {
        Err(LeaseError::AlreadyBooked { holder, .. }) => assert_eq!(holder, Some(alpha)),
        other => panic!("expected AlreadyBooked, got {other:?}"),
    }

    rt.block_on(lease.release(model)).expect("release");
    rt.block_on(lease.acquire(model, &bravo))
        .expect("released booking can be taken");
}
