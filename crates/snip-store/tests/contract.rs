//! Behaviour every backend must share.
//!
//! Memory and filesystem backends always run. Redis and PostgreSQL run when
//! `SNIP_TEST_REDIS_URL` / `SNIP_TEST_DATABASE_URL` point at a disposable
//! server; otherwise those tests return early.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use snip_store::{FileStore, InMemoryStore, KeyValueStore, PostgresStore, RedisStore, StoreError};
use snip_types::Key;

const TIMEOUT: Duration = Duration::from_secs(5);

fn key(bytes: &[u8]) -> Key {
    Key::from_slice(bytes).unwrap()
}

/// A key no earlier run can have written, for backends that outlive the test.
fn fresh_key() -> Key {
    key(&rand::random::<[u8; 8]>())
}

async fn round_trip(store: &dyn KeyValueStore) {
    let k = fresh_key();
    store.insert(&k, b"http://example.com/a").await.unwrap();
    assert_eq!(store.get(&k).await.unwrap(), &b"http://example.com/a"[..]);
}

async fn duplicate_keeps_first(store: &dyn KeyValueStore) {
    let k = fresh_key();
    store.insert(&k, b"first").await.unwrap();
    for payload in [&b"second"[..], &b"first"[..], &b""[..]] {
        let err = store.insert(&k, payload).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(d) if d == k));
    }
    assert_eq!(store.get(&k).await.unwrap(), &b"first"[..]);
}

async fn absent_is_not_found(store: &dyn KeyValueStore) {
    let err = store.get(&fresh_key()).await.unwrap_err();
    assert!(err.is_not_found());
}

async fn binary_payload(store: &dyn KeyValueStore) {
    let k = fresh_key();
    let payload: Vec<u8> = (0..=255u8).collect();
    store.insert(&k, &payload).await.unwrap();
    assert_eq!(store.get(&k).await.unwrap(), payload.as_slice());
}

async fn race_has_one_winner(store: Arc<dyn KeyValueStore>) {
    const RACERS: usize = 16;
    let k = fresh_key();
    let handles: Vec<_> = (0..RACERS)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let payload = format!("racer-{i}").into_bytes();
                store.insert(&k, &payload).await.map(|()| payload)
            })
        })
        .collect();

    let mut winners = Vec::new();
    let mut duplicates = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(payload) => winners.push(payload),
            Err(StoreError::DuplicateKey(_)) => duplicates += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(winners.len(), 1);
    assert_eq!(duplicates, RACERS - 1);
    assert_eq!(store.get(&k).await.unwrap(), winners[0].as_slice());
}

/// Poll `get` while a large insert is in flight. Every successful read must
/// return the whole payload.
async fn reads_see_whole_payload(store: Arc<dyn KeyValueStore>, size: usize, rounds: usize) {
    for round in 0..rounds {
        let k = fresh_key();
        let payload: Arc<Vec<u8>> = Arc::new((0..size).map(|i| (i + round) as u8).collect());

        let writer = {
            let store = Arc::clone(&store);
            let payload = Arc::clone(&payload);
            tokio::spawn(async move { store.insert(&k, &payload).await })
        };

        loop {
            match store.get(&k).await {
                Ok(stored) => {
                    assert_eq!(stored.len(), payload.len(), "partial read in round {round}");
                    assert!(stored.as_ref() == payload.as_slice());
                    break;
                }
                Err(e) if e.is_not_found() => tokio::task::yield_now().await,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        writer.await.unwrap().unwrap();
    }
}

async fn full_contract(store: Arc<dyn KeyValueStore>) {
    round_trip(store.as_ref()).await;
    duplicate_keeps_first(store.as_ref()).await;
    absent_is_not_found(store.as_ref()).await;
    binary_payload(store.as_ref()).await;
    reads_see_whole_payload(Arc::clone(&store), 256 << 10, 4).await;
    race_has_one_winner(store).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn memory_backend_contract() {
    full_contract(Arc::new(InMemoryStore::new())).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn file_backend_contract() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path(), TIMEOUT).unwrap();
    full_contract(Arc::new(store)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn file_backend_reads_during_large_insert() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path(), TIMEOUT).unwrap();
    reads_see_whole_payload(Arc::new(store), 4 << 20, 20).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn file_backend_timeout_is_a_backend_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path(), Duration::from_millis(1)).unwrap();
    let payload = vec![7u8; 64 << 20];
    match store.insert(&fresh_key(), &payload).await {
        Ok(()) => {}
        Err(e) => {
            assert!(matches!(e, StoreError::Timeout { .. }), "unexpected error: {e}");
            assert_eq!(e.kind(), snip_types::ErrorKind::Backend);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn file_backend_failed_insert_stores_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("store");
    let store = FileStore::open(&root, TIMEOUT).unwrap();
    std::fs::remove_dir(&root).unwrap();

    let k = key(b"lost");
    assert!(store.insert(&k, b"payload").await.is_err());
    std::fs::create_dir(&root).unwrap();
    assert!(store.get(&k).await.unwrap_err().is_not_found());
    assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
    store.insert(&k, b"payload").await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn file_backends_sharing_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    let a = FileStore::open(dir.path(), TIMEOUT).unwrap();
    let b = FileStore::open(dir.path(), TIMEOUT).unwrap();
    let k = key(b"shared");

    a.insert(&k, b"from-a").await.unwrap();
    assert!(b.insert(&k, b"from-b").await.unwrap_err().is_duplicate_key());
    assert_eq!(b.get(&k).await.unwrap(), &b"from-a"[..]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn redis_backend_contract() {
    let Ok(url) = std::env::var("SNIP_TEST_REDIS_URL") else {
        eprintln!("SNIP_TEST_REDIS_URL not set, skipping");
        return;
    };
    let store = RedisStore::connect(&url, TIMEOUT).await.unwrap();
    full_contract(Arc::new(store)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn postgres_backend_contract() {
    let Ok(url) = std::env::var("SNIP_TEST_DATABASE_URL") else {
        eprintln!("SNIP_TEST_DATABASE_URL not set, skipping");
        return;
    };
    let store = PostgresStore::connect(&url, "snip_contract_test", 4, TIMEOUT)
        .await
        .unwrap();
    store.ensure_table().await.unwrap();
    full_contract(Arc::new(store)).await;
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn memory_round_trips_any_payload(
        k in proptest::collection::vec(any::<u8>(), 1..=32),
        payload in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let store = InMemoryStore::new();
        let k = key(&k);
        let got = rt.block_on(async {
            store.insert(&k, &payload).await.unwrap();
            store.get(&k).await.unwrap()
        });
        prop_assert_eq!(got.as_ref(), payload.as_slice());
    }
}
