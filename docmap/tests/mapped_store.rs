use std::collections::{BTreeMap, HashSet};

use docmap::{memory::InMemoryStore, prelude::*};
use futures::{TryStreamExt, future::join_all};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
struct Tile {
    layer: String,
    x: i32,
    y: i32,
}

fn tile(layer: &str, x: i32, y: i32) -> Tile {
    Tile { layer: layer.into(), x, y }
}

async fn letters(backend: &InMemoryStore) -> MappedStore<&InMemoryStore, String, i32> {
    MappedStore::builder(backend, "letters").build().await.unwrap()
}

fn s(value: &str) -> String {
    value.to_string()
}

#[tokio::test]
async fn remove_batch_scenario() {
    let backend = InMemoryStore::new();
    let store = letters(&backend).await;

    store.store_or_update(&s("a"), &1).await.unwrap();
    store.store_or_update(&s("b"), &2).await.unwrap();
    assert_eq!(store.get(&s("a")).await.unwrap(), Some(1));

    let removed = store.remove_batch(&[s("a"), s("c")]).await.unwrap();

    assert_eq!(removed, 1);
    assert_eq!(store.count(), 1);
    let values: Vec<i32> = store.values().try_collect().await.unwrap();
    assert_eq!(values, vec![2]);
}

#[tokio::test]
async fn stored_values_read_back() {
    let backend = InMemoryStore::new();
    let store = MappedStore::<_, Tile, Vec<String>>::builder(&backend, "tiles")
        .build()
        .await
        .unwrap();

    let key = tile("terrain", -3, 12);
    let value = vec![s("grass"), s("rock")];
    store.store_or_update(&key, &value).await.unwrap();

    assert_eq!(store.get(&key).await.unwrap(), Some(value.clone()));
    assert!(store.contains(&key).await.unwrap());

    let record = store.get_record(&key).await.unwrap().unwrap();
    assert_eq!(record.key, key);
    assert_eq!(record.identifier, store.identifier(&key).unwrap());
}

#[tokio::test]
async fn missing_keys_are_absent_not_errors() {
    let backend = InMemoryStore::new();
    let store = letters(&backend).await;

    assert_eq!(store.get(&s("nope")).await.unwrap(), None);
    assert!(!store.contains(&s("nope")).await.unwrap());
}

#[tokio::test]
async fn count_tracks_only_new_keys() {
    let backend = InMemoryStore::new();
    let store = letters(&backend).await;

    for (i, key) in ["a", "b", "c", "d"].iter().enumerate() {
        let outcome = store.store_or_update(&s(key), &(i as i32)).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);
    }
    assert_eq!(store.count(), 4);

    for _ in 0..3 {
        let outcome = store.store_or_update(&s("b"), &99).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Replaced);
    }

    assert_eq!(store.count(), 4);
    assert_eq!(store.get(&s("b")).await.unwrap(), Some(99));
    store.verify_count().await.unwrap();
}

#[tokio::test]
async fn remove_never_drives_count_negative() {
    let backend = InMemoryStore::new();
    let store = letters(&backend).await;
    store.set(&s("a"), &1).await.unwrap();

    assert!(store.remove(&s("a")).await.unwrap());
    assert_eq!(store.count(), 0);
    assert_eq!(store.get(&s("a")).await.unwrap(), None);

    assert!(!store.remove(&s("a")).await.unwrap());
    assert_eq!(store.count(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn remove_batch_counts_what_was_removed() {
    let backend = InMemoryStore::new();
    let store = letters(&backend).await;
    store.set(&s("k1"), &1).await.unwrap();
    store.set(&s("k2"), &2).await.unwrap();
    store.set(&s("k4"), &4).await.unwrap();

    let keys: HashSet<String> = [s("k1"), s("k2"), s("k3")].into();
    let removed = store.remove_batch(&keys).await.unwrap();

    assert_eq!(removed, 2);
    assert_eq!(store.count(), 1);
    assert_eq!(store.remove_batch(&[s("k4"), s("k4")]).await.unwrap(), 1);
    assert_eq!(store.remove_batch(&Vec::<String>::new()).await.unwrap(), 0);
    assert_eq!(store.count(), 0);
}

#[tokio::test]
async fn clear_empties_the_store() {
    let backend = InMemoryStore::new();
    let store = letters(&backend).await;
    store
        .store_batch([(s("a"), 1), (s("b"), 2), (s("c"), 3)])
        .await
        .unwrap();

    store.clear().await.unwrap();

    assert_eq!(store.count(), 0);
    let values: Vec<i32> = store.values().try_collect().await.unwrap();
    assert!(values.is_empty());

    // The collection is usable again after a clear.
    store.set(&s("a"), &1).await.unwrap();
    assert_eq!(store.count(), 1);
}

#[tokio::test]
async fn values_span_pages_and_restart() {
    let backend = InMemoryStore::new();
    let store = MappedStore::<_, u32, u32>::builder(&backend, "squares")
        .with_page_size(3)
        .build()
        .await
        .unwrap();

    let pairs: BTreeMap<u32, u32> = (0..10).map(|n| (n, n * n)).collect();
    let report = store.store_batch(&pairs).await.unwrap();
    assert_eq!(report, BatchReport { inserted: 10, replaced: 0 });

    let mut first: Vec<u32> = store.values().try_collect().await.unwrap();
    let mut second: Vec<u32> = store.values().try_collect().await.unwrap();
    first.sort_unstable();
    second.sort_unstable();

    assert_eq!(first, pairs.values().copied().collect::<Vec<_>>());
    assert_eq!(first, second);

    let entries: BTreeMap<u32, u32> = store.entries().try_collect().await.unwrap();
    assert_eq!(entries, pairs);

    let keys: Vec<u32> = store.keys().try_collect().await.unwrap();
    assert_eq!(keys.len(), 10);
}

#[tokio::test]
async fn stable_hash_store_round_trips() {
    let backend = InMemoryStore::new();
    let store = MappedStore::<_, Tile, u8>::builder(&backend, "hashed")
        .with_strategy(IdentityStrategy::StableHash)
        .build()
        .await
        .unwrap();

    let key = tile("water", 0, 1);
    store.set(&key, &7).await.unwrap();

    let identifier = store.identifier(&key).unwrap();
    assert_eq!(identifier.len(), 16);
    assert!(identifier.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(store.get(&key).await.unwrap(), Some(7));
    assert!(store.remove(&key).await.unwrap());
}

#[tokio::test]
async fn reopening_sees_existing_records() {
    let backend = InMemoryStore::new();
    {
        let store = letters(&backend).await;
        store.store_batch([(s("x"), 1), (s("y"), 2)]).await.unwrap();
    }

    let reopened = letters(&backend).await;

    assert_eq!(reopened.count(), 2);
    assert_eq!(reopened.get(&s("y")).await.unwrap(), Some(2));
}

#[tokio::test]
async fn stores_on_one_backend_are_independent() {
    let documents = DocumentStore::new(InMemoryStore::new());
    let config = MappedStoreConfig {
        strategy: IdentityStrategy::StableHash,
        page_size: 16,
    };

    let left = documents
        .mapped_store::<String, i32>("left")
        .with_config(config.clone())
        .build()
        .await
        .unwrap();
    let right = documents
        .mapped_store::<String, i32>("right")
        .with_config(config)
        .build()
        .await
        .unwrap();

    left.set(&s("a"), &1).await.unwrap();

    assert_eq!(right.get(&s("a")).await.unwrap(), None);
    assert_eq!(right.count(), 0);
    assert_eq!(
        documents.list_collections().await.unwrap(),
        vec![s("left")]
    );
}

#[tokio::test]
async fn concurrent_upserts_of_one_key_count_once() {
    let backend = InMemoryStore::new();
    let store = letters(&backend).await;
    let key = s("shared");
    let (store, key) = (&store, &key);

    let results = join_all((0..32).map(|i| async move { store.store_or_update(key, &i).await })).await;
    let inserts = results
        .into_iter()
        .map(Result::unwrap)
        .filter(UpsertOutcome::is_insert)
        .count();

    assert_eq!(inserts, 1);
    assert_eq!(store.count(), 1);
    store.verify_count().await.unwrap();
}

#[tokio::test]
async fn writes_around_the_store_are_caught_by_recount() {
    let backend = InMemoryStore::new();
    let store = letters(&backend).await;
    store.set(&s("a"), &1).await.unwrap();

    backend.drop_collection("letters").await.unwrap();

    assert!(matches!(
        store.verify_count().await,
        Err(StoreError::InvariantViolation { cached: 1, actual: 0 })
    ));
    assert_eq!(store.recount().await.unwrap(), 0);
    assert_eq!(store.count(), 0);
}
