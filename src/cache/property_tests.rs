//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check lookup and cycling rules over random operation
//! sequences.

use proptest::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

use crate::cache::{Cache, CacheLookup, GenerationStore, MemoryCache, MAX_RETAINED_GENERATIONS};

// == Test Configuration ==
const TEST_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
/// Generates cache keys shaped like rendered page keys
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,8}:[a-f0-9]{4}:(en|de|fr)".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 <>/]{1,64}".prop_map(|s| s)
}

fn generation_strategy() -> impl Strategy<Value = String> {
    "g[0-9]{1,3}".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum StoreOp {
    Set { key: String, value: String },
    Delete { key: String },
    Cycle { generation: String, force: bool },
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        3 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| StoreOp::Set { key, value }),
        1 => key_strategy().prop_map(|key| StoreOp::Delete { key }),
        1 => (generation_strategy(), any::<bool>())
            .prop_map(|(generation, force)| StoreOp::Cycle { generation, force }),
    ]
}

/// Reference model: the latest write per key, tagged with its generation.
#[derive(Default)]
struct Model {
    generation: String,
    previous: Option<String>,
    values: HashMap<String, HashMap<String, String>>,
}

impl Model {
    fn expected(&self, key: &str) -> CacheLookup {
        if let Some(value) = self.values.get(&self.generation).and_then(|s| s.get(key)) {
            return CacheLookup::Current(value.clone());
        }
        self.previous
            .as_ref()
            .and_then(|previous| self.values.get(previous))
            .and_then(|segment| segment.get(key))
            .map(|value| CacheLookup::Stale(value.clone()))
            .unwrap_or(CacheLookup::Miss)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Any sequence of writes, deletes and cycles reads back exactly what a
    // two-generation model predicts, and never retains more than two segments.
    #[test]
    fn prop_store_matches_two_generation_model(
        ops in prop::collection::vec(store_op_strategy(), 1..60),
        lookups in prop::collection::vec(key_strategy(), 1..10),
    ) {
        let mut store = GenerationStore::new("g0", TEST_TTL, false);
        let mut model = Model { generation: "g0".to_string(), ..Model::default() };
        let mut touched: Vec<String> = lookups;

        for op in ops {
            match op {
                StoreOp::Set { key, value } => {
                    store.insert(key.clone(), value.clone());
                    model
                        .values
                        .entry(model.generation.clone())
                        .or_default()
                        .insert(key.clone(), value);
                    touched.push(key);
                }
                StoreOp::Delete { key } => {
                    store.remove(&key);
                    for segment in model.values.values_mut() {
                        segment.remove(&key);
                    }
                }
                StoreOp::Cycle { generation, force } => {
                    let previous = model.generation.clone();
                    store.advance(&generation, &previous, force);

                    let kept_previous = (!force && previous != generation).then_some(previous);
                    model.values.retain(|id, _| {
                        *id == generation || Some(id) == kept_previous.as_ref()
                    });
                    model.generation = generation;
                    model.previous = kept_previous;

                    prop_assert!(store.segment_count() <= MAX_RETAINED_GENERATIONS);
                    if force {
                        prop_assert_eq!(store.segment_count(), 1);
                    }
                }
            }
        }

        for key in touched {
            prop_assert_eq!(store.lookup(&key), model.expected(&key), "key {}", key);
        }
    }

    // A value written in one generation stays readable as stale for exactly
    // one further non-forced cycle.
    #[test]
    fn prop_stale_for_one_cycle(key in key_strategy(), value in value_strategy()) {
        let mut store = GenerationStore::new("g1", TEST_TTL, false);
        store.insert(key.clone(), value.clone());

        store.advance("g2", "g1", false);
        prop_assert_eq!(store.lookup(&key), CacheLookup::Stale(value));

        store.advance("g3", "g2", false);
        prop_assert_eq!(store.lookup(&key), CacheLookup::Miss);
    }

    // Concurrent writers on distinct keys never lose an update.
    #[test]
    fn prop_concurrent_sets_are_not_lost(
        keys in prop::collection::hash_set(key_strategy(), 1..40),
    ) {
        let found = tokio_test::block_on(async {
            let cache = std::sync::Arc::new(MemoryCache::spawn(
                "pages", "example.org", "g1", TEST_TTL, false, None,
            ));

            let writers: Vec<_> = keys
                .iter()
                .cloned()
                .map(|key| {
                    let cache = cache.clone();
                    tokio::spawn(async move { cache.set(&key, format!("value-{key}")).await })
                })
                .collect();
            for writer in writers {
                writer.await.unwrap().unwrap();
            }

            let mut found = 0;
            for key in &keys {
                if cache.get(key).await.unwrap() == CacheLookup::Current(format!("value-{key}")) {
                    found += 1;
                }
            }
            found
        });

        prop_assert_eq!(found, keys.len());
    }
}
