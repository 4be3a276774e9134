// RobinHoodTable property tests against a std HashMap model.
//
// Property 1: arbitrary insert/remove/get sequences agree with the model.
//  - Keys collide on purpose: an identity hasher plus keys drawn as
//    multiples of a small stride pile entries onto few home slots.
//  - Invariant after each step: get(k) matches the model, len() equals the
//    model's len, and len() stays below the growth threshold.
//
// Property 2: growth preserves content.
//  - Insert many distinct keys into a tiny table, crossing the threshold
//    several times; every key keeps its value and len() is unaffected.
//
// Property 3: updates and tombstone reuse.
//  - put(k, v1); put(k, v2) returns v1 and leaves len() unchanged.
//  - put(k, v); remove(k); put(k, v2) leaves get(k) == v2 and len() == 1.
#![allow(missing_docs, clippy::missing_docs_in_private_items, clippy::unwrap_used)]

use std::{
    collections::HashMap,
    hash::{BuildHasherDefault, Hasher},
};

use proptest::prelude::*;
use robin_hood_table::{HashMapExtensions, RobinHoodTable};

/// Hashes an integer key to itself
#[derive(Debug, Default, Clone, Copy)]
struct IdentityHasher(u64);

impl Hasher for IdentityHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 = self.0.rotate_left(8) ^ u64::from(byte);
        }
    }

    fn write_u64(&mut self, n: u64) {
        self.0 = n;
    }
}

type IdentityState = BuildHasherDefault<IdentityHasher>;

fn colliding_table(capacity: usize, load_factor: f64) -> RobinHoodTable<u64, u32, IdentityState> {
    RobinHoodTable::with_load_factor_and_hasher(capacity, load_factor, IdentityState::default())
        .unwrap()
}

proptest! {
    #[test]
    fn prop_matches_model(
        capacity in 1usize..=16,
        load_factor in prop_oneof![Just(0.5), Just(0.75), Just(1.0)],
        stride in prop_oneof![Just(1u64), Just(8), Just(64)],
        ops in proptest::collection::vec((0u8..=2u8, 0u64..24u64, any::<u32>()), 1..400),
    ) {
        let mut table = colliding_table(capacity, load_factor);
        let mut model: HashMap<u64, u32> = HashMap::new();

        for (op, raw_key, value) in ops {
            let key = raw_key * stride;
            match op {
                0 => {
                    prop_assert_eq!(table.insert(key, value), model.insert(key, value));
                }
                1 => {
                    prop_assert_eq!(table.remove(&key), model.remove(&key));
                }
                _ => {
                    prop_assert_eq!(table.get(&key), model.get(&key));
                }
            }

            prop_assert_eq!(table.get(&key), model.get(&key));
            prop_assert_eq!(table.len(), model.len());
            prop_assert!(table.len() < table.threshold());
            prop_assert!(table.capacity().is_power_of_two());
        }

        for (key, value) in &model {
            prop_assert_eq!(table.get(key), Some(value));
        }
        prop_assert_eq!(table.iter().count(), model.len());
    }

    #[test]
    fn prop_growth_preserves_content(keys in proptest::collection::hash_set(any::<u64>(), 1..300)) {
        let mut table = RobinHoodTable::with_capacity(1);
        for (i, &key) in keys.iter().enumerate() {
            prop_assert_eq!(table.insert(key, i), None);
            prop_assert_eq!(table.len(), i + 1);
        }

        for (i, key) in keys.iter().enumerate() {
            prop_assert_eq!(table.get(key), Some(&i));
        }
        prop_assert!(table.capacity() > keys.len());
        prop_assert_eq!(table.tombstones(), 0);
    }

    #[test]
    fn prop_update_is_idempotent_on_len(
        prefill in proptest::collection::vec(0u64..32u64, 0..20),
        key in 0u64..32u64,
        v1 in any::<u32>(),
        v2 in any::<u32>(),
    ) {
        let mut table = colliding_table(8, 0.5);
        for k in prefill {
            table.insert(k * 8, 0);
        }
        table.insert(key * 8, v1);
        let len = table.len();

        prop_assert_eq!(table.insert(key * 8, v2), Some(v1));
        prop_assert_eq!(table.len(), len);
        prop_assert_eq!(table.get(&(key * 8)), Some(&v2));
    }

    #[test]
    fn prop_tombstone_reuse(key in any::<u64>(), v1 in any::<u32>(), v2 in any::<u32>()) {
        let mut table = colliding_table(4, 0.5);
        prop_assert_eq!(table.insert(key, v1), None);
        prop_assert_eq!(table.remove(&key), Some(v1));
        prop_assert_eq!(table.get(&key), None);
        prop_assert!(!table.contains_key(&key));

        prop_assert_eq!(table.insert(key, v2), None);
        prop_assert_eq!(table.get(&key), Some(&v2));
        prop_assert_eq!(table.len(), 1);
    }
}

#[test]
fn colliding_pair_doubles_capacity() {
    let mut table = colliding_table(4, 0.5);
    assert_eq!(table.threshold(), 2);

    table.insert(2, 20);
    table.insert(6, 60);

    assert_eq!(table.capacity(), 8);
    assert_eq!(table.get(&2), Some(&20));
    assert_eq!(table.get(&6), Some(&60));
}

#[test]
fn removed_middle_of_chain_keeps_tail_reachable() {
    let mut table = colliding_table(8, 0.5);
    table.insert(5, 1);
    table.insert(13, 2);
    table.insert(21, 3);

    assert_eq!(table.remove(&13), Some(2));

    assert_eq!(table.get(&21), Some(&3));
    assert_eq!(table.get(&13), None);
    assert_eq!(table.len(), 2);
}
