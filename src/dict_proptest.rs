#![cfg(test)]

// Property tests for Dict kept inside the crate so they can check the
// structural invariants (chain counts, bucket placement, cursor range)
// after every operation.

use crate::dict::{Dict, DictConfig};
use crate::hash::IdentityState;
use crate::sds::Sds;
use core::hash::{BuildHasher, Hasher};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};

// Pool-indexed operations shrink well: indices shrink to earlier keys, the
// pool shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Remove(usize),
    Find(usize),
    Bump(usize, i32),
    Contains(String),
    Iterate,
    SafeDrain(u8),
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Sds {
    Sds::from(pool[i].as_str())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            8 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            3 => idx.clone().prop_map(Op::Remove),
            2 => idx.clone().prop_map(Op::Find),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Bump(i, d)),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(Op::Contains),
            1 => Just(Op::Iterate),
            1 => (2u8..5).prop_map(Op::SafeDrain),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_against_model<S: BuildHasher>(
    mut sut: Dict<Sds, i32, S>,
    pool: &[String],
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Sds, i32> = HashMap::new();

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = key_from(pool, i);
                let fresh = !model.contains_key(&k);
                prop_assert_eq!(sut.insert(k.clone(), v), fresh);
                model.insert(k, v);
            }
            Op::Remove(i) => {
                let k = key_from(pool, i);
                let expected = model.remove(&k);
                prop_assert_eq!(sut.remove_entry(&k), expected.map(|v| (k.clone(), v)));
                prop_assert!(!sut.contains(&k));
            }
            Op::Find(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.find(&k), model.get(&k));
            }
            Op::Bump(i, d) => {
                let k = key_from(pool, i);
                match (sut.find_mut(&k), model.get_mut(&k)) {
                    (Some(s), Some(m)) => {
                        *s = s.wrapping_add(d);
                        *m = m.wrapping_add(d);
                    }
                    (None, None) => {}
                    (s, m) => prop_assert!(false, "find_mut {:?} vs model {:?}", s, m),
                }
            }
            Op::Contains(s) => {
                // Borrowed `[u8]` lookup agrees with `Sds` lookup.
                let has = sut.contains(s.as_bytes());
                prop_assert_eq!(has, model.contains_key(&Sds::from(s.as_str())));
            }
            Op::Iterate => {
                let seen: BTreeMap<Sds, i32> =
                    sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(seen.len(), sut.len());
                let expected: BTreeMap<Sds, i32> =
                    model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(seen, expected);
                prop_assert_eq!(sut.keys().len(), sut.values().len());
            }
            Op::SafeDrain(m) => {
                let mut it = sut.safe_iter();
                while let Some((_, v)) = it.next_entry() {
                    if (*v).rem_euclid(i32::from(m)) == 0 {
                        let (k, _) = it.remove_current().expect("yielded entry");
                        model.remove(&k);
                    }
                }
            }
            Op::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.table_size(), sut.config().min_size());
            }
        }

        sut.check_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `insert` reports new-vs-replaced exactly when the model does.
// - `find`/`find_mut`/`contains` parity, including borrowed `[u8]` lookups.
// - `remove_entry` returns the model's pair; the key is gone afterwards.
// - `iter` yields every live entry once; `safe_iter` removals stay in sync.
// - After every op: count == sum of chain lengths, each entry sits in the
//   bucket its stored hash selects, and migrated source buckets are empty.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_against_model(Dict::new(), &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_small_batches((pool, ops) in arb_scenario()) {
        let cfg = DictConfig::new().with_rehash_batch_divisor(usize::MAX);
        let sut = Dict::with_config_and_hasher(cfg, crate::hash::DefaultHashBuilder::default());
        run_against_model(sut, &pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: same state-machine invariants as above with every key in one
// chain, so every rehash step moves the whole population at bucket 0.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_against_model(Dict::with_hasher(ConstBuildHasher), &pool, ops)?;
    }
}

// Property: with only insertions, the table always holds at least
// `n / resize_ratio` buckets once any cycle has finished, the load factor
// stays below 2.0, and every inserted key is still found.
proptest! {
    #[test]
    fn prop_growth_bounds(keys in proptest::collection::btree_set(any::<u32>(), 1..600)) {
        let mut d: Dict<u32, u32, IdentityState> = Dict::with_hasher(IdentityState);
        let mut inserted = BTreeSet::new();
        for k in keys {
            prop_assert!(d.insert(k, k.wrapping_mul(3)));
            inserted.insert(k);
            if !d.is_rehashing() {
                prop_assert!(d.table_size() >= d.len());
                prop_assert!(d.load_factor() < 2.0);
            }
        }
        d.check_invariants();
        for k in &inserted {
            prop_assert_eq!(d.find(k), Some(&k.wrapping_mul(3)));
        }
        let walked: BTreeSet<u32> = d.iter().map(|(k, _)| *k).collect();
        prop_assert_eq!(walked, inserted);
    }
}
