#![cfg(test)]

// Property tests for ProbeHashMap kept inside the crate so they can check
// the index invariants after every operation.

use crate::probe_hash_map::{Handle, Insert, ProbeHashMap};
use crate::KeyNotFound;
use proptest::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations shrink to earlier keys and shorter op lists.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Remove(usize),
    RemoveHandle(usize),
    Find(usize),
    At(String),
    GetOrDefault(usize),
    Mutate(usize, i32),
    RetainEven,
    Clear,
    CloneCheck,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let at_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            4 => idx.clone().prop_map(Op::Remove),
            2 => idx.clone().prop_map(Op::RemoveHandle),
            2 => idx.clone().prop_map(Op::Find),
            1 => prop_oneof![
                at_pool.prop_map(|s: String| s),
                "[a-z]{0,4}".prop_map(|s| s)
            ]
            .prop_map(Op::At),
            2 => idx.clone().prop_map(Op::GetOrDefault),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => Just(Op::RetainEven),
            1 => Just(Op::Clear),
            1 => Just(Op::CloneCheck),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Reference model: values by key plus the insertion order of live keys.
#[derive(Default)]
struct Model {
    values: HashMap<Key, i32>,
    order: Vec<Key>,
}

impl Model {
    fn insert(&mut self, k: Key, v: i32) -> bool {
        if self.values.contains_key(&k) {
            return false;
        }
        self.values.insert(k.clone(), v);
        self.order.push(k);
        true
    }

    fn remove(&mut self, k: &Key) -> Option<i32> {
        let v = self.values.remove(k)?;
        self.order.retain(|o| o != k);
        Some(v)
    }
}

fn run_state_machine<S>(
    mut sut: ProbeHashMap<Key, i32, S>,
    pool: Vec<String>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher + Clone,
{
    let mut model = Model::default();
    let mut live: HashMap<Key, Handle> = HashMap::new();
    let mut stale: Vec<Handle> = Vec::new();

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = key_from(&pool, i);
                let before = sut.get(&k).copied();
                let res = sut.insert(k.clone(), v);
                let fresh = model.insert(k.clone(), v);
                match res {
                    Insert::Inserted(h) => {
                        prop_assert!(fresh, "insert must be a no-op on a present key");
                        prop_assert!(live.insert(k, h).is_none());
                    }
                    Insert::Existing(h) => {
                        prop_assert!(!fresh);
                        prop_assert_eq!(Some(&h), live.get(&k));
                        prop_assert_eq!(sut.get(&k).copied(), before, "value must not change");
                    }
                }
                // Load bound holds once the insert (and any growth) returns.
                prop_assert!(sut.len() * sut.policy().max_load_inverse <= sut.capacity());
            }
            Op::Remove(i) => {
                let k = key_from(&pool, i);
                prop_assert_eq!(sut.remove(&k), model.remove(&k));
                if let Some(h) = live.remove(&k) {
                    stale.push(h);
                }
                prop_assert!(sut.find(&k).is_none());
            }
            Op::RemoveHandle(i) => {
                let k = key_from(&pool, i);
                match live.remove(&k) {
                    Some(h) => {
                        let (kk, vv) = sut.remove_handle(h).expect("live handle removes");
                        prop_assert!(kk == k);
                        prop_assert_eq!(Some(vv), model.remove(&k));
                        stale.push(h);
                    }
                    None => prop_assert!(!sut.contains_key(&k)),
                }
            }
            Op::Find(i) => {
                let k = key_from(&pool, i);
                let found = sut.find(&k);
                prop_assert_eq!(found.is_some(), model.values.contains_key(&k));
                if let Some(h) = found {
                    prop_assert_eq!(Some(&h), live.get(&k));
                    prop_assert_eq!(h.value(&sut), model.values.get(&k));
                }
            }
            Op::At(s) => {
                let expected = model.values.iter().find(|(k, _)| k.0 == s).map(|(_, v)| v);
                match sut.at(s.as_str()) {
                    Ok(v) => prop_assert_eq!(Some(v), expected),
                    Err(KeyNotFound) => prop_assert!(expected.is_none()),
                }
            }
            Op::GetOrDefault(i) => {
                let k = key_from(&pool, i);
                let v = *sut.get_or_default(k.clone());
                model.insert(k.clone(), 0);
                prop_assert_eq!(Some(&v), model.values.get(&k));
                if !live.contains_key(&k) {
                    let h = sut.find(&k).expect("inserted by get_or_default");
                    live.insert(k, h);
                }
            }
            Op::Mutate(i, d) => {
                let k = key_from(&pool, i);
                if let Some(&h) = live.get(&k) {
                    let vr = h.value_mut(&mut sut).expect("live handle resolves");
                    *vr = vr.wrapping_add(d);
                    let mv = model.values.get_mut(&k).expect("present in model");
                    *mv = mv.wrapping_add(d);
                }
            }
            Op::RetainEven => {
                sut.retain(|_, v| *v % 2 == 0);
                let dropped: Vec<Key> = model
                    .order
                    .iter()
                    .filter(|k| model.values[*k] % 2 != 0)
                    .cloned()
                    .collect();
                for k in dropped {
                    model.remove(&k);
                    if let Some(h) = live.remove(&k) {
                        stale.push(h);
                    }
                }
            }
            Op::Clear => {
                sut.clear();
                prop_assert_eq!(sut.capacity(), sut.policy().start_capacity);
                stale.extend(live.drain().map(|(_, h)| h));
                model = Model::default();
            }
            Op::CloneCheck => {
                let mut copy = sut.clone();
                copy.assert_invariants();
                prop_assert!(copy == sut);
                let pairs: Vec<(Key, i32)> = copy.iter().map(|(k, v)| (k.clone(), *v)).collect();
                let expected: Vec<(Key, i32)> = model
                    .order
                    .iter()
                    .map(|k| (k.clone(), model.values[k]))
                    .collect();
                prop_assert_eq!(pairs, expected);
                copy.clear();
                prop_assert_eq!(sut.len(), model.values.len());
            }
        }

        // Post-conditions after each op
        sut.assert_invariants();
        for &h in &stale {
            prop_assert!(h.value(&sut).is_none(), "stale handle must not resolve");
        }
        prop_assert_eq!(sut.len(), model.values.len());
        prop_assert_eq!(sut.is_empty(), model.values.is_empty());
        prop_assert!(sut.keys().eq(model.order.iter()), "iteration follows insertion order");
    }
    Ok(())
}

// Property: state-machine equivalence against a HashMap + insertion-order
// model. Exercises the no-overwrite insert, tombstone reuse through churn on
// a small key pool, grow and shrink rebuilds, handle stability across
// rebuilds, and the index invariants after every operation.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_state_machine(ProbeHashMap::new(), pool, ops)?;
    }
}

// Collision variant using a constant hasher: every key shares one probe
// start, so probes run through long chains of occupied and tombstone slots.
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

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_state_machine(ProbeHashMap::with_hasher(ConstBuildHasher), pool, ops)?;
    }
}
