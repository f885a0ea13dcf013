// ProbeHashMap integration test suite.
//
// Each test documents what behavior is being verified. The core
// properties exercised:
// - Round-trip: insert then find yields the value; erase then find is None.
// - No-overwrite insert: a present key keeps its first value.
// - Ordering: iteration follows insertion order through removals and
//   index rebuilds.
// - Resizing: grow on `2 * len > capacity`, shrink on `8 * len < capacity`
//   floored at the start capacity, never shrink an empty map.
// - Copying: clones and `clone_from` are deep and independent.
use probe_hashmap::{Insert, KeyNotFound, LoadPolicy, PolicyError, ProbeHashMap};
use std::collections::hash_map::DefaultHasher;
use std::hash::BuildHasherDefault;

// Test: the worked scenario from an empty map of capacity 5.
// Verifies: growth point, erase, default-inserting index, deep copy.
#[test]
fn documented_scenario() {
    let mut m: ProbeHashMap<i32, i32> = ProbeHashMap::new();
    assert_eq!(m.capacity(), 5);

    for k in 1..=4 {
        assert!(m.insert(k, k * 10).is_inserted());
        if k == 2 {
            assert_eq!(m.capacity(), 5);
        }
        if k == 3 {
            // 2 * 3 > 5
            assert_eq!(m.capacity(), 11);
        }
    }
    assert_eq!(m.len(), 4);
    assert_eq!(m.capacity(), 11);
    for k in 1..=4 {
        assert_eq!(m.get(&k), Some(&(k * 10)));
    }

    assert_eq!(m.remove(&2), Some(20));
    assert_eq!(m.len(), 3);
    assert!(m.find(&2).is_none());
    for k in [1, 3, 4] {
        assert!(m.find(&k).is_some());
    }

    assert_eq!(*m.get_or_default(9), 0);
    assert_eq!(m.get(&9), Some(&0));
    assert_eq!(m.len(), 4);

    let mut copy = m.clone();
    *copy.get_or_default(1) = -1;
    copy.remove(&3);
    copy.insert(100, 100);
    assert_eq!(m.get(&1), Some(&10));
    assert_eq!(m.get(&3), Some(&30));
    assert!(!m.contains_key(&100));
    assert_eq!(m.keys().copied().collect::<Vec<_>>(), vec![1, 3, 4, 9]);
    assert_eq!(copy.keys().copied().collect::<Vec<_>>(), vec![1, 4, 9, 100]);
}

// Test: insert/find/erase round-trip with owned and borrowed keys.
#[test]
fn round_trip_with_borrowed_lookup() {
    let mut m: ProbeHashMap<String, u32> = ProbeHashMap::new();
    let h = m.insert("alpha".to_string(), 1).handle();
    assert_eq!(m.find("alpha"), Some(h));
    assert_eq!(m.get("alpha"), Some(&1));
    assert_eq!(m.get_key_value("alpha"), Some((&"alpha".to_string(), &1)));
    assert_eq!(m.remove_entry("alpha"), Some(("alpha".to_string(), 1)));
    assert!(m.find("alpha").is_none());
    assert!(h.value(&m).is_none());
    // Erasing an absent key is a no-op.
    assert_eq!(m.remove("alpha"), None);
    assert!(m.is_empty());
}

// Test: insert never overwrites; the second insert reports the first record.
#[test]
fn second_insert_is_noop() {
    let mut m: ProbeHashMap<&str, i32> = ProbeHashMap::new();
    let first = m.insert("k", 1);
    let second = m.insert("k", 2);
    assert!(first.is_inserted());
    assert_eq!(second, Insert::Existing(first.handle()));
    assert_eq!(m.len(), 1);
    assert_eq!(m["k"], 1);
}

// Test: iteration order equals insertion order across several rebuilds,
// and removals keep the relative order of the survivors.
#[test]
fn iteration_follows_insertion_order() {
    // Distinct, scattered keys: 7919 is invertible mod the prime 1009.
    let keys: Vec<u64> = (0..200u64).map(|i| (i * 7919) % 1009).collect();
    let mut m = ProbeHashMap::new();
    for (i, &k) in keys.iter().enumerate() {
        m.insert(k, i);
    }
    assert!(m.iter().map(|(k, _)| *k).eq(keys.iter().copied()));
    assert!(m.values().copied().eq(0..200));

    for k in keys.iter().step_by(3) {
        m.remove(k);
    }
    let expected: Vec<u64> = keys
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 3 != 0)
        .map(|(_, k)| *k)
        .collect();
    assert_eq!(m.keys().copied().collect::<Vec<_>>(), expected);

    // Re-inserting a removed key appends it at the end.
    m.insert(keys[0], 999);
    assert_eq!(m.keys().last(), Some(&keys[0]));
}

// Test: erasing all but one element of a large map.
// Verifies: capacity never drops below the floor, the survivor is findable.
#[test]
fn shrink_stops_at_floor() {
    let mut m = ProbeHashMap::new();
    for k in 0..1_000 {
        m.insert(k, k.to_string());
    }
    let grown = m.capacity();
    assert!(grown >= 2_000);
    for k in 1..1_000 {
        m.remove(&k);
        assert!(m.capacity() >= 5);
    }
    assert_eq!(m.len(), 1);
    assert_eq!(m.capacity(), 5);
    assert_eq!(m.get(&0).map(String::as_str), Some("0"));

    // Removing the last element does not touch the index size.
    m.remove(&0);
    assert!(m.is_empty());
    assert_eq!(m.capacity(), 5);
}

// Test: `at` reports absence as an error; `Index` panics.
#[test]
fn at_reports_key_not_found() {
    let mut m: ProbeHashMap<String, i32> = [("a".to_string(), 1)].into();
    assert_eq!(m.at("a"), Ok(&1));
    assert_eq!(m.at("b"), Err(KeyNotFound));
    *m.at_mut("a").unwrap() = 5;
    assert_eq!(m.at_mut("b"), Err(KeyNotFound));
    assert_eq!(m["a"], 5);
    assert_eq!(KeyNotFound.to_string(), "key not found in map");
    // `at` never inserts.
    assert_eq!(m.len(), 1);
}

#[test]
#[should_panic(expected = "key not found")]
fn index_panics_on_missing_key() {
    let m: ProbeHashMap<&str, i32> = ProbeHashMap::new();
    let _v: i32 = m["missing"];
}

// Test: constructors from ranges and literal lists keep the first value of a
// duplicated key and the order of first appearance.
#[test]
fn constructors_from_pairs() {
    let m = ProbeHashMap::from([("x", 1), ("y", 2), ("x", 3)]);
    assert_eq!(m.len(), 2);
    assert_eq!(m["x"], 1);
    assert_eq!(m.keys().copied().collect::<Vec<_>>(), vec!["x", "y"]);

    let pairs = vec![(3, 'c'), (1, 'a'), (2, 'b')];
    let from_range: ProbeHashMap<i32, char> = pairs.iter().copied().collect();
    assert_eq!(from_range.values().collect::<String>(), "cab");

    type Fixed = BuildHasherDefault<DefaultHasher>;
    let with_hasher = ProbeHashMap::from_iter_with_hasher(pairs.clone(), Fixed::default());
    let expected: ProbeHashMap<i32, char, Fixed> = from_range.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(with_hasher, expected);

    let mut extended: ProbeHashMap<i32, char> = ProbeHashMap::new();
    extended.extend(pairs);
    extended.extend([(4, 'd'), (1, 'z')]);
    assert_eq!(extended.len(), 4);
    assert_eq!(extended[&1], 'a');
}

// Test: `clone_from` replaces content, policy and hasher of the target.
#[test]
fn assign_replaces_target() {
    let policy = LoadPolicy {
        start_capacity: 13,
        ..LoadPolicy::DEFAULT
    };
    let mut src: ProbeHashMap<u8, u8> = ProbeHashMap::try_with_policy(policy).unwrap();
    src.insert(1, 1);
    src.insert(2, 2);

    let mut dst: ProbeHashMap<u8, u8> = (10..40).map(|k| (k, k)).collect();
    dst.clone_from(&src);
    assert_eq!(dst, src);
    assert_eq!(dst.policy(), policy);
    assert_eq!(dst.capacity(), 13);

    dst.insert(3, 3);
    assert!(!src.contains_key(&3));
}

// Test: mutable and owning iteration keep insertion order.
#[test]
fn mutable_and_owning_iteration() {
    let mut m: ProbeHashMap<&str, i32> = [("a", 1), ("b", 2), ("c", 3)].into();
    m.remove("a");
    m.insert("d", 4);
    for (_, v) in m.iter_mut() {
        *v *= 10;
    }
    for v in m.values_mut() {
        *v += 1;
    }
    for (k, v) in &mut m {
        if *k == "c" {
            *v = 0;
        }
    }
    let collected: Vec<(&str, i32)> = m.into_iter().collect();
    assert_eq!(collected, vec![("b", 21), ("c", 0), ("d", 41)]);
}

// Test: handles stay valid across unrelated removals and rebuilds.
#[test]
fn handles_survive_rebuilds() {
    let mut m: ProbeHashMap<u32, u32> = ProbeHashMap::new();
    let keep = m.insert(7, 70).handle();
    for k in 100..400 {
        m.insert(k, k);
    }
    for k in 100..400 {
        m.remove(&k);
    }
    assert_eq!(keep.key(&m), Some(&7));
    *keep.value_mut(&mut m).unwrap() += 1;
    assert_eq!(m.get(&7), Some(&71));
    assert_eq!(m.first_handle(), Some(keep));
    assert_eq!(m.next_handle(keep), None);
}

#[test]
fn clear_then_reuse() {
    let mut m: ProbeHashMap<u32, u32> = (0..64).map(|k| (k, k)).collect();
    let h = m.find(&3).unwrap();
    m.clear();
    assert!(m.is_empty());
    assert_eq!(m.capacity(), 5);
    assert!(h.value(&m).is_none());
    assert!(m.iter().next().is_none());
    m.insert(3, 33);
    assert_eq!(m[&3], 33);
}

#[test]
fn debug_lists_entries_in_order() {
    let m: ProbeHashMap<&str, i32> = [("b", 2), ("a", 1)].into();
    assert_eq!(format!("{:?}", m), r#"{"b": 2, "a": 1}"#);
}

// Test: invalid policies are rejected with descriptive errors.
#[test]
fn policy_errors_are_descriptive() {
    let err = ProbeHashMap::<u8, u8>::try_with_policy(LoadPolicy {
        min_load_inverse: 2,
        ..LoadPolicy::DEFAULT
    })
    .err()
    .unwrap();
    assert_eq!(
        err,
        PolicyError::ThresholdsOverlap {
            min_load_inverse: 2,
            required: 4
        }
    );
    assert_eq!(
        err.to_string(),
        "min_load_inverse 2 must be at least shrink_factor * max_load_inverse (4)"
    );
}

// Test: an oversized growth factor is rejected up front instead of
// overflowing the index allocation on the first grow.
#[test]
fn oversized_growth_factor_rejected() {
    let err = ProbeHashMap::<u8, u8>::try_with_policy(LoadPolicy {
        growth_factor: usize::MAX,
        ..LoadPolicy::DEFAULT
    })
    .err();
    assert_eq!(
        err,
        Some(PolicyError::GrowthTooLarge {
            got: usize::MAX,
            max: LoadPolicy::MAX_GROWTH_FACTOR
        })
    );

    let mut m: ProbeHashMap<u8, u8> = ProbeHashMap::try_with_policy(LoadPolicy {
        growth_factor: LoadPolicy::MAX_GROWTH_FACTOR,
        ..LoadPolicy::DEFAULT
    })
    .unwrap();
    for k in 0..3 {
        m.insert(k, k);
    }
    assert_eq!(m.capacity(), 5 * 64 + 1);
}

// Test: a map can be shared across threads behind a lock.
#[test]
fn shared_behind_mutex() {
    use std::sync::{Arc, Mutex};
    use std::thread;

    let shared = Arc::new(Mutex::new(ProbeHashMap::new()));
    let workers: Vec<_> = (0..4u32)
        .map(|t| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for i in 0..50 {
                    shared.lock().unwrap().insert(t * 1_000 + i, i);
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }
    assert_eq!(shared.lock().unwrap().len(), 200);
}
