// ProbeHashMap property tests over the public API.
//
// Property 1: order and content match an insertion-ordered model.
//  - Model: Vec<(key, value)> in insertion order; insert appends only when
//    the key is absent, erase removes in place.
//  - Invariant: iter() == model after every op; len() == model.len().
//
// Property 2: load-factor bounds and shrink floor.
//  - Invariant: after every op, len * 2 <= capacity and capacity >= 5.
//  - Invariant: erase on a map left empty never changes capacity.
//
// Property 3: clone independence.
//  - Mutating a clone never changes the original's iteration output.
use probe_hashmap::ProbeHashMap;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, u32),
    Erase(u16),
    IndexAssign(u16, u32),
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    // A narrow key range keeps collisions and re-inserts frequent.
    let key = 0u16..64;
    proptest::collection::vec(
        prop_oneof![
            3 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
            2 => key.clone().prop_map(Op::Erase),
            1 => (key, any::<u32>()).prop_map(|(k, v)| Op::IndexAssign(k, v)),
        ],
        1..300,
    )
}

fn apply(model: &mut Vec<(u16, u32)>, op: &Op) {
    match *op {
        Op::Insert(k, v) => {
            if !model.iter().any(|(mk, _)| *mk == k) {
                model.push((k, v));
            }
        }
        Op::Erase(k) => model.retain(|(mk, _)| *mk != k),
        Op::IndexAssign(k, v) => match model.iter_mut().find(|(mk, _)| *mk == k) {
            Some(slot) => slot.1 = v,
            None => model.push((k, v)),
        },
    }
}

fn run(m: &mut ProbeHashMap<u16, u32>, op: &Op) {
    match *op {
        Op::Insert(k, v) => {
            m.insert(k, v);
        }
        Op::Erase(k) => {
            m.remove(&k);
        }
        Op::IndexAssign(k, v) => *m.get_or_default(k) = v,
    }
}

proptest! {
    #[test]
    fn prop_matches_ordered_model(ops in arb_ops()) {
        let mut m = ProbeHashMap::new();
        let mut model: Vec<(u16, u32)> = Vec::new();
        for op in &ops {
            run(&mut m, op);
            apply(&mut model, op);
            let got: Vec<(u16, u32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
            prop_assert_eq!(&got, &model);
            prop_assert_eq!(m.len(), model.len());
        }
    }

    #[test]
    fn prop_load_bounds(ops in arb_ops()) {
        let mut m = ProbeHashMap::new();
        for op in &ops {
            let before = m.capacity();
            run(&mut m, op);
            prop_assert!(m.len() * 2 <= m.capacity(), "len {} capacity {}", m.len(), m.capacity());
            prop_assert!(m.capacity() >= 5);
            if m.is_empty() {
                if let Op::Erase(_) = op {
                    prop_assert_eq!(m.capacity(), before);
                }
            }
        }
    }

    #[test]
    fn prop_clone_is_independent(ops in arb_ops(), extra in proptest::collection::vec(0u16..64, 1..20)) {
        let mut m = ProbeHashMap::new();
        for op in &ops {
            run(&mut m, op);
        }
        let snapshot: Vec<(u16, u32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        let mut copy = m.clone();
        prop_assert!(copy == m);
        for k in extra {
            if copy.remove(&k).is_none() {
                copy.insert(k, u32::MAX);
            }
        }
        *copy.get_or_default(1_000) += 1;
        let after: Vec<(u16, u32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(after, snapshot);
    }
}
