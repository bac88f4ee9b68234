#![cfg(test)]

// Property tests for the ordered containers, kept inside the crate so they
// can call the structural invariant checks.

use crate::cursor::{Container, Cursor};
use crate::tree_map::{TreeMap, TreeMultiMap};
use crate::tree_set::TreeMultiSet;
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(i16, u32),
    InsertHint(usize, i16, u32),
    EraseAt(usize),
    EraseKey(i16),
    EraseRange(usize, usize),
    ExtractKey(i16),
    Bounds(i16),
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    // A narrow key range forces plenty of duplicates and misses.
    let key = -20i16..20;
    let op = prop_oneof![
        4 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => (any::<usize>(), key.clone(), any::<u32>()).prop_map(|(h, k, v)| Op::InsertHint(h, k, v)),
        1 => any::<usize>().prop_map(Op::EraseAt),
        1 => key.clone().prop_map(Op::EraseKey),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::EraseRange(a, b)),
        1 => key.clone().prop_map(Op::ExtractKey),
        1 => key.prop_map(Op::Bounds),
    ];
    proptest::collection::vec(op, 1..120)
}

/// Cursor of the `i % (len + 1)`-th position, the end sentinel included.
fn nth<C: Container>(c: &C, i: usize) -> Cursor {
    let n = i % (c.node_store().len() + 1);
    let mut cur = c.begin();
    for _ in 0..n {
        cur = cur.next(c);
    }
    cur
}

fn flatten(model: &BTreeMap<i16, Vec<u32>>) -> Vec<(i16, u32)> {
    model
        .iter()
        .flat_map(|(k, vs)| vs.iter().map(move |v| (*k, *v)))
        .collect()
}

// Property: a multimap behaves like `BTreeMap<K, Vec<V>>` where each Vec
// is in insertion order, and stays a valid red-black tree throughout.
// - insert, hinted insert, erase by cursor, key or range all agree with
//   the model;
// - lower/upper bound bracket exactly the entries of a key;
// - erased cursors never resolve again.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_multimap_matches_model(ops in arb_ops()) {
        let mut sut: TreeMultiMap<i16, u32> = TreeMultiMap::new();
        let mut model: BTreeMap<i16, Vec<u32>> = BTreeMap::new();
        let mut stale: Vec<Cursor> = Vec::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let c = sut.insert(k, v);
                    prop_assert_eq!(c.entry(&sut), Some((&k, &v)));
                    model.entry(k).or_default().push(v);
                }
                Op::InsertHint(h, k, v) => {
                    let hint = nth(&sut, h);
                    let c = sut.emplace_hint(hint, k, v).unwrap();
                    prop_assert_eq!(c.key(&sut), Some(&k));
                    model.entry(k).or_default().push(v);
                }
                Op::EraseAt(i) => {
                    let c = nth(&sut, i);
                    if let Some((&k, &v)) = c.entry(&sut) {
                        sut.erase(c).unwrap();
                        let vs = model.get_mut(&k).unwrap();
                        let at = vs.iter().position(|x| *x == v).unwrap();
                        vs.remove(at);
                        if vs.is_empty() {
                            model.remove(&k);
                        }
                        stale.push(c);
                    } else {
                        prop_assert!(sut.erase(c).is_err());
                    }
                }
                Op::EraseKey(k) => {
                    let expect = model.remove(&k).map_or(0, |vs| vs.len());
                    prop_assert_eq!(sut.erase_key(&k), expect);
                }
                Op::EraseRange(a, b) => {
                    let n = sut.len() + 1;
                    let (a, b) = (a % n, b % n);
                    let (first, last) = (nth(&sut, a), nth(&sut, b));
                    if a <= b {
                        sut.erase_range(first, last).unwrap();
                        let mut flat = flatten(&model);
                        flat.drain(a..b);
                        model.clear();
                        for (k, v) in flat {
                            model.entry(k).or_default().push(v);
                        }
                    } else {
                        prop_assert!(sut.erase_range(first, last).is_err());
                    }
                }
                Op::ExtractKey(k) => {
                    let got = sut.extract_key(&k);
                    let want = match model.get_mut(&k) {
                        Some(vs) => {
                            let v = vs.remove(0);
                            if vs.is_empty() {
                                model.remove(&k);
                            }
                            Some((k, v))
                        }
                        None => None,
                    };
                    prop_assert_eq!(got, want);
                }
                Op::Bounds(k) => {
                    let (lo, hi) = sut.equal_range(&k);
                    let got: Vec<u32> = sut.range(lo, hi).unwrap().map(|(_, v)| *v).collect();
                    let want = model.get(&k).cloned().unwrap_or_default();
                    prop_assert_eq!(got, want);
                    prop_assert_eq!(sut.count(&k), model.get(&k).map_or(0, |vs| vs.len()));
                }
            }

            let got: Vec<(i16, u32)> = sut.iter().map(|(k, v)| (*k, *v)).collect();
            prop_assert_eq!(got, flatten(&model));
            for &c in &stale {
                prop_assert!(!c.is_valid(&sut));
            }
            if let Err(e) = sut.check_invariants() {
                return Err(TestCaseError::fail(e));
            }
        }
    }
}

// Property: a unique map never holds two equivalent keys, keeps the first
// value on a duplicate insert, and matches `BTreeMap` after any sequence of
// inserts, assigns and erases.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_unique_map_matches_btreemap(
        ops in proptest::collection::vec((0u8..4, -30i32..30, any::<u8>()), 1..150)
    ) {
        let mut sut: TreeMap<i32, u8> = TreeMap::new();
        let mut model: BTreeMap<i32, u8> = BTreeMap::new();
        for (kind, k, v) in ops {
            match kind {
                0 => {
                    let (_, fresh) = sut.insert(k, v);
                    prop_assert_eq!(fresh, !model.contains_key(&k));
                    model.entry(k).or_insert(v);
                }
                1 => {
                    sut.insert_or_assign(k, v);
                    model.insert(k, v);
                }
                2 => {
                    prop_assert_eq!(sut.erase_key(&k), usize::from(model.remove(&k).is_some()));
                }
                _ => {
                    prop_assert_eq!(sut.get(&k).ok(), model.get(&k));
                }
            }
            prop_assert!(sut.iter().map(|(k, v)| (*k, *v)).eq(model.iter().map(|(k, v)| (*k, *v))));
            if let Err(e) = sut.check_invariants() {
                return Err(TestCaseError::fail(e));
            }
        }
    }
}

// Property: ascending, descending and shuffled fills all produce a valid
// tree whose height stays within the red-black bound.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_fill_patterns_stay_balanced(
        keys in proptest::collection::vec(0u16..500, 0..400),
        descending in any::<bool>()
    ) {
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        if descending {
            sorted.reverse();
        }
        for input in [keys, sorted] {
            let set: TreeMultiSet<u16> = input.iter().copied().collect();
            prop_assert_eq!(set.len(), input.len());
            if let Err(e) = set.check_invariants() {
                return Err(TestCaseError::fail(e));
            }
            let mut want = input.clone();
            want.sort_unstable();
            prop_assert!(set.iter().copied().eq(want));
        }
    }
}
