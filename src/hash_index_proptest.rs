#![cfg(test)]

// Property tests for the hashed containers: model equivalence, bucket
// bookkeeping and contiguity of equal keys.

use crate::cursor::{Container, Cursor};
use crate::hash_map::{HashMap, HashMultiMap};
use crate::hash_set::HashSet;
use proptest::prelude::*;
use std::collections::HashMap as StdHashMap;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct Key(String);

impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Assign(usize, i32),
    EraseKey(usize),
    EraseAt(usize),
    Find(usize),
    Reserve(u16),
    MaxLoad(u8),
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=10).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Assign(i, v)),
            1 => idx.clone().prop_map(Op::EraseKey),
            1 => any::<usize>().prop_map(Op::EraseAt),
            2 => idx.prop_map(Op::Find),
            1 => any::<u16>().prop_map(|n| Op::Reserve(n % 300)),
            1 => (1u8..=40).prop_map(Op::MaxLoad),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn nth<C: Container>(c: &C, i: usize) -> Cursor {
    let n = i % (c.node_store().len() + 1);
    let mut cur = c.begin();
    for _ in 0..n {
        cur = cur.next(c);
    }
    cur
}

fn check_buckets<K, V, S>(sut: &HashMap<K, V, S>) -> Result<(), TestCaseError>
where
    K: std::hash::Hash + Eq,
    S: BuildHasher,
{
    let mut total = 0;
    for i in 0..sut.bucket_count() {
        let members: Vec<Cursor> = sut.bucket_cursors(i).unwrap().collect();
        prop_assert_eq!(members.len(), sut.bucket_size(i).unwrap());
        for c in members {
            let k = c.key(sut).unwrap();
            prop_assert_eq!(sut.bucket(k), i);
        }
        total += sut.bucket_size(i).unwrap();
    }
    prop_assert_eq!(total, sut.len());
    prop_assert!(sut.load_factor() <= sut.max_load_factor());
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// - insert keeps the first value; insert_or_assign overwrites;
// - iteration order is first-insertion order of the live keys;
// - every bucket holds exactly bucket_size(i) entries hashing to i;
// - the load factor never exceeds its maximum after an insert.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_unique_map_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: HashMap<Key, i32> = HashMap::new();
        let mut model: StdHashMap<Key, i32> = StdHashMap::new();
        let mut order: Vec<Key> = Vec::new();

        for op in ops {
            match op {
                Op::Insert(i, v) => {
                    let k = Key(pool[i].clone());
                    let (c, fresh) = sut.insert(k.clone(), v);
                    prop_assert_eq!(fresh, !model.contains_key(&k));
                    if fresh {
                        model.insert(k.clone(), v);
                        order.push(k.clone());
                    }
                    prop_assert_eq!(c.value(&sut), model.get(&k));
                }
                Op::Assign(i, v) => {
                    let k = Key(pool[i].clone());
                    let (_, fresh) = sut.insert_or_assign(k.clone(), v);
                    if fresh {
                        order.push(k.clone());
                    }
                    model.insert(k, v);
                }
                Op::EraseKey(i) => {
                    let gone = sut.erase_key(pool[i].as_str());
                    let k = Key(pool[i].clone());
                    prop_assert_eq!(gone, usize::from(model.remove(&k).is_some()));
                    order.retain(|o| *o != k);
                }
                Op::EraseAt(i) => {
                    let c = nth(&sut, i);
                    match c.key(&sut).cloned() {
                        Some(k) => {
                            sut.erase(c).unwrap();
                            model.remove(&k);
                            order.retain(|o| *o != k);
                            prop_assert!(!c.is_valid(&sut));
                        }
                        None => prop_assert!(sut.erase(c).is_err()),
                    }
                }
                Op::Find(i) => {
                    let c = sut.find(pool[i].as_str());
                    prop_assert_eq!(c.value(&sut), model.get(&Key(pool[i].clone())));
                }
                Op::Reserve(n) => {
                    let before = sut.bucket_count();
                    sut.reserve(n as usize).unwrap();
                    prop_assert!(sut.bucket_count() >= before);
                    prop_assert!(sut.len() as f64 / sut.bucket_count() as f64 <= sut.max_load_factor());
                }
                Op::MaxLoad(z) => {
                    sut.set_max_load_factor(z as f64 / 10.0).unwrap();
                }
            }
            let keys: Vec<&Key> = sut.keys().collect();
            prop_assert_eq!(keys, order.iter().collect::<Vec<_>>());
            check_buckets(&sut)?;
        }
    }
}

// Property: a multimap keeps equal keys adjacent, each run in insertion
// order, and `equal_range` spans exactly the run. Hinted inserts at any
// position, including the middle of a run, keep that true.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_multimap_runs_are_contiguous(
        ops in proptest::collection::vec((0u8..6, 0u8..8, any::<usize>()), 1..150)
    ) {
        let mut sut: HashMultiMap<u8, usize> = HashMultiMap::new();
        let mut model: StdHashMap<u8, Vec<usize>> = StdHashMap::new();
        for (step, (kind, k, at)) in ops.into_iter().enumerate() {
            if kind == 0 {
                prop_assert_eq!(sut.erase_key(&k), model.remove(&k).map_or(0, |vs| vs.len()));
            } else if kind <= 2 {
                let hint = nth(&sut, at);
                let c = sut.emplace_hint(hint, k, step).unwrap();
                prop_assert_eq!(c.entry(&sut), Some((&k, &step)));
                model.entry(k).or_default().push(step);
            } else {
                sut.insert(k, step);
                model.entry(k).or_default().push(step);
            }
            for (k, vs) in &model {
                let (lo, hi) = sut.equal_range(k);
                let run: Vec<usize> = sut.node_store().range(lo, hi).unwrap().map(|(_, v)| *v).collect();
                prop_assert_eq!(&run, vs);
                prop_assert_eq!(sut.count(k), vs.len());
            }
            prop_assert_eq!(sut.len(), model.values().map(Vec::len).sum::<usize>());
            if let Err(e) = sut.check_invariants() {
                return Err(TestCaseError::fail(e));
            }
        }
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

// Property: with every key in one bucket, lookups still resolve by `Eq`
// and growth still happens by entry count.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_const_hasher_set(keys in proptest::collection::vec(0u16..200, 0..120)) {
        let mut sut: HashSet<u16, ConstBuildHasher> = HashSet::with_hasher(ConstBuildHasher);
        let mut seen = std::collections::HashSet::new();
        for k in &keys {
            let (_, fresh) = sut.insert(*k);
            prop_assert_eq!(fresh, seen.insert(*k));
        }
        prop_assert_eq!(sut.len(), seen.len());
        prop_assert_eq!(sut.bucket_size(0).unwrap(), seen.len());
        for k in 0u16..200 {
            prop_assert_eq!(sut.contains(&k), seen.contains(&k));
        }
        if let Err(e) = sut.check_invariants() {
            return Err(TestCaseError::fail(e));
        }
    }
}
