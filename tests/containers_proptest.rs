// Property tests across container kinds, using only the public API.
//
// Invariants exercised:
// - Ordered and hashed containers fed the same operations hold the same
//   key multiset.
// - A tree set iterates exactly like `BTreeSet`.
// - Cursors into erased entries never resolve again and are rejected by
//   erase; cursors into live entries keep reading the same key.
use assoc_collections::{Container, Cursor, Error, HashMultiSet, HashSet, TreeMultiSet, TreeSet};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn counts<C>(c: &C) -> BTreeMap<u8, usize>
where
    C: Container<Key = u8>,
{
    let mut out = BTreeMap::new();
    for k in c.node_store().keys() {
        *out.entry(*k).or_default() += 1;
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_tree_and_hash_agree(ops in proptest::collection::vec((any::<bool>(), 0u8..16), 1..200)) {
        let mut tree: TreeMultiSet<u8> = TreeMultiSet::new();
        let mut hash: HashMultiSet<u8> = HashMultiSet::new();
        let mut tree_u: TreeSet<u8> = TreeSet::new();
        let mut hash_u: HashSet<u8> = HashSet::new();
        for (insert, k) in ops {
            if insert {
                tree.insert(k);
                hash.insert(k);
                let (_, a) = tree_u.insert(k);
                let (_, b) = hash_u.insert(k);
                prop_assert_eq!(a, b);
            } else {
                prop_assert_eq!(tree.erase_key(&k), hash.erase_key(&k));
                prop_assert_eq!(tree_u.erase_key(&k), hash_u.erase_key(&k));
            }
            prop_assert_eq!(counts(&tree), counts(&hash));
            prop_assert_eq!(counts(&tree_u), counts(&hash_u));
            for (k, n) in counts(&tree) {
                prop_assert_eq!(tree.count(&k), n);
                prop_assert_eq!(hash.count(&k), n);
            }
        }
    }

    #[test]
    fn prop_tree_set_iterates_like_btreeset(keys in proptest::collection::vec(any::<i64>(), 0..300)) {
        let sut: TreeSet<i64> = keys.iter().copied().collect();
        let model: BTreeSet<i64> = keys.iter().copied().collect();
        prop_assert!(sut.iter().eq(model.iter()));
        let mut back = Vec::new();
        let mut r = sut.rbegin();
        while r != sut.rend() {
            back.push(*r.key(&sut).unwrap());
            r = r.next(&sut);
        }
        prop_assert!(back.into_iter().eq(model.iter().rev().copied()));
    }

    #[test]
    fn prop_stale_cursors_stay_dead(
        keys in proptest::collection::btree_set(0u32..1000, 1..80),
        erase_mask in proptest::collection::vec(any::<bool>(), 80)
    ) {
        let mut set: HashSet<u32> = keys.iter().copied().collect();
        let cursors: Vec<(u32, Cursor)> = keys.iter().map(|&k| (k, set.find(&k))).collect();
        let mut dead = Vec::new();
        for (i, &(k, c)) in cursors.iter().enumerate() {
            if erase_mask[i] {
                set.erase(c).unwrap();
                dead.push(c);
            } else {
                prop_assert_eq!(c.key(&set), Some(&k));
            }
        }
        // Refill so erased slots get reused.
        set.extend(2000..2100);
        for c in dead {
            prop_assert!(c.key(&set).is_none());
            prop_assert!(matches!(set.erase(c), Err(Error::InvalidPosition(_))));
        }
        for (i, &(k, c)) in cursors.iter().enumerate() {
            if !erase_mask[i] {
                prop_assert_eq!(c.key(&set), Some(&k));
            }
        }
    }
}
