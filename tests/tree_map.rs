// TreeMap / TreeMultiMap integration tests.
//
// The core properties exercised:
// - Unique maps: insert never overwrites, insert_or_assign does, get of a
//   missing key is OutOfRange.
// - Erasure of every node shape keeps the remaining keys reachable.
// - Multimaps keep the values of one key in insertion order.
use assoc_collections::{Container, Error, TreeMap, TreeMultiMap};

// Test: erase a key from a three-entry map.
// Verifies: size drops to 2, the key is gone, its neighbors still resolve.
#[test]
fn erase_middle_key() {
    let mut m: TreeMap<i32, &str> = [(1, "a"), (2, "b"), (3, "c")].into_iter().collect();
    assert_eq!(m.erase_key(&2), 1);
    assert_eq!(m.len(), 2);
    assert_eq!(m.find(&2), m.end());
    assert_eq!(m.find(&1).value(&m), Some(&"a"));
    assert_eq!(m.find(&3).value(&m), Some(&"c"));
}

// Test: erase root, leaves and inner nodes of a larger map.
// Verifies: every surviving key is still found with its own value.
#[test]
fn erase_every_shape() {
    let mut m: TreeMap<u32, u32> = (0..64).map(|k| (k, k * 10)).collect();
    for k in [31, 0, 63, 15, 47, 32, 30, 1] {
        assert_eq!(m.erase_key(&k), 1);
    }
    for k in 0..64 {
        let gone = [31, 0, 63, 15, 47, 32, 30, 1].contains(&k);
        let want = if gone { None } else { Some(k * 10) };
        assert_eq!(m.get(&k).ok().copied(), want);
    }
    assert_eq!(m.len(), 56);
}

// Test: get / get_mut / set / insert_or_assign.
// Verifies: assignment semantics and the OutOfRange error.
#[test]
fn get_and_assign() {
    let mut m: TreeMap<String, u32> = TreeMap::new();
    assert_eq!(m.get("x"), Err(Error::OutOfRange("key not present in map")));
    m.set("x".into(), 1);
    let (_, fresh) = m.insert("x".into(), 2);
    assert!(!fresh);
    assert_eq!(m.get("x"), Ok(&1));
    let (pos, fresh) = m.insert_or_assign("x".into(), 3);
    assert!(!fresh);
    assert_eq!(pos.value(&m), Some(&3));
    *m.get_mut("x").unwrap() += 1;
    assert_eq!(m.get("x"), Ok(&4));
    assert!(m.get_mut("y").is_err());
}

// Test: value_mut through a cursor.
// Verifies: values change in place; keys and order do not.
#[test]
fn value_mut_through_cursor() {
    let mut m: TreeMap<i32, Vec<i32>> = TreeMap::new();
    m.insert(2, vec![]);
    m.insert(1, vec![]);
    let mut c = m.begin();
    while c != m.end() {
        let k = *c.key(&m).unwrap();
        m.value_mut(c).unwrap().push(k * k);
        c = c.next(&m);
    }
    let flat: Vec<(i32, Vec<i32>)> = m.iter().map(|(k, v)| (*k, v.clone())).collect();
    assert_eq!(flat, vec![(1, vec![1]), (2, vec![4])]);
}

// Test: multimap value order.
// Verifies: equal_range yields values in insertion order; hinted inserts
// that would break the order are placed by key instead.
#[test]
fn multimap_equal_range_order() {
    let mut m: TreeMultiMap<&str, i32> = TreeMultiMap::new();
    m.insert("b", 1);
    m.insert("a", 0);
    m.insert("b", 2);
    let hint = m.begin();
    m.emplace_hint(hint, "b", 3).unwrap();
    let (lo, hi) = m.equal_range("b");
    let vals: Vec<i32> = m.range(lo, hi).unwrap().map(|(_, v)| *v).collect();
    assert_eq!(vals, vec![1, 2, 3]);
    assert_eq!(m.count("b"), 3);
    assert_eq!(m.erase_key("b"), 3);
    assert_eq!(m.len(), 1);
}

// Test: swap.
// Verifies: contents exchange and outstanding cursors follow their entry.
#[test]
fn swap_exchanges_state() {
    let mut a: TreeMap<i32, i32> = [(1, 1)].into_iter().collect();
    let mut b: TreeMap<i32, i32> = [(2, 2), (3, 3)].into_iter().collect();
    let three = b.find(&3);
    a.swap(&mut b);
    assert_eq!(a.len(), 2);
    assert_eq!(three.entry(&a), Some((&3, &3)));
    assert!(!three.is_valid(&b));
}

// Test: Debug output.
// Verifies: maps print in key order like std maps do.
#[test]
fn debug_is_map_shaped() {
    let m: TreeMap<i32, char> = [(2, 'b'), (1, 'a')].into_iter().collect();
    assert_eq!(format!("{m:?}"), "{1: 'a', 2: 'b'}");
}
