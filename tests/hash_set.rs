// HashSet / HashMultiSet integration tests.
//
// The core properties exercised:
// - Cursors stay valid when other entries are erased or buckets move.
// - Bucket queries: bucket_cursors(i) is exactly the bucket's membership.
// - Multisets count, extract and erase equal keys as one run.
use assoc_collections::{Container, Error, HashMultiSet, HashSet, LocalCursor};
use std::hash::{BuildHasher, Hasher};

// Test: a cursor to "a" while "b" is erased.
// Verifies: the cursor still reads "a" and equals a fresh find("a").
#[test]
fn cursor_survives_neighbor_erase() {
    let mut s: HashSet<String> = HashSet::new();
    s.insert("a".to_string());
    s.insert("b".to_string());
    let it = s.find("a");
    assert_eq!(s.erase_key("b"), 1);
    assert_eq!(it.key(&s).map(String::as_str), Some("a"));
    assert_eq!(it, s.find("a"));
}

// Test: bucket membership after growth.
// Verifies: every bucket lists bucket_size(i) cursors, each of which lands
// in bucket i, and the sizes add up to len().
#[test]
fn bucket_cursors_match_sizes() {
    let s: HashSet<u32> = (0..500).collect();
    let mut total = 0;
    for i in 0..s.bucket_count() {
        let members: Vec<_> = s.bucket_cursors(i).unwrap().collect();
        assert_eq!(members.len(), s.bucket_size(i).unwrap());
        for c in &members {
            assert_eq!(s.bucket(c.key(&s).unwrap()), i);
        }
        total += members.len();
    }
    assert_eq!(total, 500);
    assert!(matches!(
        s.bucket_size(s.bucket_count()),
        Err(Error::OutOfRange(_))
    ));
}

// Test: walking each bucket from begin_bucket(i) to end_bucket(i).
// Verifies: the walk visits the same cursors as bucket_cursors(i), in the
// same order; bucket indices past bucket_count() are OutOfRange; a local
// cursor read against another set resolves to nothing.
#[test]
fn local_cursors_walk_a_bucket() {
    let s: HashSet<u32> = (0..64).collect();
    for i in 0..s.bucket_count() {
        let mut walked = Vec::new();
        let mut lc: LocalCursor = s.begin_bucket(i).unwrap();
        let end = s.end_bucket(i).unwrap();
        while lc != end {
            walked.push(lc.cursor(&s).unwrap());
            lc = lc.next();
        }
        assert_eq!(lc.key(&s), None);
        let listed: Vec<_> = s.bucket_cursors(i).unwrap().collect();
        assert_eq!(walked, listed);
        if let Some(&last) = walked.last() {
            assert_eq!(end.prev().cursor(&s), Some(last));
        }
    }
    let n = s.bucket_count();
    assert!(matches!(s.begin_bucket(n), Err(Error::OutOfRange(_))));
    assert!(matches!(s.end_bucket(n), Err(Error::OutOfRange(_))));

    let home = s.bucket(&7);
    let other: HashSet<u32> = (0..64).collect();
    let lc = s.begin_bucket(home).unwrap();
    assert!(lc.key(&s).is_some());
    assert_eq!(lc.cursor(&other), None);
}

// Test: multiset runs.
// Verifies: count, equal_range, extract_key and erase_key over repeats.
#[test]
fn multiset_repeats() {
    let mut s: HashMultiSet<&str> = ["x", "y", "x", "z", "x"].into_iter().collect();
    assert_eq!(s.len(), 5);
    assert_eq!(s.count("x"), 3);
    let (lo, hi) = s.equal_range("x");
    assert_eq!(s.node_store().range(lo, hi).unwrap().count(), 3);
    assert_eq!(s.extract_key("x"), Some("x"));
    assert_eq!(s.erase_key("x"), 2);
    assert_eq!(s.count("x"), 0);
    assert_eq!(s.equal_range("x"), (s.end(), s.end()));
}

// Test: erase by cursor range in insertion order.
// Verifies: the range is the list order; a reversed range is rejected
// without touching anything.
#[test]
fn erase_range_in_list_order() {
    let mut s: HashSet<i32> = [4, 8, 15, 16, 23, 42].into_iter().collect();
    let (a, b) = (s.find(&15), s.find(&42));
    assert!(matches!(s.erase_range(b, a), Err(Error::InvalidRange(_))));
    assert_eq!(s.len(), 6);
    s.erase_range(a, b).unwrap();
    let rest: Vec<i32> = s.iter().copied().collect();
    assert_eq!(rest, vec![4, 8, 42]);
}

#[derive(Clone, Default)]
struct Mod4;
struct Mod4Hasher(u64);

impl BuildHasher for Mod4 {
    type Hasher = Mod4Hasher;
    fn build_hasher(&self) -> Mod4Hasher {
        Mod4Hasher(0)
    }
}

impl Hasher for Mod4Hasher {
    fn write(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = self.0.wrapping_add(*b as u64);
        }
    }
    fn finish(&self) -> u64 {
        self.0 % 4
    }
}

// Test: heavy collisions with a custom hasher.
// Verifies: hash_function is the one supplied, lookups resolve through
// Eq, and removal from a shared bucket leaves its neighbors.
#[test]
fn colliding_hasher() {
    let mut s: HashSet<u8, Mod4> = HashSet::with_hasher(Mod4);
    for k in 0..40u8 {
        s.insert(k);
    }
    let _: &Mod4 = s.hash_function();
    assert!(s.bucket_count() >= 40);
    assert_eq!(s.erase_key(&8), 1);
    for k in 0..40u8 {
        assert_eq!(s.contains(&k), k != 8);
    }
}

// Test: containers move across threads.
// Verifies: a filled set is Send and still usable on the other side.
#[test]
fn sets_are_send() {
    fn assert_send<T: Send>(_: &T) {}
    let s: HashSet<u64> = (0..10).collect();
    assert_send(&s);
    let handle = std::thread::spawn(move || s.len());
    assert_eq!(handle.join().unwrap(), 10);
}
