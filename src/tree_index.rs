//! TreeIndex: a red-black tree over `NodeStore` entries.
//!
//! Tree nodes live in their own arena and carry only the `EntryKey` of the
//! entry they order; keys are read back from the store for comparisons. A
//! `SecondaryMap` maps each entry to its node so erase and hinted insert
//! start from a known position without searching.
//!
//! The tree's in-order sequence always equals the store's list order. The
//! containers keep it that way by linking a new entry into the list at the
//! position the tree will give it.
//!
//! Invariants after every public call:
//! 1. every node is red or black;
//! 2. the root is black;
//! 3. absent children count as black;
//! 4. a red node has no red child;
//! 5. every root-to-leaf path crosses the same number of black nodes.

use crate::compare::Compare;
use crate::node_store::{EntryKey, NodeStore};
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use slotmap::{new_key_type, SecondaryMap, SlotMap};

new_key_type! {
    pub(crate) struct NodeKey;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Clone, Debug)]
struct TreeNode {
    entry: EntryKey,
    color: Color,
    parent: Option<NodeKey>,
    left: Option<NodeKey>,
    right: Option<NodeKey>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct TreeIndex {
    nodes: SlotMap<NodeKey, TreeNode>,
    by_entry: SecondaryMap<EntryKey, NodeKey>,
    root: Option<NodeKey>,
    reentrancy: DebugReentrancy,
}

impl TreeIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.by_entry.clear();
        self.root = None;
    }

    // ---- lookups (call the comparator) -----------------------------------

    /// The node matching `key`, or the last node visited on the search path
    /// when nothing matches. Among equivalent keys the leftmost is returned.
    pub(crate) fn find_nearest<K, V, C, Q>(
        &self,
        store: &NodeStore<K, V>,
        comp: &C,
        key: &Q,
    ) -> Option<EntryKey>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let _g = self.reentrancy.enter();
        let mut cur = self.root?;
        let mut matched = None;
        loop {
            let node = &self.nodes[cur];
            let k: &Q = store.key_of(node.entry).borrow();
            let step = if comp.less(key, k) {
                node.left
            } else if comp.less(k, key) {
                node.right
            } else {
                matched = Some(cur);
                node.left
            };
            match step {
                Some(n) => cur = n,
                None => break,
            }
        }
        Some(self.nodes[matched.unwrap_or(cur)].entry)
    }

    /// First entry whose key is not less than `key`.
    pub(crate) fn lower_bound<K, V, C, Q>(
        &self,
        store: &NodeStore<K, V>,
        comp: &C,
        key: &Q,
    ) -> Option<EntryKey>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let _g = self.reentrancy.enter();
        let mut cur = self.root;
        let mut best = None;
        while let Some(n) = cur {
            let node = &self.nodes[n];
            let k: &Q = store.key_of(node.entry).borrow();
            if comp.less(k, key) {
                cur = node.right;
            } else {
                best = Some(node.entry);
                cur = node.left;
            }
        }
        best
    }

    /// First entry whose key is greater than `key`.
    pub(crate) fn upper_bound<K, V, C, Q>(
        &self,
        store: &NodeStore<K, V>,
        comp: &C,
        key: &Q,
    ) -> Option<EntryKey>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let _g = self.reentrancy.enter();
        let mut cur = self.root;
        let mut best = None;
        while let Some(n) = cur {
            let node = &self.nodes[n];
            let k: &Q = store.key_of(node.entry).borrow();
            if comp.less(key, k) {
                best = Some(node.entry);
                cur = node.left;
            } else {
                cur = node.right;
            }
        }
        best
    }

    // ---- insertion -------------------------------------------------------

    /// Descend from the root with `precedes(new, existing)`, attach `entry`
    /// as a red leaf and rebalance.
    pub(crate) fn insert<F>(&mut self, entry: EntryKey, mut precedes: F)
    where
        F: FnMut(EntryKey, EntryKey) -> bool,
    {
        let (parent, go_left) = {
            let _g = self.reentrancy.enter();
            let mut parent = None;
            let mut go_left = false;
            let mut cur = self.root;
            while let Some(n) = cur {
                let node = &self.nodes[n];
                parent = Some(n);
                go_left = precedes(entry, node.entry);
                cur = if go_left { node.left } else { node.right };
            }
            (parent, go_left)
        };
        self.attach(entry, parent, go_left);
    }

    /// Attach `entry` as the in-order successor of `prev` (`None` makes it
    /// the first node). No comparisons; the caller guarantees order.
    pub(crate) fn insert_after(&mut self, prev: Option<EntryKey>, entry: EntryKey) {
        let (parent, go_left) = match prev {
            Some(p) => {
                let pn = *self
                    .by_entry
                    .get(p)
                    .expect("predecessor entry must be indexed");
                match self.nodes[pn].right {
                    None => (Some(pn), false),
                    Some(r) => (Some(self.leftmost(r)), true),
                }
            }
            None => match self.root {
                None => (None, false),
                Some(r) => (Some(self.leftmost(r)), true),
            },
        };
        self.attach(entry, parent, go_left);
    }

    fn attach(&mut self, entry: EntryKey, parent: Option<NodeKey>, go_left: bool) {
        let n = self.nodes.insert(TreeNode {
            entry,
            color: Color::Red,
            parent,
            left: None,
            right: None,
        });
        self.by_entry.insert(entry, n);
        match parent {
            None => self.root = Some(n),
            Some(p) if go_left => self.nodes[p].left = Some(n),
            Some(p) => self.nodes[p].right = Some(n),
        }
        self.fix_after_insert(n);
    }

    fn fix_after_insert(&mut self, mut n: NodeKey) {
        loop {
            // New root: paint it black.
            let Some(p) = self.nodes[n].parent else {
                self.nodes[n].color = Color::Black;
                return;
            };
            // Black parent: nothing violated.
            if self.nodes[p].color == Color::Black {
                return;
            }
            let g = self.nodes[p]
                .parent
                .expect("a red node is never the root");
            let p_is_left = self.nodes[g].left == Some(p);
            let u = if p_is_left {
                self.nodes[g].right
            } else {
                self.nodes[g].left
            };

            // Red uncle: push the red up to the grandparent.
            if let Some(u) = u.filter(|&u| self.nodes[u].color == Color::Red) {
                self.nodes[p].color = Color::Black;
                self.nodes[u].color = Color::Black;
                self.nodes[g].color = Color::Red;
                n = g;
                continue;
            }

            // Zig-zag: rotate into zig-zig.
            let mut p = p;
            let n_is_left = self.nodes[p].left == Some(n);
            if p_is_left && !n_is_left {
                self.rotate_left(p);
                p = n;
            } else if !p_is_left && n_is_left {
                self.rotate_right(p);
                p = n;
            }

            // Zig-zig: rotate at the grandparent and swap colors.
            self.nodes[p].color = Color::Black;
            self.nodes[g].color = Color::Red;
            if p_is_left {
                self.rotate_right(g);
            } else {
                self.rotate_left(g);
            }
            return;
        }
    }

    // ---- erase -----------------------------------------------------------

    /// Remove `entry`'s node. Returns false when the entry is not indexed.
    pub(crate) fn erase(&mut self, entry: EntryKey) -> bool {
        let Some(&target) = self.by_entry.get(entry) else {
            return false;
        };

        // Two children: trade entries with the in-order predecessor and
        // remove that node instead; it has no right child.
        let mut n = target;
        if let (Some(l), Some(_)) = (self.nodes[n].left, self.nodes[n].right) {
            let pred = self.rightmost(l);
            let pred_entry = self.nodes[pred].entry;
            self.nodes[n].entry = pred_entry;
            self.by_entry.insert(pred_entry, n);
            self.nodes[pred].entry = entry;
            n = pred;
        }
        self.by_entry.remove(entry);

        let child = self.nodes[n].left.or(self.nodes[n].right);
        if self.nodes[n].color == Color::Black {
            match child.filter(|&c| self.nodes[c].color == Color::Red) {
                Some(c) => self.nodes[c].color = Color::Black,
                // A black node with no red child is a leaf here; repair the
                // black-height deficit while it still holds its place.
                None => self.fix_double_black(n),
            }
        }

        let parent = self.nodes[n].parent;
        if let Some(c) = child {
            self.nodes[c].parent = parent;
        }
        self.replace_child(parent, n, child);
        self.nodes.remove(n);
        true
    }

    fn fix_double_black(&mut self, mut n: NodeKey) {
        // Reaching the root ends the deficit.
        while let Some(p) = self.nodes[n].parent {
            let n_is_left = self.nodes[p].left == Some(n);
            let s = if n_is_left {
                self.nodes[p].right
            } else {
                self.nodes[p].left
            }
            .expect("a double-black node always has a sibling");

            // Red sibling: rotate so the sibling becomes black.
            if self.nodes[s].color == Color::Red {
                self.nodes[p].color = Color::Red;
                self.nodes[s].color = Color::Black;
                if n_is_left {
                    self.rotate_left(p);
                } else {
                    self.rotate_right(p);
                }
                continue;
            }

            let (near, far) = if n_is_left {
                (self.nodes[s].left, self.nodes[s].right)
            } else {
                (self.nodes[s].right, self.nodes[s].left)
            };

            if self.color(near) == Color::Black && self.color(far) == Color::Black {
                self.nodes[s].color = Color::Red;
                // Black parent: the deficit moves up.
                if self.nodes[p].color == Color::Black {
                    n = p;
                    continue;
                }
                // Red parent: swapping colors absorbs it.
                self.nodes[p].color = Color::Black;
                return;
            }

            // Near red, far black: rotate at the sibling to make far red.
            if self.color(far) == Color::Black {
                let nr = near.expect("near child is red");
                self.nodes[nr].color = Color::Black;
                self.nodes[s].color = Color::Red;
                if n_is_left {
                    self.rotate_right(s);
                } else {
                    self.rotate_left(s);
                }
                continue;
            }

            // Far red: rotate at the parent and finish.
            let f = far.expect("far child is red");
            self.nodes[s].color = self.nodes[p].color;
            self.nodes[p].color = Color::Black;
            self.nodes[f].color = Color::Black;
            if n_is_left {
                self.rotate_left(p);
            } else {
                self.rotate_right(p);
            }
            return;
        }
    }

    // ---- structure helpers -----------------------------------------------

    fn color(&self, n: Option<NodeKey>) -> Color {
        n.map_or(Color::Black, |n| self.nodes[n].color)
    }

    fn leftmost(&self, mut n: NodeKey) -> NodeKey {
        while let Some(l) = self.nodes[n].left {
            n = l;
        }
        n
    }

    fn rightmost(&self, mut n: NodeKey) -> NodeKey {
        while let Some(r) = self.nodes[n].right {
            n = r;
        }
        n
    }

    fn replace_child(&mut self, parent: Option<NodeKey>, old: NodeKey, new: Option<NodeKey>) {
        match parent {
            None => self.root = new,
            Some(p) if self.nodes[p].left == Some(old) => self.nodes[p].left = new,
            Some(p) => self.nodes[p].right = new,
        }
    }

    fn rotate_left(&mut self, x: NodeKey) {
        let y = self.nodes[x]
            .right
            .expect("rotate_left needs a right child");
        let inner = self.nodes[y].left;
        self.nodes[x].right = inner;
        if let Some(b) = inner {
            self.nodes[b].parent = Some(x);
        }
        let p = self.nodes[x].parent;
        self.nodes[y].parent = p;
        self.replace_child(p, x, Some(y));
        self.nodes[y].left = Some(x);
        self.nodes[x].parent = Some(y);
    }

    fn rotate_right(&mut self, x: NodeKey) {
        let y = self.nodes[x]
            .left
            .expect("rotate_right needs a left child");
        let inner = self.nodes[y].right;
        self.nodes[x].left = inner;
        if let Some(b) = inner {
            self.nodes[b].parent = Some(x);
        }
        let p = self.nodes[x].parent;
        self.nodes[y].parent = p;
        self.replace_child(p, x, Some(y));
        self.nodes[y].right = Some(x);
        self.nodes[x].parent = Some(y);
    }

    // ---- verification ----------------------------------------------------

    /// Check the red-black invariants, parent links, the entry map, and that
    /// the in-order walk matches the store's list order. Returns the black
    /// height.
    pub(crate) fn check<K, V>(&self, store: &NodeStore<K, V>) -> Result<usize, String> {
        if self.nodes.len() != store.len() {
            return Err(format!(
                "tree has {} nodes, store has {} entries",
                self.nodes.len(),
                store.len()
            ));
        }
        let Some(root) = self.root else {
            return if self.by_entry.is_empty() {
                Ok(0)
            } else {
                Err("empty tree with indexed entries".into())
            };
        };
        if self.nodes[root].parent.is_some() {
            return Err("root has a parent".into());
        }
        if self.nodes[root].color != Color::Black {
            return Err("root is red".into());
        }
        let height = self.check_subtree(Some(root))?;

        let mut in_order = Vec::with_capacity(self.nodes.len());
        self.collect_in_order(Some(root), &mut in_order);
        let mut listed = Vec::with_capacity(store.len());
        let mut cur = store.head();
        while let Some(k) = cur {
            listed.push(k);
            cur = store.next_key(k);
        }
        if in_order != listed {
            return Err("in-order walk differs from list order".into());
        }
        for (n, node) in &self.nodes {
            if self.by_entry.get(node.entry) != Some(&n) {
                return Err("entry map does not point back at its node".into());
            }
        }
        Ok(height)
    }

    fn check_subtree(&self, n: Option<NodeKey>) -> Result<usize, String> {
        let Some(n) = n else {
            return Ok(1);
        };
        let node = &self.nodes[n];
        for child in [node.left, node.right].into_iter().flatten() {
            if self.nodes[child].parent != Some(n) {
                return Err("child does not point back at its parent".into());
            }
            if node.color == Color::Red && self.nodes[child].color == Color::Red {
                return Err("red node has a red child".into());
            }
        }
        let lh = self.check_subtree(node.left)?;
        let rh = self.check_subtree(node.right)?;
        if lh != rh {
            return Err(format!("black height differs: {} vs {}", lh, rh));
        }
        Ok(lh + usize::from(node.color == Color::Black))
    }

    fn collect_in_order(&self, n: Option<NodeKey>, out: &mut Vec<EntryKey>) {
        if let Some(n) = n {
            self.collect_in_order(self.nodes[n].left, out);
            out.push(self.nodes[n].entry);
            self.collect_in_order(self.nodes[n].right, out);
        }
    }
}
