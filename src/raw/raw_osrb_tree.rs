use core::borrow::Borrow;
use core::cmp::Ordering;

use alloc::vec::Vec;
use log::{debug, trace};
use smallvec::smallvec;

use super::arena::Arena;
use super::fixup::{DeleteCase, InsertCase, classify_delete, classify_insert};
use super::handle::Handle;
use super::node::{Bag, Color, Node, Side};
use super::nodes::Nodes;
use crate::error::{Error, Result};

/// The red-black engine backing `OSRBTree`.
///
/// Every node caches the number of values in its subtree, so rank queries
/// descend by size instead of walking the tree.
#[derive(Clone)]
pub(crate) struct RawOSRBTree<K, V> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<K, V>>,
    /// Handle to the root node, if the tree is non-empty.
    root: Option<Handle>,
}

impl<K, V> RawOSRBTree<K, V> {
    /// Creates a new, empty tree.
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
        }
    }

    /// Creates a new tree with room for `capacity` distinct keys.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: None,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Total number of values across all keys.
    pub(crate) fn len(&self) -> usize {
        self.size_of(self.root)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of distinct keys (one node each).
    pub(crate) fn key_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    pub(crate) fn root(&self) -> Option<Handle> {
        self.root
    }

    #[inline]
    pub(crate) fn node(&self, handle: Handle) -> &Node<K, V> {
        self.nodes.get(handle)
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, handle: Handle) -> &mut Node<K, V> {
        self.nodes.get_mut(handle)
    }

    /// Cached subtree size; an absent subtree holds nothing.
    #[inline]
    pub(crate) fn size_of(&self, handle: Option<Handle>) -> usize {
        handle.map_or(0, |h| self.node(h).size)
    }

    /// Color of a possibly absent node; nil leaves are black.
    #[inline]
    pub(crate) fn color_of(&self, handle: Option<Handle>) -> Color {
        handle.map_or(Color::Black, |h| self.node(h).color)
    }

    /// In-order walk over the nodes.
    pub(crate) fn nodes(&self) -> Nodes<'_, K, V> {
        Nodes::new(self)
    }

    /// Number of black nodes on any root-to-nil path.
    pub(crate) fn black_height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.node(handle);
            if !node.is_red() {
                height += 1;
            }
            current = node.left();
        }
        height
    }

    /// Moves every key and its bag out of the tree, in key order.
    pub(crate) fn drain_to_vec(&mut self) -> Vec<(K, Bag<V>)> {
        let order: Vec<Handle> = self.nodes().map(|(handle, _)| handle).collect();
        let mut result = Vec::with_capacity(order.len());
        for handle in order {
            let node = self.nodes.take(handle);
            result.push((node.key, node.values));
        }
        self.clear();
        result
    }

    fn leftmost(&self, mut handle: Handle) -> Handle {
        while let Some(left) = self.node(handle).left() {
            handle = left;
        }
        handle
    }

    /// Which side of its parent `handle` hangs on. `None` for the root.
    fn slot_of(&self, handle: Handle) -> Option<(Handle, Side)> {
        let parent = self.node(handle).parent?;
        let side = self.node(parent).side_of(handle).expect("parent link names a node that does not own this child");
        Some((parent, side))
    }

    /// Hangs `new` where `old` used to hang under `parent`, or at the root.
    fn replace_child(&mut self, parent: Option<Handle>, old: Handle, new: Option<Handle>) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                let side = self.node(parent).side_of(old).expect("`old` is not a child of `parent`");
                self.node_mut(parent).set_child(side, new);
            }
        }
        if let Some(new) = new {
            self.node_mut(new).parent = parent;
        }
    }

    fn refresh_size(&mut self, handle: Handle) {
        let node = self.node(handle);
        let size = node.bag_len() + self.size_of(node.left()) + self.size_of(node.right());
        self.node_mut(handle).size = size;
    }

    /// Subtracts `amount` from every cached size from `from` up to, but not
    /// including, `stop`.
    fn shrink_path(&mut self, from: Handle, stop: Option<Handle>, amount: usize) {
        let mut current = Some(from);
        while current != stop {
            let Some(handle) = current else { break };
            let node = self.node_mut(handle);
            node.size -= amount;
            current = node.parent;
        }
    }

    /// Rotates `x` down toward `dir`; its child on the opposite side takes its
    /// place. Only `x` and the lifted child change size.
    fn rotate(&mut self, x: Handle, dir: Side) {
        let lift = dir.opposite();
        let y = self.node(x).child(lift).expect("rotation needs a child to lift");
        let inner = self.node(y).child(dir);
        let parent = self.node(x).parent;

        self.node_mut(x).set_child(lift, inner);
        if let Some(inner) = inner {
            self.node_mut(inner).parent = Some(x);
        }

        self.replace_child(parent, x, Some(y));
        self.node_mut(y).set_child(dir, Some(x));
        self.node_mut(x).parent = Some(y);

        let size = self.node(x).size;
        self.node_mut(y).size = size;
        self.refresh_size(x);
    }

    fn set_color(&mut self, handle: Handle, color: Color) {
        self.node_mut(handle).color = color;
    }

    fn fix_insert(&mut self, mut node: Handle) {
        while let Some(parent) = self.node(node).parent.filter(|&p| self.node(p).is_red()) {
            // A red parent is never the root.
            let (grand, parent_side) = self.slot_of(parent).expect("red node has a parent");
            let node_side = self.node(parent).side_of(node).expect("node hangs under its parent");
            let uncle = self.node(grand).child(parent_side.opposite());

            let case = classify_insert(self.color_of(uncle), parent_side, node_side);
            trace!("insert fix-up: {case:?}");

            match case {
                InsertCase::RecolorUncle => {
                    self.set_color(parent, Color::Black);
                    if let Some(uncle) = uncle {
                        self.set_color(uncle, Color::Black);
                    }
                    self.set_color(grand, Color::Red);
                    node = grand;
                }
                InsertCase::Triangle => {
                    self.rotate(parent, parent_side);
                    node = parent;
                }
                InsertCase::Line => {
                    self.set_color(parent, Color::Black);
                    self.set_color(grand, Color::Red);
                    self.rotate(grand, parent_side.opposite());
                }
            }
        }

        if let Some(root) = self.root {
            self.set_color(root, Color::Black);
        }
    }

    /// Deletes `target` and returns its whole bag. Sizes on the path to the
    /// root shrink by the bag length.
    fn remove_node(&mut self, target: Handle) -> Bag<V> {
        let bag_len = self.node(target).bag_len();
        self.shrink_path(target, None, bag_len);

        let node = self.node(target);
        let doomed = match (node.left(), node.right()) {
            (Some(_), Some(right)) => {
                // Pull the successor's entry up and delete the successor node.
                let successor = self.leftmost(right);
                let moved = self.node(successor).bag_len();
                self.shrink_path(successor, Some(target), moved);

                let (kept, gone) = self.nodes.get_pair_mut(target, successor);
                core::mem::swap(&mut kept.key, &mut gone.key);
                core::mem::swap(&mut kept.values, &mut gone.values);
                successor
            }
            _ => target,
        };

        self.splice_out(doomed);
        let node = self.nodes.take(doomed);
        debug!("removed node holding {} value(s); {} key(s) left", node.bag_len(), self.key_count());
        node.values
    }

    /// Unlinks a node with at most one child and restores the black height.
    fn splice_out(&mut self, handle: Handle) {
        let node = self.node(handle);
        debug_assert!(node.left().is_none() || node.right().is_none(), "spliced node has two children");
        let child = node.left().or(node.right());
        let color = node.color;
        let slot = self.slot_of(handle);

        self.replace_child(slot.map(|(parent, _)| parent), handle, child);

        if color == Color::Black {
            match (child, slot) {
                // A black node with a single child always has a red one.
                (Some(child), _) => self.set_color(child, Color::Black),
                (None, Some((parent, side))) => self.fix_remove(parent, side),
                (None, None) => {}
            }
        }
    }

    /// Repairs a subtree hanging at `side` of `parent` that is one black node
    /// short.
    fn fix_remove(&mut self, mut parent: Handle, mut side: Side) {
        loop {
            let sibling = self.node(parent).child(side.opposite()).expect("deficient subtree has a sibling");
            let near = self.node(sibling).child(side);
            let far = self.node(sibling).child(side.opposite());

            let case = classify_delete(
                self.node(parent).color,
                self.node(sibling).color,
                self.color_of(near),
                self.color_of(far),
            );
            trace!("delete fix-up: {case:?}");

            match case {
                DeleteCase::RedSibling => {
                    self.set_color(sibling, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate(parent, side);
                }
                DeleteCase::AbsorbIntoParent => {
                    self.set_color(parent, Color::Black);
                    self.set_color(sibling, Color::Red);
                }
                DeleteCase::Propagate => {
                    self.set_color(sibling, Color::Red);
                    match self.slot_of(parent) {
                        Some((grand, parent_side)) => {
                            parent = grand;
                            side = parent_side;
                        }
                        None => break,
                    }
                }
                DeleteCase::NearNephewRed => {
                    if let Some(near) = near {
                        self.set_color(near, Color::Black);
                    }
                    self.set_color(sibling, Color::Red);
                    self.rotate(sibling, side.opposite());
                }
                DeleteCase::FarNephewRed => {
                    let parent_color = self.node(parent).color;
                    self.set_color(sibling, parent_color);
                    self.set_color(parent, Color::Black);
                    if let Some(far) = far {
                        self.set_color(far, Color::Black);
                    }
                    self.rotate(parent, side);
                }
            }

            if case.is_terminal() {
                break;
            }
        }
    }
}

impl<K: Ord, V> RawOSRBTree<K, V> {
    /// Finds the node holding `key`.
    pub(crate) fn search<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.node(handle);
            current = match key.cmp(node.key.borrow()) {
                Ordering::Less => node.left(),
                Ordering::Equal => return Some(handle),
                Ordering::Greater => node.right(),
            };
        }
        None
    }

    /// Returns the bag stored under `key`.
    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&[V]>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.search(key).map(|handle| self.node(handle).values.as_slice())
    }

    /// Returns the bag stored under `key` mutably. The slice cannot change
    /// length, so cached sizes stay valid.
    pub(crate) fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut [V]>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let handle = self.search(key)?;
        Some(self.node_mut(handle).values.as_mut_slice())
    }

    /// Appends `value` to the bag of `key`, creating the node if needed.
    pub(crate) fn insert(&mut self, key: K, value: V) {
        let Some(mut current) = self.root else {
            let mut node = Node::new(key, value, None);
            node.color = Color::Black;
            self.root = Some(self.nodes.alloc(node));
            return;
        };

        loop {
            // The new value lands somewhere below every node we pass.
            let node = self.node_mut(current);
            node.size += 1;

            let side = match key.cmp(&node.key) {
                Ordering::Less => Side::Left,
                Ordering::Equal => {
                    node.values.push(value);
                    return;
                }
                Ordering::Greater => Side::Right,
            };

            match node.child(side) {
                Some(child) => current = child,
                None => {
                    let fresh = self.nodes.alloc(Node::new(key, value, Some(current)));
                    self.node_mut(current).set_child(side, Some(fresh));
                    self.fix_insert(fresh);
                    return;
                }
            }
        }
    }

    /// Removes values under `key`.
    ///
    /// With a position inside a bag of two or more values only that value goes.
    /// With no position, or position `0` on a single-value bag, the whole bag
    /// and its node go. Any other position is rejected before anything changes.
    pub(crate) fn remove<Q>(&mut self, key: &Q, pos: Option<usize>) -> Result<Bag<V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let Some(target) = self.search(key) else {
            return Ok(Bag::new());
        };

        let bag_len = self.node(target).bag_len();
        match pos {
            Some(pos) if bag_len > 1 && pos < bag_len => {
                let value = self.node_mut(target).values.remove(pos);
                self.shrink_path(target, None, 1);
                Ok(smallvec![value])
            }
            None | Some(0) => Ok(self.remove_node(target)),
            Some(pos) => Err(Error::OutOfRange { index: pos, len: bag_len }),
        }
    }

    /// Returns the key whose bag covers global value index `index`.
    pub(crate) fn select(&self, index: usize) -> Result<&K> {
        let len = self.len();
        let Some(mut current) = self.root.filter(|_| index < len) else {
            return Err(Error::OutOfRange { index, len });
        };

        // Offset of `index` within the current subtree.
        let mut remaining = index;
        loop {
            let node = self.node(current);
            let before = self.size_of(node.left());

            current = if remaining < before {
                node.left()
            } else if remaining - before < node.bag_len() {
                return Ok(&node.key);
            } else {
                remaining -= before + node.bag_len();
                node.right()
            }
            .expect("cached sizes cover every index below the subtree size");
        }
    }

    /// Returns the global index of the first value stored under `key`.
    pub(crate) fn rank<Q>(&self, key: &Q) -> Result<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut rank = 0;
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.node(handle);
            current = match key.cmp(node.key.borrow()) {
                Ordering::Less => node.left(),
                Ordering::Equal => return Ok(rank + self.size_of(node.left())),
                Ordering::Greater => {
                    rank += self.size_of(node.left()) + node.bag_len();
                    node.right()
                }
            };
        }
        Err(Error::NotFound)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    fn tree_of(keys: &[i32]) -> RawOSRBTree<i32, i32> {
        let mut tree = RawOSRBTree::new();
        for &key in keys {
            tree.insert(key, key * 10);
        }
        tree
    }

    /// Checks sizes and parent links only; colors may be mid-repair.
    fn assert_sizes_and_links(tree: &RawOSRBTree<i32, i32>) {
        if let Some(root) = tree.root() {
            assert_eq!(tree.node(root).parent, None, "root has a parent");
        }
        for (handle, node) in tree.nodes() {
            let actual = node.bag_len() + tree.size_of(node.left()) + tree.size_of(node.right());
            assert_eq!(node.size, actual, "size of key {}", node.key);
            for child in [node.left(), node.right()].into_iter().flatten() {
                assert_eq!(tree.node(child).parent, Some(handle), "parent link under key {}", node.key);
            }
        }
    }

    fn keys_in_order(tree: &RawOSRBTree<i32, i32>) -> Vec<i32> {
        tree.nodes().map(|(_, node)| node.key).collect()
    }

    #[test]
    fn rotations_repair_sizes_and_links() {
        let mut tree = tree_of(&[4, 2, 6, 1, 3, 5, 7]);
        tree.insert(6, 61);
        tree.insert(3, 31);
        let before = keys_in_order(&tree);
        let root = tree.root().unwrap();

        tree.rotate(root, Side::Left);
        assert_sizes_and_links(&tree);
        assert_eq!(tree.node(tree.root().unwrap()).key, 6);
        assert_eq!(tree.node(root).parent, tree.root());
        assert_eq!(tree.len(), 9);

        let new_root = tree.root().unwrap();
        tree.rotate(new_root, Side::Right);
        assert_sizes_and_links(&tree);
        assert_eq!(tree.root(), Some(root));

        let left = tree.node(root).left().unwrap();
        tree.rotate(left, Side::Right);
        assert_sizes_and_links(&tree);
        assert_eq!(keys_in_order(&tree), before);
    }

    #[test]
    fn ascending_inserts_stay_balanced() {
        let keys: Vec<i32> = (0..1000).collect();
        let tree = tree_of(&keys);
        assert_eq!(tree.validate(), Ok(tree.black_height()));
        // A red-black tree of n nodes is at most 2·log2(n + 1) deep.
        assert!(tree.black_height() <= 10);
        assert_eq!(tree.len(), 1000);
        assert_eq!(tree.key_count(), 1000);
    }

    #[test]
    fn duplicate_keys_share_a_node() {
        let mut tree = tree_of(&[2, 1, 3]);
        tree.insert(2, 21);
        tree.insert(2, 22);

        assert_eq!(tree.key_count(), 3);
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.get(&2), Some(&[20, 21, 22][..]));
        assert_eq!(tree.rank(&3), Ok(4));
        assert_sizes_and_links(&tree);
    }

    #[test]
    fn positional_remove_keeps_structure() {
        let mut tree = tree_of(&[2, 1, 3]);
        tree.insert(2, 21);
        tree.insert(2, 22);
        let root = tree.root();

        assert_eq!(tree.remove(&2, Some(1)).unwrap().as_slice(), &[21]);
        assert_eq!(tree.root(), root);
        assert_eq!(tree.get(&2), Some(&[20, 22][..]));
        assert_eq!(tree.len(), 4);
        assert_sizes_and_links(&tree);

        assert_eq!(tree.remove(&2, Some(2)), Err(Error::OutOfRange { index: 2, len: 2 }));
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn position_zero_on_single_value_removes_node() {
        let mut tree = tree_of(&[2, 1, 3]);
        assert_eq!(tree.remove(&1, Some(1)), Err(Error::OutOfRange { index: 1, len: 1 }));
        assert_eq!(tree.remove(&1, Some(0)).unwrap().as_slice(), &[10]);
        assert_eq!(tree.search(&1), None);
        assert_eq!(tree.key_count(), 2);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn two_child_removal_returns_own_bag() {
        let mut tree = tree_of(&[4, 2, 6, 1, 3, 5, 7]);
        tree.insert(4, 41);
        tree.insert(5, 51);
        let root = tree.root().unwrap();
        assert_eq!(tree.node(root).key, 4);

        let removed = tree.remove(&4, None).unwrap();
        assert_eq!(removed.as_slice(), &[40, 41]);
        assert_eq!(tree.node(root).key, 5);
        assert_eq!(tree.get(&5), Some(&[50, 51][..]));
        assert_eq!(tree.len(), 7);
        assert_eq!(keys_in_order(&tree), [1, 2, 3, 5, 6, 7]);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn removing_missing_key_is_a_no_op() {
        let mut tree = tree_of(&[1, 2, 3]);
        assert!(tree.remove(&9, None).unwrap().is_empty());
        assert!(tree.remove(&9, Some(4)).unwrap().is_empty());
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn emptying_the_tree() {
        let mut tree = tree_of(&[3, 1, 2]);
        for key in [2, 3, 1] {
            tree.remove(&key, None).unwrap();
            assert!(tree.validate().is_ok());
        }
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
        assert_eq!(tree.select(0), Err(Error::OutOfRange { index: 0, len: 0 }));
        assert_eq!(tree.black_height(), 0);
    }

    #[test]
    fn select_walks_bags() {
        let mut tree = tree_of(&[5, 3, 8, 1, 4, 7, 9]);
        tree.insert(3, 0);
        let expected = [1, 3, 3, 4, 5, 7, 8, 9];
        for (index, key) in expected.iter().enumerate() {
            assert_eq!(tree.select(index), Ok(key));
        }
        assert_eq!(tree.select(8), Err(Error::OutOfRange { index: 8, len: 8 }));
    }

    #[test]
    fn drain_yields_bags_in_key_order() {
        let mut tree = tree_of(&[3, 1, 2, 1]);
        let drained = tree.drain_to_vec();
        let flat: Vec<(i32, Vec<i32>)> = drained.into_iter().map(|(k, bag)| (k, bag.into_vec())).collect();
        assert_eq!(flat, [(1, alloc::vec![10, 10]), (2, alloc::vec![20]), (3, alloc::vec![30])]);
        assert!(tree.is_empty());
        assert_eq!(tree.key_count(), 0);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(i16),
        Remove(i16),
        RemoveAt(i16, usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            6 => (-64i16..64).prop_map(Op::Insert),
            3 => (-64i16..64).prop_map(Op::Remove),
            2 => ((-64i16..64), 0usize..3).prop_map(|(k, p)| Op::RemoveAt(k, p)),
        ]
    }

    proptest! {
        #[test]
        fn invariants_hold_after_every_operation(ops in prop::collection::vec(op_strategy(), 1..400)) {
            let mut tree: RawOSRBTree<i16, u32> = RawOSRBTree::new();
            let mut model = alloc::collections::BTreeMap::<i16, Vec<u32>>::new();

            for (step, op) in ops.into_iter().enumerate() {
                match op {
                    Op::Insert(key) => {
                        tree.insert(key, step as u32);
                        model.entry(key).or_default().push(step as u32);
                    }
                    Op::Remove(key) => {
                        let removed = tree.remove(&key, None).unwrap();
                        let expected = model.remove(&key).unwrap_or_default();
                        prop_assert_eq!(removed.into_vec(), expected);
                    }
                    Op::RemoveAt(key, pos) => {
                        let result = tree.remove(&key, Some(pos)).map(smallvec::SmallVec::into_vec);
                        let expected = match model.get(&key).map(Vec::len) {
                            None => Ok(Vec::new()),
                            Some(len) if len > 1 && pos < len => {
                                Ok(alloc::vec![model.get_mut(&key).unwrap().remove(pos)])
                            }
                            Some(_) if pos == 0 => Ok(model.remove(&key).unwrap()),
                            Some(len) => Err(Error::OutOfRange { index: pos, len }),
                        };
                        prop_assert_eq!(result, expected);
                    }
                }

                prop_assert!(tree.validate().is_ok(), "{:?}", tree.validate());
                prop_assert_eq!(tree.len(), model.values().map(Vec::len).sum::<usize>());
                prop_assert_eq!(tree.key_count(), model.len());
            }
        }
    }
}
