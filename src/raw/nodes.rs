use core::iter::FusedIterator;

use smallvec::SmallVec;

use super::handle::Handle;
use super::node::Node;
use super::raw_osrb_tree::RawOSRBTree;

/// In-order walk over tree nodes using an explicit stack of pending
/// ancestors, so depth never touches the call stack.
pub(crate) struct Nodes<'a, K, V> {
    raw: &'a RawOSRBTree<K, V>,
    // Nodes whose left subtree is being visited, innermost last.
    stack: SmallVec<[Handle; 32]>,
}

impl<'a, K, V> Nodes<'a, K, V> {
    pub(crate) fn new(raw: &'a RawOSRBTree<K, V>) -> Self {
        let mut nodes = Self {
            raw,
            stack: SmallVec::new(),
        };
        nodes.push_left_spine(raw.root());
        nodes
    }

    fn push_left_spine(&mut self, mut next: Option<Handle>) {
        while let Some(handle) = next {
            self.stack.push(handle);
            next = self.raw.node(handle).left();
        }
    }
}

impl<'a, K, V> Iterator for Nodes<'a, K, V> {
    type Item = (Handle, &'a Node<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.stack.pop()?;
        let raw = self.raw;
        let node = raw.node(handle);
        self.push_left_spine(node.right());
        Some((handle, node))
    }
}

impl<K, V> FusedIterator for Nodes<'_, K, V> {}

impl<K, V> Clone for Nodes<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw,
            stack: self.stack.clone(),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn empty_tree_yields_nothing() {
        let tree: RawOSRBTree<u8, ()> = RawOSRBTree::new();
        assert_eq!(tree.nodes().count(), 0);
    }

    #[test]
    fn visits_each_key_once_in_order() {
        let mut tree = RawOSRBTree::new();
        for key in [50, 20, 80, 10, 30, 70, 90, 60, 20, 60] {
            tree.insert(key, ());
        }

        let keys: Vec<i32> = tree.nodes().map(|(_, node)| node.key).collect();
        assert_eq!(keys, [10, 20, 30, 50, 60, 70, 80, 90]);
    }

    #[test]
    fn clone_resumes_from_same_point() {
        let mut tree = RawOSRBTree::new();
        for key in 0..64 {
            tree.insert(key, ());
        }

        let mut walk = tree.nodes();
        walk.nth(40);
        let rest: Vec<i32> = walk.clone().map(|(_, node)| node.key).collect();
        let again: Vec<i32> = walk.map(|(_, node)| node.key).collect();
        assert_eq!(rest, again);
        assert_eq!(rest.first(), Some(&41));
    }
}
