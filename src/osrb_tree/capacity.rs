use super::OSRBTree;
use crate::raw::RawOSRBTree;

impl<K, V> OSRBTree<K, V> {
    /// Creates an empty tree with room for at least `capacity` distinct keys
    /// before the node arena reallocates.
    ///
    /// Values beyond the first under each key may still allocate.
    ///
    /// # Examples
    ///
    /// ```
    /// use osrb_tree::OSRBTree;
    ///
    /// let tree: OSRBTree<i32, i32> = OSRBTree::with_capacity(32);
    /// assert!(tree.is_empty());
    /// assert!(tree.capacity() >= 32);
    /// ```
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        OSRBTree {
            raw: RawOSRBTree::with_capacity(capacity),
        }
    }

    /// Returns how many distinct keys the tree can hold without reallocating
    /// its node arena.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }
}
