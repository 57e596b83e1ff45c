use core::borrow::Borrow;
use core::ops::Index;

use super::OSRBTree;
use crate::Rank;
use crate::error::Result;

impl<K: Ord, V> OSRBTree<K, V> {
    /// Returns the key owning the value at position `index` of the sorted
    /// value sequence.
    ///
    /// The index is zero-based and counts values, so a key with three values
    /// answers for three consecutive indices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`](crate::Error::OutOfRange) unless
    /// `index < self.len()`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use osrb_tree::{Error, OSRBTree};
    ///
    /// let tree = OSRBTree::from([("b", 1), ("a", 2), ("b", 3)]);
    /// assert_eq!(tree.select(0), Ok(&"a"));
    /// assert_eq!(tree.select(1), Ok(&"b"));
    /// assert_eq!(tree.select(2), Ok(&"b"));
    /// assert_eq!(tree.select(3), Err(Error::OutOfRange { index: 3, len: 3 }));
    /// ```
    pub fn select(&self, index: usize) -> Result<&K> {
        self.raw.select(index)
    }

    /// Returns the zero-based position of the first value stored under `key`
    /// in the sorted value sequence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if `key` is absent.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use osrb_tree::{Error, OSRBTree};
    ///
    /// let tree = OSRBTree::from([(10, 'x'), (10, 'y'), (20, 'z')]);
    /// assert_eq!(tree.rank(&10), Ok(0));
    /// assert_eq!(tree.rank(&20), Ok(2));
    /// assert_eq!(tree.rank(&15), Err(Error::NotFound));
    /// ```
    pub fn rank<Q>(&self, key: &Q) -> Result<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.rank(key)
    }
}

/// Indexes into the tree by rank, yielding the owning key.
///
/// # Panics
///
/// Panics if `rank` is out of bounds.
///
/// # Examples
///
/// ```
/// use osrb_tree::{OSRBTree, Rank};
///
/// let tree = OSRBTree::from([(5, ()), (1, ()), (5, ())]);
/// assert_eq!(tree[Rank(0)], 1);
/// assert_eq!(tree[Rank(2)], 5);
/// ```
impl<K: Ord, V> Index<Rank> for OSRBTree<K, V> {
    type Output = K;

    fn index(&self, rank: Rank) -> &K {
        match self.select(rank.0) {
            Ok(key) => key,
            Err(err) => panic!("{err}"),
        }
    }
}
