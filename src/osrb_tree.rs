use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::iter::FusedIterator;

use alloc::vec::Vec;

use crate::error::{Error, InvariantViolation, Result};
use crate::raw::{Bag, Nodes, RawOSRBTree};

mod capacity;
mod order_statistic;

pub use crate::Rank;

/// An ordered multimap based on a [red-black tree], augmented for order
/// statistics.
///
/// Keys must implement [`Ord`]. Inserting a key that is already present does
/// not replace anything: the value is appended to that key's *bag*, and the
/// bag keeps insertion order. All counting is done over values, so
/// [`len`](OSRBTree::len), [`select`](OSRBTree::select) and
/// [`rank`](OSRBTree::rank) see the flattened sequence in which every key
/// appears once per value it holds.
///
/// Every node caches the number of values in its subtree, which makes
/// `select` and `rank` O(log n) alongside the usual O(log n) insert, remove
/// and lookup.
///
/// It is a logic error for a key to be modified in such a way that its
/// ordering relative to any other key changes while it is in the tree. The
/// behavior resulting from such a logic error is not specified, but will be
/// encapsulated to the `OSRBTree` that observed it and not result in undefined
/// behavior.
///
/// # Examples
///
/// ```
/// use osrb_tree::OSRBTree;
///
/// let mut scores = OSRBTree::new();
/// scores.insert(90, "Alice");
/// scores.insert(75, "Bob");
/// scores.insert(90, "Carol");
/// scores.insert(60, "Dave");
///
/// // Two values share the key 90.
/// assert_eq!(scores.len(), 4);
/// assert_eq!(scores.get(&90), Ok(&["Alice", "Carol"][..]));
///
/// // Order statistics count values, not keys.
/// assert_eq!(scores.select(0), Ok(&60));
/// assert_eq!(scores.select(3), Ok(&90));
/// assert_eq!(scores.rank(&90), Ok(2));
///
/// // Iteration yields one pair per value, in key order.
/// let pairs: Vec<_> = scores.iter().collect();
/// assert_eq!(pairs, [(&60, &"Dave"), (&75, &"Bob"), (&90, &"Alice"), (&90, &"Carol")]);
/// ```
///
/// [red-black tree]: https://en.wikipedia.org/wiki/Red%E2%80%93black_tree
pub struct OSRBTree<K, V> {
    raw: RawOSRBTree<K, V>,
}

/// An iterator over the `(key, value)` pairs of an `OSRBTree`.
///
/// This `struct` is created by the [`iter`] method on [`OSRBTree`]. See its
/// documentation for more.
///
/// [`iter`]: OSRBTree::iter
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, V> {
    nodes: Nodes<'a, K, V>,
    bag: Option<(&'a K, core::slice::Iter<'a, V>)>,
    remaining: usize,
}

/// An owning iterator over the `(key, value)` pairs of an `OSRBTree`.
///
/// This `struct` is created by the [`into_iter`] method on [`OSRBTree`]
/// (provided by the [`IntoIterator`] trait).
///
/// [`into_iter`]: IntoIterator::into_iter
pub struct IntoIter<K, V> {
    bags: alloc::vec::IntoIter<(K, Bag<V>)>,
    front: Option<(K, smallvec::IntoIter<[V; 1]>)>,
    remaining: usize,
}

/// An iterator over the distinct keys of an `OSRBTree`.
///
/// This `struct` is created by the [`keys`] method on [`OSRBTree`].
///
/// [`keys`]: OSRBTree::keys
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Keys<'a, K, V> {
    nodes: Nodes<'a, K, V>,
    remaining: usize,
}

/// An iterator over every value of an `OSRBTree`.
///
/// This `struct` is created by the [`values`] method on [`OSRBTree`].
///
/// [`values`]: OSRBTree::values
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<K, V> OSRBTree<K, V> {
    /// Makes a new, empty `OSRBTree`.
    ///
    /// Does not allocate anything on its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use osrb_tree::OSRBTree;
    ///
    /// let mut tree = OSRBTree::new();
    /// tree.insert(1, "a");
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        OSRBTree { raw: RawOSRBTree::new() }
    }

    /// Returns the number of values in the tree, counting every value in
    /// every bag.
    ///
    /// # Examples
    ///
    /// ```
    /// use osrb_tree::OSRBTree;
    ///
    /// let mut tree = OSRBTree::new();
    /// tree.insert(1, "a");
    /// tree.insert(1, "b");
    /// assert_eq!(tree.len(), 2);
    /// ```
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the tree holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the number of distinct keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use osrb_tree::OSRBTree;
    ///
    /// let tree = OSRBTree::from([(1, 'a'), (1, 'b'), (2, 'c')]);
    /// assert_eq!(tree.key_count(), 2);
    /// assert_eq!(tree.len(), 3);
    /// ```
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.raw.key_count()
    }

    /// Clears the tree, removing all keys and values.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns the number of black nodes on every path from the root to a
    /// leaf, or `0` for an empty tree.
    ///
    /// The height of the tree is at most twice this number.
    #[must_use]
    pub fn black_height(&self) -> usize {
        self.raw.black_height()
    }

    /// Gets an iterator over the `(key, value)` pairs of the tree, in key
    /// order and, within a key, in insertion order.
    ///
    /// # Examples
    ///
    /// ```
    /// use osrb_tree::OSRBTree;
    ///
    /// let tree = OSRBTree::from([(3, 'c'), (1, 'a'), (3, 'd')]);
    /// let mut iter = tree.iter();
    /// assert_eq!(iter.next(), Some((&1, &'a')));
    /// assert_eq!(iter.next(), Some((&3, &'c')));
    /// assert_eq!(iter.next(), Some((&3, &'d')));
    /// assert_eq!(iter.next(), None);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: self.raw.nodes(),
            bag: None,
            remaining: self.len(),
        }
    }

    /// Gets an iterator over the distinct keys of the tree, in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use osrb_tree::OSRBTree;
    ///
    /// let tree = OSRBTree::from([(2, 'b'), (1, 'a'), (2, 'c')]);
    /// let keys: Vec<_> = tree.keys().copied().collect();
    /// assert_eq!(keys, [1, 2]);
    /// ```
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            nodes: self.raw.nodes(),
            remaining: self.key_count(),
        }
    }

    /// Gets an iterator over every value of the tree, in the same order as
    /// [`iter`](OSRBTree::iter).
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

impl<K: Ord, V> OSRBTree<K, V> {
    /// Appends `value` to the bag stored under `key`, creating the key if it
    /// is not present yet.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use osrb_tree::OSRBTree;
    ///
    /// let mut tree = OSRBTree::new();
    /// tree.insert("k", 1);
    /// tree.insert("k", 2);
    /// assert_eq!(tree.get("k"), Ok(&[1, 2][..]));
    /// ```
    pub fn insert(&mut self, key: K, value: V) {
        self.raw.insert(key, value);
    }

    /// Removes values stored under `key` and returns them.
    ///
    /// - If `pos` is `Some(i)` and the bag holds more than one value, only the
    ///   value at index `i` of the bag is removed; the rest keep their order.
    /// - If `pos` is `None`, the entire bag is removed along with the key, no
    ///   matter how many values it holds. `Some(0)` on a single-value bag does
    ///   the same.
    /// - If `key` is absent nothing happens and an empty `Vec` is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `pos` is not a valid index into the
    /// bag. The tree is unchanged in that case.
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
    /// let mut tree = OSRBTree::from([(7, 'a'), (7, 'b'), (7, 'c')]);
    ///
    /// assert_eq!(tree.remove(&7, Some(1)), Ok(vec!['b']));
    /// assert_eq!(tree.remove(&7, Some(5)), Err(Error::OutOfRange { index: 5, len: 2 }));
    /// assert_eq!(tree.remove(&7, None), Ok(vec!['a', 'c']));
    /// assert!(!tree.contains_key(&7));
    /// ```
    pub fn remove<Q>(&mut self, key: &Q, pos: Option<usize>) -> Result<Vec<V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove(key, pos).map(Bag::into_vec)
    }

    /// Returns the bag of values stored under `key`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `key` is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use osrb_tree::{Error, OSRBTree};
    ///
    /// let tree = OSRBTree::from([(1, "a")]);
    /// assert_eq!(tree.get(&1), Ok(&["a"][..]));
    /// assert_eq!(tree.get(&2), Err(Error::NotFound));
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Result<&[V]>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get(key).ok_or(Error::NotFound)
    }

    /// Returns the bag stored under `key` as a mutable slice. Values can be
    /// changed in place; the bag cannot grow or shrink through it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `key` is absent.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<&mut [V]>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get_mut(key).ok_or(Error::NotFound)
    }

    /// Returns `true` if the tree holds at least one value under `key`.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.search(key).is_some()
    }

    /// Checks every structural invariant of the tree: black root, no red node
    /// with a red child, equal black height on every path, strictly
    /// increasing keys, non-empty bags, consistent parent links and cached
    /// subtree sizes. Returns the black height.
    ///
    /// This walks the whole tree and is meant for tests and debugging.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn validate(&self) -> core::result::Result<usize, InvariantViolation> {
        self.raw.validate()
    }
}

impl<K: Clone, V: Clone> Clone for OSRBTree<K, V> {
    fn clone(&self) -> Self {
        OSRBTree { raw: self.raw.clone() }
    }
}

impl<K: Hash, V: Hash> Hash for OSRBTree<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for (k, v) in self {
            k.hash(state);
            v.hash(state);
        }
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for OSRBTree<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for OSRBTree<K, V> {}

impl<K: PartialOrd, V: PartialOrd> PartialOrd for OSRBTree<K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<K: Ord, V: Ord> Ord for OSRBTree<K, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for OSRBTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> Default for OSRBTree<K, V> {
    fn default() -> Self {
        OSRBTree::new()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for OSRBTree<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut tree = OSRBTree::new();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord, V> Extend<(K, V)> for OSRBTree<K, V> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K: Ord + Copy, V: Copy> Extend<(&'a K, &'a V)> for OSRBTree<K, V> {
    fn extend<T: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: T) {
        for (&k, &v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for OSRBTree<K, V> {
    fn from(arr: [(K, V); N]) -> Self {
        arr.into_iter().collect()
    }
}

impl<'a, K, V> IntoIterator for &'a OSRBTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<K: Clone, V> IntoIterator for OSRBTree<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    /// Gets an owning iterator over the `(key, value)` pairs of the tree. The
    /// key is cloned once per value in its bag.
    ///
    /// # Examples
    ///
    /// ```
    /// use osrb_tree::OSRBTree;
    ///
    /// let tree = OSRBTree::from([(2, 'b'), (1, 'a'), (2, 'c')]);
    /// let pairs: Vec<_> = tree.into_iter().collect();
    /// assert_eq!(pairs, [(1, 'a'), (2, 'b'), (2, 'c')]);
    /// ```
    fn into_iter(mut self) -> IntoIter<K, V> {
        let remaining = self.len();
        IntoIter {
            bags: self.raw.drain_to_vec().into_iter(),
            front: None,
            remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((key, values)) = &mut self.bag {
                if let Some(value) = values.next() {
                    self.remaining -= 1;
                    return Some((*key, value));
                }
            }
            let (_, node) = self.nodes.next()?;
            self.bag = Some((&node.key, node.values.iter()));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            nodes: self.nodes.clone(),
            bag: self.bag.clone(),
            remaining: self.remaining,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<K: Clone, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        loop {
            if let Some((key, values)) = &mut self.front {
                if let Some(value) = values.next() {
                    self.remaining -= 1;
                    return Some((key.clone(), value));
                }
            }
            let (key, bag) = self.bags.next()?;
            self.front = Some((key, bag.into_iter()));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Clone, V> ExactSizeIterator for IntoIter<K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K: Clone, V> FusedIterator for IntoIter<K, V> {}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        let (_, node) = self.nodes.next()?;
        self.remaining -= 1;
        Some(&node.key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Keys {
            nodes: self.nodes.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Values {
            inner: self.inner.clone(),
        }
    }
}
