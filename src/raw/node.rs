use smallvec::SmallVec;

use super::handle::Handle;

/// Values stored under one key, in insertion order. Most keys are unique, so
/// the first value lives inline.
pub(crate) type Bag<V> = SmallVec<[V; 1]>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Color {
    Red,
    Black,
}

/// Which child slot of a node. Fix-ups are written once against a `Side` and
/// mirrored through [`Side::opposite`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Side {
    Left = 0,
    Right = 1,
}

impl Side {
    #[inline]
    pub(crate) const fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// One distinct key and every value inserted under it.
#[derive(Clone)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) values: Bag<V>,
    pub(crate) color: Color,
    // Number of values (not nodes) in the subtree rooted here.
    pub(crate) size: usize,
    // Back-reference only; ownership flows through `children`.
    pub(crate) parent: Option<Handle>,
    children: [Option<Handle>; 2],
}

impl<K, V> Node<K, V> {
    /// Creates a detached red node holding a single value.
    pub(crate) fn new(key: K, value: V, parent: Option<Handle>) -> Self {
        let mut values = Bag::new();
        values.push(value);
        Self {
            key,
            values,
            color: Color::Red,
            size: 1,
            parent,
            children: [None, None],
        }
    }

    #[inline]
    pub(crate) const fn child(&self, side: Side) -> Option<Handle> {
        self.children[side as usize]
    }

    #[inline]
    pub(crate) fn set_child(&mut self, side: Side, child: Option<Handle>) {
        self.children[side as usize] = child;
    }

    #[inline]
    pub(crate) const fn left(&self) -> Option<Handle> {
        self.child(Side::Left)
    }

    #[inline]
    pub(crate) const fn right(&self) -> Option<Handle> {
        self.child(Side::Right)
    }

    /// Number of values stored at this node alone.
    #[inline]
    pub(crate) fn bag_len(&self) -> usize {
        self.values.len()
    }

    /// Which slot of this node holds `child`, if either does.
    pub(crate) fn side_of(&self, child: Handle) -> Option<Side> {
        if self.left() == Some(child) {
            Some(Side::Left)
        } else if self.right() == Some(child) {
            Some(Side::Right)
        } else {
            None
        }
    }

    #[inline]
    pub(crate) const fn is_red(&self) -> bool {
        matches!(self.color, Color::Red)
    }
}
