//! Case tables for the red-black fix-ups.
//!
//! Both fix-ups look at a handful of colors around the node being repaired and
//! pick exactly one local transformation. The choice is made here by pure
//! functions so every color combination can be checked without building a tree;
//! `RawOSRBTree` then applies the chosen case.

use super::node::{Color, Side};

/// Local repair chosen while a red node has a red parent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum InsertCase {
    /// Parent and uncle are red: push the red up to the grandparent.
    RecolorUncle,
    /// Node and parent bend in opposite directions: rotate the parent so they
    /// line up, then continue as [`InsertCase::Line`].
    Triangle,
    /// Node and parent lean the same way: rotate the grandparent.
    Line,
}

/// Picks the insert repair from the uncle's color and the shape of the
/// grandparent → parent → node path.
pub(crate) const fn classify_insert(uncle: Color, parent_side: Side, node_side: Side) -> InsertCase {
    match uncle {
        Color::Red => InsertCase::RecolorUncle,
        Color::Black if parent_side as u8 == node_side as u8 => InsertCase::Line,
        Color::Black => InsertCase::Triangle,
    }
}

/// Local repair for a subtree that is one black node short.
///
/// "Near" is the sibling's child closest to the deficient subtree; "far" is the
/// other one.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum DeleteCase {
    /// Black parent, red sibling: rotate the sibling up so the deficient
    /// subtree gets a red parent and a black sibling.
    RedSibling,
    /// Red parent, black sibling with black children: trade colors between
    /// parent and sibling. Resolved.
    AbsorbIntoParent,
    /// Black parent, black sibling with black children: paint the sibling red,
    /// which moves the deficiency up to the parent.
    Propagate,
    /// Black sibling whose near child is red and far child is black: rotate the
    /// sibling so the red child becomes the far one.
    NearNephewRed,
    /// Black sibling whose far child is red: rotate the parent. Resolved.
    FarNephewRed,
}

impl DeleteCase {
    /// Whether applying this case ends the fix-up.
    pub(crate) const fn is_terminal(self) -> bool {
        matches!(self, DeleteCase::AbsorbIntoParent | DeleteCase::FarNephewRed)
    }
}

/// Picks the delete repair from the parent, sibling and nephew colors.
///
/// # Panics
///
/// Panics on a red parent with a red sibling, which a valid tree cannot hold.
pub(crate) fn classify_delete(parent: Color, sibling: Color, near: Color, far: Color) -> DeleteCase {
    match (parent, sibling, near, far) {
        (Color::Red, Color::Red, _, _) => unreachable!("red-red edge between parent and sibling during delete fix-up"),
        (Color::Black, Color::Red, _, _) => DeleteCase::RedSibling,
        (_, Color::Black, _, Color::Red) => DeleteCase::FarNephewRed,
        (_, Color::Black, Color::Red, Color::Black) => DeleteCase::NearNephewRed,
        (Color::Red, Color::Black, Color::Black, Color::Black) => DeleteCase::AbsorbIntoParent,
        (Color::Black, Color::Black, Color::Black, Color::Black) => DeleteCase::Propagate,
    }
}
