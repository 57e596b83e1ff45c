use smallvec::{SmallVec, smallvec};

use super::handle::Handle;
use super::node::Side;
use super::raw_osrb_tree::RawOSRBTree;
use crate::error::InvariantViolation;

impl<K: Ord, V> RawOSRBTree<K, V> {
    /// Checks every structural invariant and returns the black height.
    ///
    /// Walks the tree with explicit stacks, so a corrupt (possibly very deep)
    /// tree is reported rather than overflowing the call stack.
    pub(crate) fn validate(&self) -> Result<usize, InvariantViolation> {
        let Some(root) = self.root() else {
            return Ok(0);
        };

        let root_node = self.node(root);
        if root_node.is_red() {
            return Err(InvariantViolation::RedRoot);
        }
        if root_node.parent.is_some() {
            return Err(InvariantViolation::ParentLink);
        }

        let mut black_height = None;
        // (node, black nodes from the root down to and including it)
        let mut stack: SmallVec<[(Handle, usize); 32]> = smallvec![(root, 1)];

        while let Some((handle, blacks)) = stack.pop() {
            let node = self.node(handle);
            if node.values.is_empty() {
                return Err(InvariantViolation::EmptyBag);
            }

            let actual = node.bag_len() + self.size_of(node.left()) + self.size_of(node.right());
            if node.size != actual {
                return Err(InvariantViolation::SizeMismatch {
                    cached: node.size,
                    actual,
                });
            }

            for side in [Side::Left, Side::Right] {
                let Some(child) = node.child(side) else {
                    match black_height {
                        None => black_height = Some(blacks),
                        Some(expected) if expected != blacks => {
                            return Err(InvariantViolation::BlackHeightMismatch { expected, found: blacks });
                        }
                        Some(_) => {}
                    }
                    continue;
                };

                let child_node = self.node(child);
                if child_node.parent != Some(handle) {
                    return Err(InvariantViolation::ParentLink);
                }
                if node.is_red() && child_node.is_red() {
                    return Err(InvariantViolation::RedRedEdge);
                }
                stack.push((child, blacks + usize::from(!child_node.is_red())));
            }
        }

        let mut previous = None;
        for (_, node) in self.nodes() {
            if previous.is_some_and(|key| key >= &node.key) {
                return Err(InvariantViolation::KeyOrder);
            }
            previous = Some(&node.key);
        }

        Ok(black_height.unwrap_or(0))
    }
}
