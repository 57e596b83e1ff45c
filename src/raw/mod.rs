mod arena;
mod fixup;
mod handle;
mod node;
mod nodes;
mod raw_osrb_tree;
mod validate;

pub(crate) use node::Bag;
pub(crate) use nodes::Nodes;
pub(crate) use raw_osrb_tree::RawOSRBTree;
