//! Data Models
//!
//! - [`Node`] and friends: what the store persists
//! - [`TreeNode`]: nested forest output

mod node;
mod tree;

pub use node::{ClosureRow, NewNode, Node, NodeId, NodeWithRelations, ValidationError};
pub use tree::{build_forest, flatten_edges, TreeNode};
