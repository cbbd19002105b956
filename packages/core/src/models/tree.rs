//! Nested tree output
//!
//! Builds the forest returned by `TreeService::get_tree` from a flat list of
//! nodes using an adjacency list keyed by parent id. Children are ordered by
//! id so the result does not depend on row order.

use crate::models::{Node, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A node with its children populated recursively
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub node: Node,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Total number of nodes in this subtree, including `self`
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(tree) = stack.pop() {
            count += 1;
            stack.extend(tree.children.iter());
        }
        count
    }

    /// Search this subtree for a node by id
    pub fn find(&self, id: NodeId) -> Option<&TreeNode> {
        let mut stack = vec![self];
        while let Some(tree) = stack.pop() {
            if tree.node.id == id {
                return Some(tree);
            }
            stack.extend(tree.children.iter());
        }
        None
    }
}

// Chains can be arbitrarily deep; the default drop glue would recurse per level.
impl Drop for TreeNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut child) = pending.pop() {
            pending.append(&mut child.children);
        }
    }
}

/// A node whose children are still being assembled
struct Frame {
    node: Node,
    pending: std::vec::IntoIter<Node>,
    done: Vec<TreeNode>,
}

impl Frame {
    fn open(node: Node, adjacency_list: &mut HashMap<Option<NodeId>, Vec<Node>>) -> Self {
        let pending = adjacency_list
            .remove(&Some(node.id))
            .unwrap_or_default()
            .into_iter();
        Self {
            node,
            pending,
            done: Vec::new(),
        }
    }
}

/// Assemble a forest from a flat node list
///
/// Roots are nodes without a parent. A node whose parent is not in `nodes` is
/// unreachable and left out; the store never persists such a link.
///
/// Uses an explicit stack, so depth is bounded by memory rather than by the
/// thread's stack.
pub fn build_forest(nodes: Vec<Node>) -> Vec<TreeNode> {
    let mut adjacency_list: HashMap<Option<NodeId>, Vec<Node>> = HashMap::new();
    for node in nodes {
        adjacency_list.entry(node.parent_id).or_default().push(node);
    }
    for siblings in adjacency_list.values_mut() {
        siblings.sort_by_key(|n| n.id);
    }

    let roots = adjacency_list.remove(&None).unwrap_or_default();
    let mut forest = Vec::with_capacity(roots.len());

    for root in roots {
        let mut stack = vec![Frame::open(root, &mut adjacency_list)];
        while let Some(frame) = stack.last_mut() {
            match frame.pending.next() {
                Some(child) => {
                    let opened = Frame::open(child, &mut adjacency_list);
                    stack.push(opened);
                }
                None => {
                    let Some(Frame { node, done, .. }) = stack.pop() else {
                        break;
                    };
                    let tree = TreeNode {
                        node,
                        children: done,
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.done.push(tree),
                        None => forest.push(tree),
                    }
                }
            }
        }
    }

    forest
}

/// Flatten a forest back into `(parent_id, child_id)` edges, sorted
pub fn flatten_edges(forest: &[TreeNode]) -> Vec<(NodeId, NodeId)> {
    let mut edges = Vec::new();
    let mut stack: Vec<&TreeNode> = forest.iter().collect();
    while let Some(tree) = stack.pop() {
        for child in &tree.children {
            edges.push((tree.node.id, child.node.id));
            stack.push(child);
        }
    }
    edges.sort_unstable();
    edges
}
