//! Node Data Structures
//!
//! This module defines the `Node` struct stored in the `nodes` table together
//! with the small value types the store hands back to the tree engine.
//!
//! # Architecture
//!
//! - **Parent pointers are authoritative**: `parent_id` is the single source of
//!   truth for the hierarchy
//! - **Closure rows are a projection**: `ClosureRow` mirrors the
//!   reflexive-transitive closure of the parent relation
//! - **Ids, not references**: related nodes are always addressed by `NodeId`
//!
//! # Examples
//!
//! ```rust
//! use orgtree_core::models::NewNode;
//!
//! let engineering = NewNode {
//!     name: "Engineering".to_string(),
//!     node_type: "department".to_string(),
//!     color: Some("#F6AF8E".to_string()),
//!     parent_id: Some(1),
//! };
//! assert!(engineering.parent_id.is_some());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Store-generated node identity
pub type NodeId = i64;

/// Validation errors for node input
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field '{field}' must not be blank")]
    BlankField { field: String },
}

/// A single node of the organization chart.
///
/// # Fields
///
/// - `id`: Store-generated identifier
/// - `name`: Display name (never blank)
/// - `node_type`: Free-form type tag (`"location"`, `"department"`, ...)
/// - `color`: CSS hex color, only present for color-bearing types
/// - `parent_id`: Parent node, `None` for roots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub node_type: String,
    pub color: Option<String>,
    pub parent_id: Option<NodeId>,
}

impl Node {
    /// Whether this node has no parent
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A node that has not been persisted yet (no id)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNode {
    pub name: String,
    pub node_type: String,
    pub color: Option<String>,
    pub parent_id: Option<NodeId>,
}

impl NewNode {
    /// Validate the fields the store cannot check on its own
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankField {
                field: "name".to_string(),
            });
        }
        if self.node_type.trim().is_empty() {
            return Err(ValidationError::BlankField {
                field: "nodeType".to_string(),
            });
        }
        Ok(())
    }
}

/// A node loaded together with its direct parent and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeWithRelations {
    pub node: Node,
    pub parent: Option<Node>,
    /// Direct children ordered by id
    pub children: Vec<Node>,
}

/// One row of the closure table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosureRow {
    pub ancestor_id: NodeId,
    pub descendant_id: NodeId,
}

impl ClosureRow {
    pub fn new(ancestor_id: NodeId, descendant_id: NodeId) -> Self {
        Self {
            ancestor_id,
            descendant_id,
        }
    }

    /// The (N, N) row every node owns
    pub fn is_reflexive(&self) -> bool {
        self.ancestor_id == self.descendant_id
    }
}
