//! Tree Service - Hierarchy Mutation Engine
//!
//! This module provides the business logic layer for the org tree:
//!
//! - Node creation with round-robin colors for color-bearing types
//! - Reparenting with shift (the subtree travels with the node)
//! - Reparenting without shift (children are re-homed to the node's original
//!   parent before the node moves)
//! - Deletion with shift (children are promoted) and without shift (the
//!   subtree is removed)
//! - Forest retrieval and closure-table backed ancestor/descendant queries
//!
//! # Consistency
//!
//! Every mutation runs inside one store transaction and under the service's
//! write lock. The parent pointer is written first, then the closure rows are
//! brought in line, then the transaction commits. Any error rolls back the
//! whole mutation, so callers never observe a half-applied move.

use crate::config::OrgTreeConfig;
use crate::db::{TreeStore, TreeTransaction};
use crate::models::{
    build_forest, ClosureRow, NewNode, Node, NodeId, NodeWithRelations, TreeNode,
};
use crate::services::color_assigner::ColorAssigner;
use crate::services::cycle_detector::would_cycle;
use crate::services::error::TreeServiceError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Parameters for creating a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeParams {
    /// Display name (must not be blank)
    #[serde(alias = "nodeName")]
    pub name: String,
    /// Type tag (e.g. "department", "location", "organization")
    pub node_type: String,
    /// Optional parent; `None` creates a root
    #[serde(default)]
    pub parent_id: Option<NodeId>,
}

impl CreateNodeParams {
    pub fn new(name: impl Into<String>, node_type: impl Into<String>, parent_id: Option<NodeId>) -> Self {
        Self {
            name: name.into(),
            node_type: node_type.into(),
            parent_id,
        }
    }
}

/// Hierarchy mutation engine
///
/// # Examples
///
/// ```no_run
/// # use orgtree_core::db::{DatabaseService, TursoStore};
/// # use orgtree_core::services::{CreateNodeParams, TreeService};
/// # use orgtree_core::OrgTreeConfig;
/// # use std::path::PathBuf;
/// # use std::sync::Arc;
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Arc::new(DatabaseService::new(PathBuf::from("./data/orgtree.db")).await?);
/// let service = TreeService::new(Arc::new(TursoStore::new(db)), &OrgTreeConfig::default())?;
///
/// let root = service
///     .create_node(CreateNodeParams::new("Acme", "organization", None))
///     .await?;
/// let sales = service
///     .create_node(CreateNodeParams::new("Sales", "department", Some(root.id)))
///     .await?;
/// assert!(sales.color.is_some());
/// # Ok(())
/// # }
/// ```
pub struct TreeService {
    store: Arc<dyn TreeStore>,
    colors: ColorAssigner,
    color_bearing_types: HashSet<String>,
    /// Serializes mutations so a cycle check and the writes it guards
    /// cannot interleave with another mutation
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for TreeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeService")
            .field("colors", &self.colors)
            .field("color_bearing_types", &self.color_bearing_types)
            .finish_non_exhaustive()
    }
}

impl TreeService {
    /// Create a TreeService over the given store
    ///
    /// # Errors
    ///
    /// Returns `Initialization` if the configuration does not validate.
    pub fn new(store: Arc<dyn TreeStore>, config: &OrgTreeConfig) -> Result<Self, TreeServiceError> {
        config
            .validate()
            .map_err(TreeServiceError::initialization_error)?;

        let colors = ColorAssigner::new(config.palette.clone()).ok_or_else(|| {
            TreeServiceError::initialization_error("palette must contain at least one color")
        })?;

        Ok(Self {
            store,
            colors,
            color_bearing_types: config.color_bearing_types.iter().cloned().collect(),
            write_lock: Mutex::new(()),
        })
    }

    /// Whether nodes of this type receive a palette color
    pub fn is_color_bearing(&self, node_type: &str) -> bool {
        self.color_bearing_types.contains(node_type)
    }

    /// Create a node, optionally under an existing parent
    ///
    /// # Errors
    ///
    /// - `Validation` for a blank name or type
    /// - `ParentNotFound` if `parent_id` does not exist
    /// - `CycleDetected` if the parent's ancestor chain already loops
    pub async fn create_node(&self, params: CreateNodeParams) -> Result<Node, TreeServiceError> {
        let _guard = self.write_lock.lock().await;
        let tx = self.store.begin().await?;
        let result = self.create_in(&*tx, params).await;
        finish(tx, result).await
    }

    /// Move a node together with its whole subtree under `new_parent_id`
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` / `ParentNotFound`
    /// - `CycleDetected` if `new_parent_id` is the node or one of its descendants
    pub async fn reparent_with_shift(
        &self,
        node_id: NodeId,
        new_parent_id: NodeId,
    ) -> Result<Node, TreeServiceError> {
        let _guard = self.write_lock.lock().await;
        let tx = self.store.begin().await?;
        let result = self
            .reparent_with_shift_in(&*tx, node_id, new_parent_id)
            .await;
        finish(tx, result).await
    }

    /// Move a single node under `new_parent_id`, leaving its children behind
    ///
    /// The node's children are re-homed to the node's original parent, or
    /// become roots when the node had none. Validation is identical to
    /// [`TreeService::reparent_with_shift`] and happens before any write.
    pub async fn reparent_without_shift(
        &self,
        node_id: NodeId,
        new_parent_id: NodeId,
    ) -> Result<Node, TreeServiceError> {
        let _guard = self.write_lock.lock().await;
        let tx = self.store.begin().await?;
        let result = self
            .reparent_without_shift_in(&*tx, node_id, new_parent_id)
            .await;
        finish(tx, result).await
    }

    /// Delete a node and promote its direct children to the node's parent
    pub async fn delete_with_shift(&self, node_id: NodeId) -> Result<(), TreeServiceError> {
        let _guard = self.write_lock.lock().await;
        let tx = self.store.begin().await?;
        let result = self.delete_with_shift_in(&*tx, node_id).await;
        finish(tx, result).await
    }

    /// Delete a node together with its whole subtree
    pub async fn delete_without_shift(&self, node_id: NodeId) -> Result<(), TreeServiceError> {
        let _guard = self.write_lock.lock().await;
        let tx = self.store.begin().await?;
        let result = self.delete_without_shift_in(&*tx, node_id).await;
        finish(tx, result).await
    }

    /// The full forest, roots and siblings ordered by id
    pub async fn get_tree(&self) -> Result<Vec<TreeNode>, TreeServiceError> {
        let tx = self.store.begin_read().await?;
        let result = tx.find_all().await.map_err(TreeServiceError::from);
        let nodes = finish(tx, result).await?;
        Ok(build_forest(nodes))
    }

    /// Get a node by id
    pub async fn get_node(&self, id: NodeId) -> Result<Node, TreeServiceError> {
        let tx = self.store.begin_read().await?;
        let result = require_node(&*tx, id).await;
        finish(tx, result).await
    }

    /// Strict ancestors of a node, nearest first
    pub async fn get_ancestors(&self, id: NodeId) -> Result<Vec<Node>, TreeServiceError> {
        let tx = self.store.begin_read().await?;
        let result = ancestors_in(&*tx, id).await;
        finish(tx, result).await
    }

    /// Strict descendants of a node, ordered by id
    pub async fn get_descendants(&self, id: NodeId) -> Result<Vec<Node>, TreeServiceError> {
        let tx = self.store.begin_read().await?;
        let result = descendants_in(&*tx, id).await;
        finish(tx, result).await
    }

    /// Snapshot of the closure table
    pub async fn closure_rows(&self) -> Result<Vec<ClosureRow>, TreeServiceError> {
        let tx = self.store.begin_read().await?;
        let result = tx.all_rows().await.map_err(TreeServiceError::from);
        finish(tx, result).await
    }

    async fn create_in(
        &self,
        tx: &dyn TreeTransaction,
        params: CreateNodeParams,
    ) -> Result<Node, TreeServiceError> {
        let mut new_node = NewNode {
            name: params.name,
            node_type: params.node_type,
            color: None,
            parent_id: params.parent_id,
        };
        new_node.validate()?;

        if let Some(parent_id) = new_node.parent_id {
            let parent = tx
                .find_by_id(parent_id)
                .await?
                .ok_or_else(|| TreeServiceError::parent_not_found(parent_id))?;

            if would_cycle(tx, parent.parent_id, parent.id).await? {
                return Err(TreeServiceError::cycle_detected(format!(
                    "ancestor chain of parent {} loops back to itself",
                    parent.id
                )));
            }
        }

        if self.is_color_bearing(&new_node.node_type) {
            new_node.color = Some(self.colors.assign().to_string());
        }

        let node = tx.insert(new_node).await?;
        tx.attach_leaf(node.id, node.parent_id).await?;

        tracing::info!(
            "Created node (ID: {}) '{}' of type '{}' under {:?}",
            node.id,
            node.name,
            node.node_type,
            node.parent_id
        );
        Ok(node)
    }

    async fn reparent_with_shift_in(
        &self,
        tx: &dyn TreeTransaction,
        node_id: NodeId,
        new_parent_id: NodeId,
    ) -> Result<Node, TreeServiceError> {
        let (loaded, new_parent) = validate_and_fetch_nodes(tx, node_id, new_parent_id).await?;

        let mut node = loaded.node;
        node.parent_id = Some(new_parent.id);
        tx.save(&node).await?;
        tx.move_subtree(node.id, Some(new_parent.id)).await?;

        tracing::info!(
            "Moved node (ID: {}) with its subtree to newParent (ID: {})",
            node_id,
            new_parent_id
        );
        Ok(node)
    }

    async fn reparent_without_shift_in(
        &self,
        tx: &dyn TreeTransaction,
        node_id: NodeId,
        new_parent_id: NodeId,
    ) -> Result<Node, TreeServiceError> {
        let (loaded, new_parent) = validate_and_fetch_nodes(tx, node_id, new_parent_id).await?;
        let NodeWithRelations {
            mut node,
            parent: original_parent,
            children,
        } = loaded;
        let original_parent_id = original_parent.map(|p| p.id);

        match original_parent_id {
            Some(parent_id) => tracing::info!(
                "Reassigning children of nodeId {} to originalParent with ID: {}",
                node_id,
                parent_id
            ),
            None if !children.is_empty() => tracing::warn!(
                "No original parent found for nodeId: {}, promoting {} children to roots",
                node_id,
                children.len()
            ),
            None => {}
        }
        rehome_children(tx, children, original_parent_id).await?;

        node.parent_id = Some(new_parent.id);
        tx.save(&node).await?;
        let new_chain = tx.ancestors_of(new_parent.id).await?;
        tx.rewrite_descendant(node.id, &new_chain).await?;

        tracing::info!(
            "Moved node (ID: {}) to newParent (ID: {})",
            node_id,
            new_parent_id
        );
        Ok(node)
    }

    async fn delete_with_shift_in(
        &self,
        tx: &dyn TreeTransaction,
        node_id: NodeId,
    ) -> Result<(), TreeServiceError> {
        let loaded = tx
            .find_by_id_with_children_and_parent(node_id)
            .await?
            .ok_or_else(|| TreeServiceError::node_not_found(node_id))?;
        let original_parent_id = loaded.parent.map(|p| p.id);

        match original_parent_id {
            Some(parent_id) => tracing::info!(
                "Shifting children of nodeId {} to original parent (ID: {})",
                node_id,
                parent_id
            ),
            None if !loaded.children.is_empty() => tracing::warn!(
                "Node {} has no parent; its {} children become roots",
                node_id,
                loaded.children.len()
            ),
            None => {}
        }
        rehome_children(tx, loaded.children, original_parent_id).await?;

        tx.remove_all_rows_for(&[node_id]).await?;
        tx.remove_many(&[node_id]).await?;

        tracing::info!(
            "Node {} deleted with children shifted to original parent.",
            node_id
        );
        Ok(())
    }

    async fn delete_without_shift_in(
        &self,
        tx: &dyn TreeTransaction,
        node_id: NodeId,
    ) -> Result<(), TreeServiceError> {
        require_node(tx, node_id).await?;

        let mut subtree = tx.descendants_of(node_id).await?;
        if !subtree.contains(&node_id) {
            subtree.push(node_id);
        }

        tracing::info!(
            "Deleting node {} along with {} descendants",
            node_id,
            subtree.len() - 1
        );
        tx.remove_all_rows_for(&subtree).await?;
        tx.remove_many(&subtree).await?;

        tracing::info!("Node {} and all its descendants have been deleted.", node_id);
        Ok(())
    }
}

/// Commit on success, roll back on failure
async fn finish<T>(
    tx: Box<dyn TreeTransaction>,
    result: Result<T, TreeServiceError>,
) -> Result<T, TreeServiceError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!("Rollback after '{}' failed: {}", e, rollback_err);
            }
            Err(e)
        }
    }
}

async fn require_node(tx: &dyn TreeTransaction, id: NodeId) -> Result<Node, TreeServiceError> {
    tx.find_by_id(id)
        .await?
        .ok_or_else(|| TreeServiceError::node_not_found(id))
}

async fn ancestors_in(tx: &dyn TreeTransaction, id: NodeId) -> Result<Vec<Node>, TreeServiceError> {
    require_node(tx, id).await?;
    let ids: Vec<NodeId> = tx
        .ancestors_of(id)
        .await?
        .into_iter()
        .filter(|&a| a != id)
        .collect();

    // find_many orders by id; restore nearest-first
    let mut by_id: HashMap<NodeId, Node> = tx
        .find_many(&ids)
        .await?
        .into_iter()
        .map(|n| (n.id, n))
        .collect();
    Ok(ids.iter().filter_map(|a| by_id.remove(a)).collect())
}

async fn descendants_in(tx: &dyn TreeTransaction, id: NodeId) -> Result<Vec<Node>, TreeServiceError> {
    require_node(tx, id).await?;
    let ids: Vec<NodeId> = tx
        .descendants_of(id)
        .await?
        .into_iter()
        .filter(|&d| d != id)
        .collect();
    Ok(tx.find_many(&ids).await?)
}

/// Shared validation of both reparent strategies
async fn validate_and_fetch_nodes(
    tx: &dyn TreeTransaction,
    node_id: NodeId,
    new_parent_id: NodeId,
) -> Result<(NodeWithRelations, Node), TreeServiceError> {
    let loaded = tx
        .find_by_id_with_children_and_parent(node_id)
        .await?
        .ok_or_else(|| TreeServiceError::node_not_found(node_id))?;

    let new_parent = tx
        .find_by_id(new_parent_id)
        .await?
        .ok_or_else(|| TreeServiceError::parent_not_found(new_parent_id))?;

    if would_cycle(tx, Some(new_parent.id), node_id).await? {
        return Err(TreeServiceError::cycle_detected(format!(
            "cannot move node {} under node {}: it is the node itself or one of its descendants",
            node_id, new_parent_id
        )));
    }

    Ok((loaded, new_parent))
}

/// Point every child at `new_parent_id` and carry its subtree's closure rows along
async fn rehome_children(
    tx: &dyn TreeTransaction,
    mut children: Vec<Node>,
    new_parent_id: Option<NodeId>,
) -> Result<(), TreeServiceError> {
    for child in &mut children {
        child.parent_id = new_parent_id;
    }
    tx.save_many(&children).await?;

    for child in &children {
        tx.move_subtree(child.id, new_parent_id).await?;
        tracing::info!(
            "Updated child (ID: {}) parent to {:?}",
            child.id,
            new_parent_id
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "tree_service_test.rs"]
mod tree_service_test;
