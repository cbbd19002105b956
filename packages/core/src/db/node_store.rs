//! Store Traits - Database Abstraction Layer
//!
//! This module defines the persistence contract the tree engine relies on.
//! It separates the authoritative parent-pointer storage (`NodeStore`) from
//! its materialized projection (`ClosureTable`) so that every consistency
//! step is spelled out in `TreeService` rather than hidden in the backend.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async so a network backend can slot in
//! 2. **Transaction-scoped**: Row-level methods live on `TreeTransaction`; the
//!    only way to reach them is `TreeStore::begin()`, so every mutation is
//!    all-or-nothing
//! 3. **Error Handling**: Row operations use `anyhow::Result` for flexible
//!    error context; transaction control uses `DatabaseError`
//!
//! # Examples
//!
//! ```rust,no_run
//! use orgtree_core::db::{DatabaseService, NodeStore, TreeStore, TursoStore};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/orgtree.db")).await?);
//!     let store = TursoStore::new(db);
//!
//!     let tx = store.begin().await?;
//!     let roots = tx.find_all().await?;
//!     tx.commit().await?;
//!     println!("{} nodes", roots.len());
//!     Ok(())
//! }
//! ```

use crate::db::DatabaseError;
use crate::models::{ClosureRow, NewNode, Node, NodeId, NodeWithRelations};
use anyhow::Result;
use async_trait::async_trait;

/// Durable keyed storage for nodes and their parent links
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Get node by ID
    ///
    /// - `Ok(Some(node))` if node exists
    /// - `Ok(None)` if node doesn't exist (not an error)
    async fn find_by_id(&self, id: NodeId) -> Result<Option<Node>>;

    /// Get node by ID together with its parent and direct children
    async fn find_by_id_with_children_and_parent(
        &self,
        id: NodeId,
    ) -> Result<Option<NodeWithRelations>>;

    /// Insert a new node and return it with its generated id
    async fn insert(&self, node: NewNode) -> Result<Node>;

    /// Persist name, type, color and parent of an existing node
    ///
    /// # Errors
    ///
    /// Returns error if the node does not exist or the parent reference
    /// violates the foreign key.
    async fn save(&self, node: &Node) -> Result<()>;

    /// Persist several existing nodes
    async fn save_many(&self, nodes: &[Node]) -> Result<()>;

    /// Remove nodes in one statement, returns the number of rows removed
    async fn remove_many(&self, ids: &[NodeId]) -> Result<u64>;

    /// All nodes ordered by id
    async fn find_all(&self) -> Result<Vec<Node>>;

    /// Nodes with the given ids, ordered by id. Unknown ids are skipped.
    async fn find_many(&self, ids: &[NodeId]) -> Result<Vec<Node>>;

    /// Number of stored nodes
    async fn count(&self) -> Result<u64>;
}

/// Materialized (ancestor, descendant) pairs of the parent relation
#[async_trait]
pub trait ClosureTable: Send + Sync {
    /// Ancestors of `id`, including `id`, ordered nearest-first
    async fn ancestors_of(&self, id: NodeId) -> Result<Vec<NodeId>>;

    /// Descendants of `id`, including `id`, ordered by id
    async fn descendants_of(&self, id: NodeId) -> Result<Vec<NodeId>>;

    /// Add rows for a freshly inserted leaf: the parent's ancestor rows with
    /// `id` as descendant, plus `(id, id)`
    async fn attach_leaf(&self, id: NodeId, parent_id: Option<NodeId>) -> Result<()>;

    /// Replace every non-reflexive row whose descendant is `id` with one row
    /// per entry of `new_ancestor_chain`
    ///
    /// Only valid for nodes without descendants.
    async fn rewrite_descendant(&self, id: NodeId, new_ancestor_chain: &[NodeId]) -> Result<()>;

    /// Re-hang the subtree rooted at `id` below `new_parent_id`
    ///
    /// Removes rows linking the subtree to its former strict ancestors, then
    /// links every subtree member to every ancestor of the new parent.
    /// `None` makes the subtree a separate tree.
    async fn move_subtree(&self, id: NodeId, new_parent_id: Option<NodeId>) -> Result<()>;

    /// Remove every row naming any of `ids` as ancestor or descendant
    async fn remove_all_rows_for(&self, ids: &[NodeId]) -> Result<u64>;

    /// Full table, sorted
    async fn all_rows(&self) -> Result<Vec<ClosureRow>>;
}

/// A unit of work spanning node and closure writes
#[async_trait]
pub trait TreeTransaction: NodeStore + ClosureTable {
    /// Make every write of this transaction durable
    async fn commit(self: Box<Self>) -> Result<(), DatabaseError>;

    /// Discard every write of this transaction
    async fn rollback(self: Box<Self>) -> Result<(), DatabaseError>;
}

/// Entry point to transactional access
#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Start a write-capable transaction
    ///
    /// The write lock is taken up front so the reads a mutation validates
    /// against cannot go stale before its writes land.
    async fn begin(&self) -> Result<Box<dyn TreeTransaction>, DatabaseError>;

    /// Start a transaction for a consistent read snapshot
    async fn begin_read(&self) -> Result<Box<dyn TreeTransaction>, DatabaseError> {
        self.begin().await
    }
}
