//! TursoStore - Store Implementation for Turso/libsql Backend
//!
//! This module implements `TreeStore`, `NodeStore` and `ClosureTable` on top
//! of `DatabaseService`.
//!
//! # Design Principles
//!
//! 1. **One connection per transaction**: `begin()` opens a connection with
//!    busy timeout and foreign keys configured, then issues `BEGIN IMMEDIATE`
//! 2. **Row Conversion**: Handles libsql::Row → Node model conversion
//! 3. **Set-based closure maintenance**: subtree moves are two statements
//!    regardless of subtree size
//! 4. **Id lists as JSON**: bulk statements bind a JSON array and expand it
//!    with `json_each`, keeping SQL text static
//!
//! # Examples
//!
//! ```rust,no_run
//! use orgtree_core::db::{DatabaseService, TreeStore, TursoStore};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/test.db")).await?);
//!     let store: Arc<dyn TreeStore> = Arc::new(TursoStore::new(db));
//!     let tx = store.begin().await?;
//!     tx.rollback().await?;
//!     Ok(())
//! }
//! ```

use crate::db::node_store::{ClosureTable, NodeStore, TreeStore, TreeTransaction};
use crate::db::{DatabaseError, DatabaseService};
use crate::models::{ClosureRow, NewNode, Node, NodeId, NodeWithRelations};
use anyhow::{Context, Result};
use async_trait::async_trait;
use libsql::params::IntoParams;
use libsql::{Connection, Row};
use std::sync::Arc;

const NODE_COLUMNS: &str = "id, name, node_type, color, parent_id";

/// TursoStore implements `TreeStore` for the Turso/libsql backend
#[derive(Debug, Clone)]
pub struct TursoStore {
    db: Arc<DatabaseService>,
}

impl TursoStore {
    /// Create a new TursoStore wrapper
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    async fn open(&self, begin_sql: &str) -> Result<Box<dyn TreeTransaction>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute(begin_sql, ())
            .await
            .map_err(|e| DatabaseError::transaction("begin", e))?;
        Ok(Box::new(TursoTransaction { conn }))
    }
}

#[async_trait]
impl TreeStore for TursoStore {
    async fn begin(&self) -> Result<Box<dyn TreeTransaction>, DatabaseError> {
        self.open("BEGIN IMMEDIATE").await
    }

    async fn begin_read(&self) -> Result<Box<dyn TreeTransaction>, DatabaseError> {
        self.open("BEGIN DEFERRED").await
    }
}

/// An open libsql transaction
///
/// Dropping it without `commit()` closes the connection, which makes SQLite
/// discard the pending writes.
pub struct TursoTransaction {
    conn: Connection,
}

impl TursoTransaction {
    /// Convert libsql::Row to Node model
    ///
    /// Expected columns (in order): id, name, node_type, color, parent_id
    fn row_to_node(row: &Row) -> Result<Node> {
        let id: i64 = row.get(0).context("Failed to get id")?;
        let name: String = row.get(1).context("Failed to get name")?;
        let node_type: String = row.get(2).context("Failed to get node_type")?;
        let color: Option<String> = row.get(3).context("Failed to get color")?;
        let parent_id: Option<i64> = row.get(4).context("Failed to get parent_id")?;

        Ok(Node {
            id,
            name,
            node_type,
            color,
            parent_id,
        })
    }

    async fn query_nodes(&self, sql: &str, params: impl IntoParams) -> Result<Vec<Node>> {
        let mut rows = self
            .conn
            .query(sql, params)
            .await
            .with_context(|| format!("Failed to execute query: {}", sql))?;

        let mut nodes = Vec::new();
        while let Some(row) = rows.next().await.context("Failed to read node row")? {
            nodes.push(Self::row_to_node(&row)?);
        }
        Ok(nodes)
    }

    async fn query_ids(&self, sql: &str, params: impl IntoParams) -> Result<Vec<NodeId>> {
        let mut rows = self
            .conn
            .query(sql, params)
            .await
            .with_context(|| format!("Failed to execute query: {}", sql))?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next().await.context("Failed to read id row")? {
            ids.push(row.get::<i64>(0).context("Failed to get id")?);
        }
        Ok(ids)
    }

    fn id_list(ids: &[NodeId]) -> Result<String> {
        serde_json::to_string(ids).context("Failed to encode id list")
    }
}

#[async_trait]
impl NodeStore for TursoTransaction {
    async fn find_by_id(&self, id: NodeId) -> Result<Option<Node>> {
        let sql = format!("SELECT {} FROM nodes WHERE id = ?", NODE_COLUMNS);
        Ok(self.query_nodes(&sql, [id]).await?.into_iter().next())
    }

    async fn find_by_id_with_children_and_parent(
        &self,
        id: NodeId,
    ) -> Result<Option<NodeWithRelations>> {
        let Some(node) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let parent = match node.parent_id {
            Some(parent_id) => Some(self.find_by_id(parent_id).await?.with_context(|| {
                format!("Node {} references missing parent {}", id, parent_id)
            })?),
            None => None,
        };

        let sql = format!(
            "SELECT {} FROM nodes WHERE parent_id = ? ORDER BY id",
            NODE_COLUMNS
        );
        let children = self.query_nodes(&sql, [id]).await?;

        Ok(Some(NodeWithRelations {
            node,
            parent,
            children,
        }))
    }

    async fn insert(&self, node: NewNode) -> Result<Node> {
        self.conn
            .execute(
                "INSERT INTO nodes (name, node_type, color, parent_id) VALUES (?, ?, ?, ?)",
                (
                    node.name.as_str(),
                    node.node_type.as_str(),
                    node.color.as_deref(),
                    node.parent_id,
                ),
            )
            .await
            .with_context(|| format!("Failed to insert node '{}'", node.name))?;

        let id = self.conn.last_insert_rowid();
        Ok(Node {
            id,
            name: node.name,
            node_type: node.node_type,
            color: node.color,
            parent_id: node.parent_id,
        })
    }

    async fn save(&self, node: &Node) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "UPDATE nodes SET name = ?, node_type = ?, color = ?, parent_id = ? WHERE id = ?",
                (
                    node.name.as_str(),
                    node.node_type.as_str(),
                    node.color.as_deref(),
                    node.parent_id,
                    node.id,
                ),
            )
            .await
            .with_context(|| format!("Failed to save node {}", node.id))?;

        if rows_affected == 0 {
            anyhow::bail!("Cannot save node {}: it does not exist", node.id);
        }
        Ok(())
    }

    async fn save_many(&self, nodes: &[Node]) -> Result<()> {
        for node in nodes {
            self.save(node).await?;
        }
        Ok(())
    }

    async fn remove_many(&self, ids: &[NodeId]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.conn
            .execute(
                "DELETE FROM nodes WHERE id IN (SELECT value FROM json_each(?))",
                [Self::id_list(ids)?],
            )
            .await
            .context("Failed to remove nodes")
    }

    async fn find_all(&self) -> Result<Vec<Node>> {
        let sql = format!("SELECT {} FROM nodes ORDER BY id", NODE_COLUMNS);
        self.query_nodes(&sql, ()).await
    }

    async fn find_many(&self, ids: &[NodeId]) -> Result<Vec<Node>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM nodes WHERE id IN (SELECT value FROM json_each(?)) ORDER BY id",
            NODE_COLUMNS
        );
        self.query_nodes(&sql, [Self::id_list(ids)?]).await
    }

    async fn count(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM nodes", ())
            .await
            .context("Failed to count nodes")?;
        let row = rows
            .next()
            .await?
            .context("COUNT(*) returned no row")?;
        let count: i64 = row.get(0).context("Failed to get count")?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl ClosureTable for TursoTransaction {
    async fn ancestors_of(&self, id: NodeId) -> Result<Vec<NodeId>> {
        // An ancestor's depth is its own ancestor count; deepest is nearest.
        self.query_ids(
            "SELECT c.ancestor_id FROM node_closure c
             WHERE c.descendant_id = ?1
             ORDER BY (SELECT COUNT(*) FROM node_closure d WHERE d.descendant_id = c.ancestor_id) DESC",
            [id],
        )
        .await
    }

    async fn descendants_of(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.query_ids(
            "SELECT descendant_id FROM node_closure WHERE ancestor_id = ? ORDER BY descendant_id",
            [id],
        )
        .await
    }

    async fn attach_leaf(&self, id: NodeId, parent_id: Option<NodeId>) -> Result<()> {
        match parent_id {
            Some(parent_id) => {
                self.conn
                    .execute(
                        "INSERT INTO node_closure (ancestor_id, descendant_id)
                         SELECT ancestor_id, ?1 FROM node_closure WHERE descendant_id = ?2
                         UNION ALL SELECT ?1, ?1",
                        (id, parent_id),
                    )
                    .await
                    .with_context(|| format!("Failed to attach closure rows for node {}", id))?;
            }
            None => {
                self.conn
                    .execute(
                        "INSERT INTO node_closure (ancestor_id, descendant_id) VALUES (?1, ?1)",
                        [id],
                    )
                    .await
                    .with_context(|| format!("Failed to attach closure rows for node {}", id))?;
            }
        }
        tracing::debug!("Attached closure rows for node {} under {:?}", id, parent_id);
        Ok(())
    }

    async fn rewrite_descendant(&self, id: NodeId, new_ancestor_chain: &[NodeId]) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM node_closure WHERE descendant_id = ?1 AND ancestor_id != ?1",
                [id],
            )
            .await
            .with_context(|| format!("Failed to clear ancestor rows of node {}", id))?;

        self.conn
            .execute(
                "INSERT OR IGNORE INTO node_closure (ancestor_id, descendant_id) VALUES (?1, ?1)",
                [id],
            )
            .await
            .with_context(|| format!("Failed to ensure reflexive row of node {}", id))?;

        for &ancestor_id in new_ancestor_chain.iter().filter(|&&a| a != id) {
            self.conn
                .execute(
                    "INSERT OR IGNORE INTO node_closure (ancestor_id, descendant_id) VALUES (?, ?)",
                    (ancestor_id, id),
                )
                .await
                .with_context(|| {
                    format!("Failed to link node {} to ancestor {}", id, ancestor_id)
                })?;
        }

        tracing::debug!(
            "Rewrote closure rows of node {} with {} ancestors",
            id,
            new_ancestor_chain.len()
        );
        Ok(())
    }

    async fn move_subtree(&self, id: NodeId, new_parent_id: Option<NodeId>) -> Result<()> {
        let detached = self
            .conn
            .execute(
                "DELETE FROM node_closure
                 WHERE descendant_id IN (SELECT descendant_id FROM node_closure WHERE ancestor_id = ?1)
                   AND ancestor_id NOT IN (SELECT descendant_id FROM node_closure WHERE ancestor_id = ?1)",
                [id],
            )
            .await
            .with_context(|| format!("Failed to detach subtree of node {}", id))?;

        let attached = match new_parent_id {
            Some(parent_id) => self
                .conn
                .execute(
                    "INSERT INTO node_closure (ancestor_id, descendant_id)
                     SELECT supertree.ancestor_id, subtree.descendant_id
                     FROM node_closure AS supertree
                     CROSS JOIN node_closure AS subtree
                     WHERE supertree.descendant_id = ?1 AND subtree.ancestor_id = ?2",
                    (parent_id, id),
                )
                .await
                .with_context(|| {
                    format!("Failed to attach subtree of node {} under {}", id, parent_id)
                })?,
            None => 0,
        };

        tracing::debug!(
            "Moved subtree of node {} under {:?} ({} rows removed, {} added)",
            id,
            new_parent_id,
            detached,
            attached
        );
        Ok(())
    }

    async fn remove_all_rows_for(&self, ids: &[NodeId]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.conn
            .execute(
                "DELETE FROM node_closure
                 WHERE ancestor_id IN (SELECT value FROM json_each(?1))
                    OR descendant_id IN (SELECT value FROM json_each(?1))",
                [Self::id_list(ids)?],
            )
            .await
            .context("Failed to remove closure rows")
    }

    async fn all_rows(&self) -> Result<Vec<ClosureRow>> {
        let mut rows = self
            .conn
            .query(
                "SELECT ancestor_id, descendant_id FROM node_closure
                 ORDER BY ancestor_id, descendant_id",
                (),
            )
            .await
            .context("Failed to read closure table")?;

        let mut result = Vec::new();
        while let Some(row) = rows.next().await.context("Failed to read closure row")? {
            result.push(ClosureRow::new(
                row.get(0).context("Failed to get ancestor_id")?,
                row.get(1).context("Failed to get descendant_id")?,
            ));
        }
        Ok(result)
    }
}

#[async_trait]
impl TreeTransaction for TursoTransaction {
    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            let _rollback = self.conn.execute("ROLLBACK", ()).await;
            return Err(DatabaseError::transaction("commit", e));
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DatabaseError> {
        self.conn
            .execute("ROLLBACK", ())
            .await
            .map_err(|e| DatabaseError::transaction("roll back", e))?;
        Ok(())
    }
}
