//! Database Layer
//!
//! This module handles all database interactions using libsql:
//!
//! - Database initialization and connection management
//! - The `nodes` table holding authoritative parent pointers
//! - The `node_closure` table holding every (ancestor, descendant) pair
//! - Transactional access through the `TreeStore` trait
//!
//! # Architecture
//!
//! `TreeService` only sees the traits in [`node_store`]. `TursoStore` is the
//! libsql implementation used in production and in tests.

mod database;
mod error;
mod node_store;
mod turso_store;

pub use database::DatabaseService;
pub use error::DatabaseError;
pub use node_store::{ClosureTable, NodeStore, TreeStore, TreeTransaction};
pub use turso_store::{TursoStore, TursoTransaction};
