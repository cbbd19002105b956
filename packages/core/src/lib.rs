//! OrgTree Core Business Logic Layer
//!
//! This crate maintains a forest of organizational nodes (organizations,
//! departments, locations, teams) together with a closure table that answers
//! ancestor and descendant queries without recursion.
//!
//! # Architecture
//!
//! - **Parent pointers are authoritative**: each node stores its `parent_id`;
//!   the closure table is derived data kept in lock-step inside every mutation
//! - **libsql/Turso**: Embedded SQLite-compatible database
//! - **One transaction per mutation**: a failed move or delete leaves no trace
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, NewNode, TreeNode, ClosureRow)
//! - [`services`] - Business services (TreeService, ColorAssigner, cycle detection)
//! - [`db`] - Database layer with libsql integration
//! - [`config`] - Database location, palette and color-bearing types

pub mod config;
pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::OrgTreeConfig;
pub use models::*;
pub use services::*;
