//! Service Layer Error Types
//!
//! This module defines error types for tree operations. Cycle violations use
//! a single `CycleDetected` kind whether they surface during creation or
//! during either reparenting strategy.

use crate::db::DatabaseError;
use crate::models::{NodeId, ValidationError};
use thiserror::Error;

/// Tree operation errors
#[derive(Error, Debug)]
pub enum TreeServiceError {
    /// Node not found by ID
    #[error("Node with ID {id} not found")]
    NodeNotFound { id: NodeId },

    /// Requested parent does not exist
    #[error("Parent node with ID {id} not found")]
    ParentNotFound { id: NodeId },

    /// Proposed parent link would create a cycle
    #[error("Cycle detected: {context}")]
    CycleDetected { context: String },

    /// Malformed input
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Ancestor walk exceeded the node count
    #[error("Corrupt hierarchy: ancestor walk from node {start} exceeded {bound} steps")]
    CorruptGraph { start: NodeId, bound: u64 },

    /// Service could not be constructed from its configuration
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// Database connection or transaction failure
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    /// Row-level store failure
    #[error("Storage operation failed: {0}")]
    Storage(#[from] anyhow::Error),
}

impl TreeServiceError {
    /// Create a node not found error
    pub fn node_not_found(id: NodeId) -> Self {
        Self::NodeNotFound { id }
    }

    /// Create a parent not found error
    pub fn parent_not_found(id: NodeId) -> Self {
        Self::ParentNotFound { id }
    }

    /// Create a cycle error
    pub fn cycle_detected(context: impl Into<String>) -> Self {
        Self::CycleDetected {
            context: context.into(),
        }
    }

    /// Create a corrupt graph error
    pub fn corrupt_graph(start: NodeId, bound: u64) -> Self {
        Self::CorruptGraph { start, bound }
    }

    /// Create an initialization error
    pub fn initialization_error(message: impl Into<String>) -> Self {
        Self::Initialization(message.into())
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::NodeNotFound { .. } => "NODE_NOT_FOUND",
            Self::ParentNotFound { .. } => "PARENT_NOT_FOUND",
            Self::CycleDetected { .. } => "CYCLE_DETECTED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::CorruptGraph { .. } => "CORRUPT_GRAPH",
            Self::Initialization(_) => "INITIALIZATION_ERROR",
            Self::Database(_) | Self::Storage(_) => "DATABASE_ERROR",
        }
    }
}
