//! Business Services
//!
//! - `TreeService` - node creation, both reparent strategies, both delete
//!   strategies, and forest/ancestor/descendant queries
//! - `ColorAssigner` - round-robin palette shared by all creates
//! - `would_cycle` - parent-pointer walk guarding every new parent link
//!
//! Services coordinate between the database layer and callers, enforcing
//! the forest invariants before any write is committed.

pub mod color_assigner;
pub mod cycle_detector;
pub mod error;
pub mod tree_service;

pub use color_assigner::ColorAssigner;
pub use cycle_detector::would_cycle;
pub use error::TreeServiceError;
pub use tree_service::{CreateNodeParams, TreeService};
