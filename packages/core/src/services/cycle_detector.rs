//! Ancestor-walk cycle detection
//!
//! Follows authoritative parent pointers rather than the closure table, so a
//! closure table that drifted out of sync cannot hide a cycle. The walk is
//! bounded by the node count: a valid forest never has a longer chain.

use crate::db::NodeStore;
use crate::models::NodeId;
use crate::services::error::TreeServiceError;

/// Whether `subject` is reached by walking parent links upward from `start`
///
/// `start` itself is the first node compared, so `would_cycle(store, Some(n), n)`
/// is true: a node cannot become its own parent.
///
/// # Errors
///
/// - `CorruptGraph` when the walk exceeds the node count or meets a parent link
///   to a node that does not exist
pub async fn would_cycle<S>(
    store: &S,
    start: Option<NodeId>,
    subject: NodeId,
) -> Result<bool, TreeServiceError>
where
    S: NodeStore + ?Sized,
{
    let Some(origin) = start else {
        return Ok(false);
    };

    let bound = store.count().await?;
    let mut current = Some(origin);
    let mut steps: u64 = 0;

    while let Some(id) = current {
        if id == subject {
            return Ok(true);
        }

        steps += 1;
        if steps > bound {
            tracing::warn!(
                "Ancestor walk from node {} exceeded {} steps looking for {}",
                origin,
                bound,
                subject
            );
            return Err(TreeServiceError::corrupt_graph(origin, bound));
        }

        current = match store.find_by_id(id).await? {
            Some(node) => node.parent_id,
            None => {
                tracing::warn!("Ancestor walk from node {} hit missing node {}", origin, id);
                return Err(TreeServiceError::corrupt_graph(origin, bound));
            }
        };
    }

    Ok(false)
}
