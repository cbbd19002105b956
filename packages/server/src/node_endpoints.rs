//! Node Endpoints
//!
//! # Endpoints
//!
//! - `GET /api/health` - Health check endpoint
//! - `POST /api/nodes` - Create a node
//! - `PUT /api/nodes/with-shift/:id` - Move a node together with its subtree
//! - `PUT /api/nodes/without-shift/:id` - Move a node, leaving its children behind
//! - `DELETE /api/nodes/with-shift/:id` - Delete a node, promoting its children
//! - `DELETE /api/nodes/without-shift/:id` - Delete a node and its subtree
//! - `GET /api/nodes/tree` - The whole forest
//! - `GET /api/nodes/:id` - Get a node by ID
//! - `GET /api/nodes/:id/ancestors` - Strict ancestors, nearest first
//! - `GET /api/nodes/:id/descendants` - Strict descendants

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, HttpError};
use orgtree_core::{CreateNodeParams, Node, NodeId, TreeNode};

/// Request body for both reparent endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReparentInput {
    pub parent_id: NodeId,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
///
/// ```bash
/// curl http://localhost:3001/api/health
/// ```
async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create a new node
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:3001/api/nodes \
///   -H "Content-Type: application/json" \
///   -d '{"name": "Sales", "nodeType": "department", "parentId": 1}'
/// ```
async fn create_node(
    State(state): State<AppState>,
    Json(params): Json<CreateNodeParams>,
) -> Result<(StatusCode, Json<Node>), HttpError> {
    let node = state.tree_service.create_node(params).await.map_err(|e| {
        tracing::error!("Node creation failed: {}", e);
        HttpError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(node)))
}

/// Move a node with its subtree
///
/// ```bash
/// curl -X PUT http://localhost:3001/api/nodes/with-shift/2 \
///   -H "Content-Type: application/json" \
///   -d '{"parentId": 5}'
/// ```
async fn reparent_with_shift(
    State(state): State<AppState>,
    Path(id): Path<NodeId>,
    Json(input): Json<ReparentInput>,
) -> Result<Json<Node>, HttpError> {
    let node = state
        .tree_service
        .reparent_with_shift(id, input.parent_id)
        .await?;
    Ok(Json(node))
}

/// Move a node without its children
async fn reparent_without_shift(
    State(state): State<AppState>,
    Path(id): Path<NodeId>,
    Json(input): Json<ReparentInput>,
) -> Result<Json<Node>, HttpError> {
    let node = state
        .tree_service
        .reparent_without_shift(id, input.parent_id)
        .await?;
    Ok(Json(node))
}

/// Delete a node and shift its children to its parent
///
/// ```bash
/// curl -X DELETE http://localhost:3001/api/nodes/with-shift/2
/// ```
async fn delete_with_shift(
    State(state): State<AppState>,
    Path(id): Path<NodeId>,
) -> Result<StatusCode, HttpError> {
    state.tree_service.delete_with_shift(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a node along with its subtree
async fn delete_without_shift(
    State(state): State<AppState>,
    Path(id): Path<NodeId>,
) -> Result<StatusCode, HttpError> {
    state.tree_service.delete_without_shift(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get the entire organization tree
async fn get_tree(State(state): State<AppState>) -> Result<Json<Vec<TreeNode>>, HttpError> {
    Ok(Json(state.tree_service.get_tree().await?))
}

async fn get_node(
    State(state): State<AppState>,
    Path(id): Path<NodeId>,
) -> Result<Json<Node>, HttpError> {
    Ok(Json(state.tree_service.get_node(id).await?))
}

async fn get_ancestors(
    State(state): State<AppState>,
    Path(id): Path<NodeId>,
) -> Result<Json<Vec<Node>>, HttpError> {
    Ok(Json(state.tree_service.get_ancestors(id).await?))
}

async fn get_descendants(
    State(state): State<AppState>,
    Path(id): Path<NodeId>,
) -> Result<Json<Vec<Node>>, HttpError> {
    Ok(Json(state.tree_service.get_descendants(id).await?))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/nodes", post(create_node))
        .route("/api/nodes/tree", get(get_tree))
        .route(
            "/api/nodes/with-shift/:id",
            put(reparent_with_shift).delete(delete_with_shift),
        )
        .route(
            "/api/nodes/without-shift/:id",
            put(reparent_without_shift).delete(delete_without_shift),
        )
        .route("/api/nodes/:id", get(get_node))
        .route("/api/nodes/:id/ancestors", get(get_ancestors))
        .route("/api/nodes/:id/descendants", get(get_descendants))
        .with_state(state)
}
