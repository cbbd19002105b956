//! OrgTree HTTP Server Binary
//!
//! # Environment Variables
//!
//! - `ORGTREE_PORT`: Server port (default: 3001)
//! - `ORGTREE_DB_PATH`: Database file (default: ~/.orgtree/database/orgtree.db)
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")
//! - `CORS_ALLOW_ORIGIN`: Single allowed origin (default: any)

use std::sync::Arc;

use orgtree_core::db::{DatabaseService, TursoStore};
use orgtree_core::{OrgTreeConfig, TreeService};
use orgtree_server::{port_from_env, start_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = OrgTreeConfig::from_env();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    let port = port_from_env();
    tracing::info!("Port: {}", port);
    tracing::info!("Database: {}", config.database_path.display());

    let db = Arc::new(DatabaseService::new(config.database_path.clone()).await?);
    let store = Arc::new(TursoStore::new(db));
    let tree_service = Arc::new(TreeService::new(store, &config)?);

    start_server(tree_service, port).await
}
