//! Performance benchmarks for OrgTree core operations
//!
//! Run with: `cargo bench -p orgtree-core`
//!
//! These benchmarks measure critical path performance:
//! - Forest assembly from a flat node list (build_forest)
//! - Node creation including closure rows
//! - Subtree moves on a deep chain

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use orgtree_core::db::{DatabaseService, TursoStore};
use orgtree_core::services::{CreateNodeParams, TreeService};
use orgtree_core::{build_forest, Node, NodeId, OrgTreeConfig};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::runtime::Runtime;

/// Setup a service with a fresh database
async fn setup_test_service() -> (TreeService, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db = DatabaseService::new(temp_dir.path().join("bench.db"))
        .await
        .unwrap();
    let store = Arc::new(TursoStore::new(Arc::new(db)));
    let service = TreeService::new(store, &OrgTreeConfig::default()).unwrap();
    (service, temp_dir)
}

/// Flat node list shaped as a balanced tree with the given fan-out
fn generate_nodes(count: usize, fan_out: usize) -> Vec<Node> {
    (1..=count as NodeId)
        .map(|id| Node {
            id,
            name: format!("Node {}", id),
            node_type: "team".to_string(),
            color: None,
            parent_id: if id == 1 {
                None
            } else {
                Some((id - 2) / fan_out as NodeId + 1)
            },
        })
        .collect()
}

/// Benchmark in-memory forest assembly
///
/// Target: 10k nodes well under 10ms
fn bench_build_forest(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_forest");

    for count in [100usize, 1_000, 10_000] {
        let nodes = generate_nodes(count, 4);
        group.bench_with_input(BenchmarkId::from_parameter(count), &nodes, |b, nodes| {
            b.iter(|| build_forest(black_box(nodes.clone())));
        });
    }

    group.finish();
}

/// Benchmark node creation (insert plus closure rows in one transaction)
fn bench_create_node(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    c.bench_function("create_child_node", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let (service, _temp) = setup_test_service().await;
                let root = service
                    .create_node(CreateNodeParams::new("Root", "organization", None))
                    .await
                    .unwrap();

                let start = std::time::Instant::now();
                for i in 0..iters {
                    service
                        .create_node(CreateNodeParams::new(
                            format!("Dept {}", i),
                            "department",
                            Some(root.id),
                        ))
                        .await
                        .unwrap();
                }
                start.elapsed()
            })
        });
    });
}

/// Benchmark moving a 50-deep chain back and forth between two roots
fn bench_reparent_subtree(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("reparent_with_shift");
    group.sample_size(20);

    group.bench_function("chain_of_50", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let (service, _temp) = setup_test_service().await;
                let left = service
                    .create_node(CreateNodeParams::new("Left", "organization", None))
                    .await
                    .unwrap();
                let right = service
                    .create_node(CreateNodeParams::new("Right", "organization", None))
                    .await
                    .unwrap();

                let mut parent = left.id;
                let mut head = None;
                for i in 0..50 {
                    let node = service
                        .create_node(CreateNodeParams::new(format!("Link {}", i), "team", Some(parent)))
                        .await
                        .unwrap();
                    head.get_or_insert(node.id);
                    parent = node.id;
                }
                let head = head.unwrap();

                let start = std::time::Instant::now();
                for i in 0..iters {
                    let target = if i % 2 == 0 { right.id } else { left.id };
                    service.reparent_with_shift(head, target).await.unwrap();
                }
                start.elapsed()
            })
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_build_forest,
    bench_create_node,
    bench_reparent_subtree
);
criterion_main!(benches);
