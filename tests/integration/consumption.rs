//! One-shot queue semantics: the deferred chains are delivered to exactly
//! one caller, with nothing duplicated and nothing lost, no matter how many
//! threads race for them.

use std::sync::Arc;

use upload_graph::{JobChain, UploadDependencyGraph};

use crate::common::{CountingEngine, Registrar, init_tracing, message, unregistered};

fn build_graph(chain_count: u64) -> UploadDependencyGraph {
    let engine = CountingEngine::new();
    let registrar = Registrar::new();
    let batch: Vec<_> = (0..chain_count)
        .map(|i| message(i, vec![unregistered(&format!("content://payload-{i}"))]))
        .collect();
    UploadDependencyGraph::create(&batch, &engine, |attachment| registrar.register(attachment))
        .unwrap()
}

#[test]
fn test_concurrent_consumers_race_for_one_delivery() {
    init_tracing();
    let chain_count = 8;
    let graph = Arc::new(build_graph(chain_count));
    let mut winners = 0;
    let mut delivered: Vec<JobChain> = Vec::new();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let graph = Arc::clone(&graph);
                scope.spawn(move || graph.consume_deferred_queue())
            })
            .collect();

        for handle in handles {
            let chains = handle.join().unwrap();
            if !chains.is_empty() {
                winners += 1;
                delivered.extend(chains);
            }
        }
    });

    // Exactly one caller won, and it received every chain.
    assert_eq!(winners, 1);
    assert_eq!(delivered.len(), chain_count as usize);

    // The queue stays exhausted afterwards.
    assert!(graph.consume_deferred_queue().is_empty());
}

#[test]
fn test_dependency_map_readable_while_consumers_race() {
    init_tracing();
    let batch = vec![message(1, vec![unregistered("content://a")])];
    let engine = CountingEngine::new();
    let registrar = Registrar::new();
    let graph = Arc::new(
        UploadDependencyGraph::create(&batch, &engine, |attachment| {
            registrar.register(attachment)
        })
        .unwrap(),
    );

    std::thread::scope(|scope| {
        let consumer = {
            let graph = Arc::clone(&graph);
            scope.spawn(move || graph.consume_deferred_queue())
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let graph = Arc::clone(&graph);
                let batch = &batch;
                scope.spawn(move || graph.dependencies_for(&batch[0]).len())
            })
            .collect();

        assert_eq!(consumer.join().unwrap().len(), 1);
        for reader in readers {
            // The map is immutable after construction; reads are unaffected
            // by consumption.
            assert_eq!(reader.join().unwrap(), 1);
        }
    });
}

#[test]
fn test_repeated_sequential_consumption_is_stable() {
    init_tracing();
    let graph = build_graph(3);
    assert_eq!(graph.consume_deferred_queue().len(), 3);
    for _ in 0..10 {
        assert!(graph.consume_deferred_queue().is_empty());
    }
}
