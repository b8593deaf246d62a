//! Mixed-batch planning: dedup accounting across attachment sources, and the
//! serde handoff of inert chains at the engine boundary.

use upload_graph::{AttachmentId, JobChain, JobKind, UploadDependencyGraph};

use crate::common::{CountingEngine, Registrar, init_tracing, message, registered, unregistered};

#[test]
fn test_mixed_batch_plans_minimal_work() {
    init_tracing();
    let engine = CountingEngine::new();
    let registrar = Registrar::new();

    // A story fanned out to three threads: all three share one
    // not-yet-registered photo, message 2 adds its own video, message 3
    // re-sends an attachment that is already registered.
    let batch = vec![
        message(1, vec![unregistered("content://photo")]),
        message(2, vec![unregistered("content://photo"), unregistered("content://video")]),
        message(3, vec![unregistered("content://photo"), registered(50)]),
    ];

    let graph = UploadDependencyGraph::create(&batch, &engine, |attachment| {
        registrar.register(attachment)
    })
    .unwrap();

    // photo: 1 grouping registration + 2 copy-consumer records; video: 1.
    assert_eq!(registrar.calls(), 4);
    // photo chain (4 jobs) + video chain (3) + registered-50 chain (3).
    assert_eq!(engine.jobs_created(), 10);

    assert_eq!(graph.dependencies_for(&batch[0]).len(), 1);
    assert_eq!(graph.dependencies_for(&batch[1]).len(), 2);
    assert_eq!(graph.dependencies_for(&batch[2]).len(), 2);

    // Every node references a durable id, never a raw content locator.
    let all_ids: Vec<AttachmentId> = batch
        .iter()
        .flat_map(|m| graph.attachment_ids(m))
        .collect();
    assert_eq!(all_ids.len(), 5);

    // Copy consumers each got a distinct fresh record, distinct from the
    // owner's.
    let mut unique = all_ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 5);

    let chains = graph.consume_deferred_queue();
    assert_eq!(chains.len(), 3);

    // First-seen order: the shared photo chain comes first and carries the
    // copy job for the two consumers.
    assert_eq!(chains[0].len(), 4);
    match &chains[0].jobs()[3].kind {
        JobKind::Copy { destinations, .. } => assert_eq!(destinations.len(), 2),
        other => panic!("expected copy job, got {other:?}"),
    }
    assert_eq!(chains[1].len(), 3);
    assert_eq!(chains[2].len(), 3);
}

#[test]
fn test_send_job_dependencies_cover_every_upload() {
    init_tracing();
    let engine = CountingEngine::new();
    let registrar = Registrar::new();

    let batch = vec![
        message(1, vec![unregistered("content://a"), unregistered("content://b")]),
        message(2, vec![unregistered("content://a")]),
    ];

    let graph = UploadDependencyGraph::create(&batch, &engine, |attachment| {
        registrar.register(attachment)
    })
    .unwrap();

    // The send job for message 1 must wait on two jobs (its two uploads);
    // message 2 waits on the copy fanning out "a".
    assert_eq!(graph.job_dependency_ids(&batch[0]).len(), 2);
    assert_eq!(graph.job_dependency_ids(&batch[1]).len(), 1);

    let chains = graph.consume_deferred_queue();
    let copy_id = chains[0].jobs().last().unwrap().id.clone();
    assert_eq!(graph.job_dependency_ids(&batch[1]), vec![copy_id]);
}

#[test]
fn test_chains_survive_the_serde_handoff() {
    init_tracing();
    let engine = CountingEngine::new();
    let registrar = Registrar::new();

    let batch = vec![
        message(1, vec![unregistered("content://photo")]),
        message(2, vec![unregistered("content://photo")]),
    ];

    let graph = UploadDependencyGraph::create(&batch, &engine, |attachment| {
        registrar.register(attachment)
    })
    .unwrap();

    let chains = graph.consume_deferred_queue();
    let encoded = serde_json::to_string(&chains).unwrap();
    let decoded: Vec<JobChain> = serde_json::from_str(&encoded).unwrap();
    assert_eq!(chains, decoded);
}
