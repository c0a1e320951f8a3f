//! Integration tests for explicit links and cycle prevention


use harness::{TestHarness, CALLER};
use taskgraph::errors::TrackerError;
use taskgraph::graph::LinkGraph;

#[test]
fn test_self_link_rejected() {
    let h = TestHarness::new();
    let t = h.create_task(1, "T");

    assert!(matches!(
        h.try_link(1, t, t, "blocks"),
        Err(TrackerError::SelfLink { .. })
    ));
    assert!(h.executor.list_links(1).unwrap().is_empty());
}

#[test]
fn test_cross_project_link_rejected() {
    let h = TestHarness::new();
    let a = h.create_task(1, "A");
    let b = h.create_task(2, "B");

    let err = h.try_link(1, a, b, "blocks").unwrap_err();
    assert!(err.is_link_error());
    assert!(matches!(err, TrackerError::CrossProjectLink { .. }));
}

#[test]
fn test_three_step_cycle_rejected() {
    let h = TestHarness::new();
    let t1 = h.create_task(1, "T1");
    let t2 = h.create_task(1, "T2");
    let t3 = h.create_task(1, "T3");

    h.link(1, t1, t2, "blocks");
    h.link(1, t2, t3, "blocks");

    match h.try_link(1, t3, t1, "blocks") {
        Err(TrackerError::CycleDetected {
            source_id,
            target_id,
            path,
        }) => {
            assert_eq!(source_id, t3);
            assert_eq!(target_id, t1);
            assert_eq!(path, vec![t1, t2, t3]);
        }
        other => panic!("expected CycleDetected, got {:?}", other),
    }

    let links = h.executor.list_links(1).unwrap();
    assert_eq!(links.len(), 2);
    assert!(LinkGraph::from_links(&links).is_acyclic());
}

#[test]
fn test_forward_shortcut_is_not_a_cycle() {
    let h = TestHarness::new();
    let t1 = h.create_task(1, "T1");
    let t2 = h.create_task(1, "T2");
    let t3 = h.create_task(1, "T3");

    h.link(1, t1, t2, "blocks");
    h.link(1, t2, t3, "blocks");
    h.link(1, t1, t3, "relates");

    assert_eq!(h.executor.list_links(1).unwrap().len(), 3);
}

#[test]
fn test_duplicate_edge_is_allowed() {
    let h = TestHarness::new();
    let a = h.create_task(1, "A");
    let b = h.create_task(1, "B");

    let first = h.link(1, a, b, "blocks");
    let second = h.link(1, a, b, "relates");
    assert_ne!(first.id, second.id);
}

#[test]
fn test_rejected_link_is_idempotent() {
    let h = TestHarness::new();
    let a = h.create_task(1, "A");
    let b = h.create_task(1, "B");
    h.link(1, a, b, "blocks");

    for _ in 0..3 {
        assert!(matches!(
            h.try_link(1, b, a, "blocks"),
            Err(TrackerError::CycleDetected { .. })
        ));
    }
    assert_eq!(h.executor.list_links(1).unwrap().len(), 1);
}

#[test]
fn test_hierarchy_does_not_count_toward_cycles() {
    let h = TestHarness::new();
    let epic = h.create(1, "Epic", "epic", None);
    let task = h.create(1, "Task", "task", Some(epic));

    // The parent edge epic -> task is not part of the link graph
    h.link(1, task, epic, "blocks");
}

#[test]
fn test_remove_link_then_rebuild_graph() {
    let h = TestHarness::new();
    let a = h.create_task(1, "A");
    let b = h.create_task(1, "B");
    let link = h.link(1, a, b, "blocks");

    h.executor.remove_link(link.id, CALLER).unwrap();

    let graph = h.executor.build_graph(1).unwrap();
    assert_eq!(graph.nodes.len(), 2);
    assert!(graph.edges.is_empty());
}

#[test]
fn test_remove_missing_link() {
    let h = TestHarness::new();
    assert!(matches!(
        h.executor.remove_link(404, CALLER),
        Err(TrackerError::LinkNotFound { id: 404 })
    ));
}

#[test]
fn test_links_survive_store_reopen() {
    let h = TestHarness::new();
    let a = h.create_task(1, "A");
    let b = h.create_task(1, "B");
    h.link(1, a, b, "blocks");

    let reopened = taskgraph::JsonFileStorage::open(h.root()).unwrap();
    let executor = taskgraph::CommandExecutor::new(reopened);

    assert_eq!(executor.list_links(1).unwrap().len(), 1);
    assert!(matches!(
        executor.add_link(1, b, a, "blocks", CALLER),
        Err(TrackerError::CycleDetected { .. })
    ));
}
