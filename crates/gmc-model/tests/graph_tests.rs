use gmc_model::graph::{ExplicitGraph, GraphEnabler, GraphError, GraphStateManager, NodePredicate};
use gmc_model::{Enabler, FalsePredicate, StateManager, StatePredicate, TransitionSequence};

/// a -> b, a -> c, b -> a
fn build_triangle() -> ExplicitGraph {
    let mut g = ExplicitGraph::new();
    let a = g.add_node("A");
    let b = g.add_node("B");
    let c = g.add_node("C");
    g.add_edge(a, b, "a->b");
    g.add_edge(a, c, "a->c");
    g.add_edge(b, a, "b->a");
    g
}

#[test]
fn test_enabler_preserves_edge_order() {
    let g = build_triangle();
    let mut enabler = GraphEnabler::new(&g);
    let mut seq = enabler.enabled_transitions(&0);

    assert_eq!(*seq.source(), 0);
    assert!(seq.has_multiple());
    assert_eq!(seq.advance().label, "a->b");
    assert_eq!(seq.peek().map(|e| e.label.as_str()), Some("a->c"));
    assert_eq!(seq.position(), 1);
}

#[test]
fn test_sink_node_has_no_transitions() {
    let g = build_triangle();
    let mut enabler = GraphEnabler::new(&g);
    let seq = enabler.enabled_transitions(&2);
    assert!(!seq.has_next());
    assert!(!seq.has_multiple());
}

#[test]
fn test_manager_flags_are_independent() {
    let g = build_triangle();
    let mut manager = GraphStateManager::new(&g);

    manager.set_seen(&1, true);
    assert!(manager.seen(&1));
    assert!(!manager.on_stack(&1));

    manager.set_on_stack(&1, true);
    assert_eq!(manager.stack_nodes(), vec![1]);
    manager.set_on_stack(&1, false);
    assert!(manager.seen(&1));
    assert!(manager.stack_nodes().is_empty());
}

#[test]
fn test_manager_follows_edges() {
    let g = build_triangle();
    let mut enabler = GraphEnabler::new(&g);
    let mut manager = GraphStateManager::new(&g);
    let seq = enabler.enabled_transitions(&0);
    let edge = seq.peek().cloned().unwrap();
    assert_eq!(manager.next_state(&0, &edge), 1);
    assert_eq!(manager.state_summary(&1), "B");
    assert_eq!(manager.transition_summary(&edge), "a->b");
}

#[test]
fn test_node_predicate_explains_hit() {
    let mut pred = NodePredicate::new("reach-C", [2]);
    assert!(!pred.holds_at(&0));
    assert!(pred.explanation().contains("no target"));
    assert!(pred.holds_at(&2));
    assert_eq!(pred.explanation(), "reach-C: reached target node 2");
    assert_eq!(pred.to_string(), "reach-C");
}

#[test]
fn test_false_predicate_never_holds() {
    let mut pred = FalsePredicate::<u32>::new();
    assert!(!pred.holds_at(&0));
    assert_eq!(pred.to_string(), "FalsePredicate");
}

#[test]
fn test_graph_json_roundtrip() {
    let g = build_triangle();
    let json = g.to_json().unwrap();
    let parsed = ExplicitGraph::from_json(&json).unwrap();
    assert_eq!(parsed.nodes, g.nodes);
    assert_eq!(parsed.edges, g.edges);
    assert_eq!(parsed.node("C"), Some(2));
}

#[test]
fn test_graph_json_rejects_dangling_edge() {
    let json = r#"{
        "nodes": ["A"],
        "edges": [{ "from": 0, "to": 3, "label": "bad" }],
        "initial": 0
    }"#;
    match ExplicitGraph::from_json(json) {
        Err(GraphError::DanglingEdge { node, count, .. }) => {
            assert_eq!(node, 3);
            assert_eq!(count, 1);
        }
        other => panic!("expected dangling edge error, got {:?}", other.map(|_| ())),
    }
}
