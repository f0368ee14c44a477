use gmc_core::{ConfigError, Session, SessionConfig, SessionError, StopReason};
use gmc_explore::traversal::chooser::GuidedTransitionChooser;
use gmc_explore::traversal::engine::DfsSearcher;
use gmc_explore::traversal::outcome::SearchOutcome;
use gmc_explore::traversal::replay::Replayer;
use gmc_model::graph::{ExplicitGraph, GraphEnabler, GraphStateManager, NodeId, NodePredicate};
use gmc_model::FalsePredicate;

/// R fans out to four leaves; X1 and X2 belong to the same class.
fn build_fan() -> ExplicitGraph {
    let mut g = ExplicitGraph::new();
    let r = g.add_node("R");
    for label in ["X1", "X2", "Y1", "Z1"] {
        let leaf = g.add_node(label);
        g.add_edge(r, leaf, &format!("r->{label}"));
    }
    g
}

fn leaves(g: &ExplicitGraph) -> Vec<NodeId> {
    ["X1", "X2", "Y1", "Z1"]
        .iter()
        .map(|label| g.node(label).unwrap())
        .collect()
}

/// Class of a leaf is the first letter of its label.
fn classify<'g>(g: &'g ExplicitGraph) -> impl FnMut(&NodeId, SearchOutcome) -> String + 'g {
    move |node: &NodeId, _: SearchOutcome| g.label(*node)[..1].to_string()
}

#[test]
fn test_explore_exhausts_and_deduplicates() {
    let dir = tempfile::tempdir().unwrap();
    let g = build_fan();
    let mut session = Session::new(SessionConfig::new(dir.path(), "fan")).unwrap();
    let mut searcher = DfsSearcher::new(
        GraphEnabler::new(&g),
        GraphStateManager::new(&g),
        NodePredicate::new("leaf", leaves(&g)),
    );

    let report = session.explore(&mut searcher, 0, classify(&g)).unwrap();

    assert_eq!(report.stop_reason, StopReason::Exhausted);
    assert_eq!(report.errors_reported, 4);
    assert_eq!(report.distinct_errors, 3);
    assert_eq!(report.stats.states_seen, 5);
    assert_eq!(searcher.name(), Some("fan"));

    let kinds: Vec<&str> = session
        .log()
        .entries()
        .map(|(entry, _)| entry.as_str())
        .collect();
    assert_eq!(kinds, vec!["X", "Y", "Z"]);
    assert!(dir.path().join("fan_2.trace").exists());
    assert!(!dir.path().join("fan_3.trace").exists());
}

#[test]
fn test_explore_stops_at_error_bound() {
    let dir = tempfile::tempdir().unwrap();
    let g = build_fan();
    let mut config = SessionConfig::new(dir.path(), "bounded");
    config.error_bound = 2;
    let mut session = Session::new(config).unwrap();
    let mut searcher = DfsSearcher::new(
        GraphEnabler::new(&g),
        GraphStateManager::new(&g),
        NodePredicate::new("leaf", leaves(&g)),
    );

    let report = session.explore(&mut searcher, 0, classify(&g)).unwrap();

    assert_eq!(report.stop_reason, StopReason::ErrorBoundReached);
    assert_eq!(report.errors_reported, 2);
    assert_eq!(report.distinct_errors, 1);
    assert!(session.log().bound_reached());
    // Stopped with the second hit still on the stack.
    assert_eq!(searcher.current_state(), g.node("X2").as_ref());
}

#[test]
fn test_cycles_reported_as_violations() {
    let dir = tempfile::tempdir().unwrap();
    let mut g = ExplicitGraph::new();
    let a = g.add_node("A");
    let b = g.add_node("B");
    let c = g.add_node("C");
    g.add_edge(a, b, "a->b");
    g.add_edge(b, a, "b->a");
    g.add_edge(a, c, "a->c");

    let mut config = SessionConfig::new(dir.path(), "cycles");
    config.report_cycle_as_violation = true;
    let mut session = Session::new(config).unwrap();
    let mut searcher = DfsSearcher::new(
        GraphEnabler::new(&g),
        GraphStateManager::new(&g),
        FalsePredicate::new(),
    );

    let mut kinds = Vec::new();
    let report = session
        .explore(&mut searcher, a, |node, outcome| {
            kinds.push(outcome);
            format!("{outcome:?} at {}", g.label(*node))
        })
        .unwrap();

    assert!(searcher.report_cycle_as_violation());
    assert_eq!(kinds, vec![SearchOutcome::Cycle]);
    assert_eq!(report.errors_reported, 1);
    assert_eq!(report.stop_reason, StopReason::Exhausted);
    assert_eq!(report.stats.states_seen, 3);
}

#[test]
fn test_logged_trace_replays_to_shortest_witness() {
    // R -> A -> T1 is found first; R -> T2 is shorter and of the same class.
    let dir = tempfile::tempdir().unwrap();
    let mut g = ExplicitGraph::new();
    let r = g.add_node("R");
    let a = g.add_node("A");
    let t1 = g.add_node("T1");
    let t2 = g.add_node("T2");
    g.add_edge(r, a, "r->a");
    g.add_edge(a, t1, "a->t1");
    g.add_edge(r, t2, "r->t2");

    let mut session = Session::new(SessionConfig::new(dir.path(), "short")).unwrap();
    let mut searcher = DfsSearcher::new(
        GraphEnabler::new(&g),
        GraphStateManager::new(&g),
        NodePredicate::new("target", [t1, t2]),
    );
    let report = session
        .explore(&mut searcher, r, |_, _| "target".to_string())
        .unwrap();
    assert_eq!(report.errors_reported, 2);
    assert_eq!(report.distinct_errors, 1);

    let (_, record) = session.log().get(0).unwrap();
    assert_eq!(record.size, 2);

    let mut chooser =
        GuidedTransitionChooser::from_file(GraphEnabler::new(&g), &record.trace_file).unwrap();
    let mut replayer = Replayer::new(GraphStateManager::new(&g), Vec::new());
    replayer.set_predicate(Box::new(NodePredicate::new("target", [t1, t2])));
    let outcome = replayer.play_one(r, &mut chooser).unwrap();

    assert_eq!(outcome.steps, 1);
    assert_eq!(outcome.final_states, vec![t2]);
    assert!(outcome.violation_found());
    assert_eq!(chooser.remaining(), 0);
}

#[test]
fn test_logged_trace_stops_at_branching_witness() {
    // The witness T still has two successors, so the guide alone would run
    // past it and hit an unrecorded choice.
    let dir = tempfile::tempdir().unwrap();
    let mut g = ExplicitGraph::new();
    let r = g.add_node("R");
    let t = g.add_node("T");
    let x = g.add_node("X");
    let y = g.add_node("Y");
    g.add_edge(r, t, "r->t");
    g.add_edge(t, x, "t->x");
    g.add_edge(t, y, "t->y");

    let mut config = SessionConfig::new(dir.path(), "branch");
    config.error_bound = 1;
    let mut session = Session::new(config).unwrap();
    let mut searcher = DfsSearcher::new(
        GraphEnabler::new(&g),
        GraphStateManager::new(&g),
        NodePredicate::new("at-t", [t]),
    );
    let report = session
        .explore(&mut searcher, r, |_, _| "at-t".to_string())
        .unwrap();
    assert_eq!(report.stop_reason, StopReason::ErrorBoundReached);

    let (_, record) = session.log().get(0).unwrap();
    let mut chooser =
        GuidedTransitionChooser::from_file(GraphEnabler::new(&g), &record.trace_file).unwrap();
    assert_eq!(chooser.declared_steps(), Some(1));
    assert_eq!(chooser.remaining(), 0);

    let mut replayer = Replayer::new(GraphStateManager::new(&g), Vec::new());
    replayer.set_predicate(Box::new(NodePredicate::new("at-t", [t])));
    let outcome = replayer.play_one(r, &mut chooser).unwrap();

    assert_eq!(outcome.steps, 1);
    assert_eq!(outcome.final_states, vec![t]);
    assert_eq!(outcome.violations.len(), 1);
    assert_eq!(outcome.violations[0].step, 1);
    let text = String::from_utf8(replayer.into_output()).unwrap();
    assert!(text.ends_with("Trace ends after 1 transitions.\n"));
}

#[test]
fn test_summary_and_report_json() {
    let dir = tempfile::tempdir().unwrap();
    let g = build_fan();
    let mut session = Session::new(SessionConfig::new(dir.path(), "json")).unwrap();
    let mut searcher = DfsSearcher::new(
        GraphEnabler::new(&g),
        GraphStateManager::new(&g),
        NodePredicate::new("leaf", leaves(&g)),
    );
    let report = session.explore(&mut searcher, 0, classify(&g)).unwrap();

    let json = report.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["session_name"], "json");
    assert_eq!(value["distinct_errors"], 3);
    assert_eq!(value["stop_reason"], "Exhausted");

    let mut out = Vec::new();
    session.print_summary(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("numDistinctErrors.. 3"));
}

#[test]
fn test_invalid_config_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let result: Result<Session<String>, _> = Session::new(SessionConfig::new(dir.path(), ""));
    assert!(matches!(
        result,
        Err(SessionError::Config(ConfigError::EmptySessionName))
    ));

    let file = dir.path().join("not-a-dir");
    std::fs::write(&file, "").unwrap();
    let result: Result<Session<String>, _> = Session::new(SessionConfig::new(&file, "s"));
    assert!(matches!(
        result,
        Err(SessionError::Config(ConfigError::NotADirectory(_)))
    ));
}
