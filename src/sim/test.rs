//! Tests over the simulator.

crate::prelude!();

use crate::db::Db;
use crate::sim::{actor_of, run, Simulation};

fn shared(src: &str) -> Arc<RwLock<Db>> {
    Arc::new(RwLock::new(Db::consult(src).unwrap()))
}

#[test]
fn single_guarded_step() {
    let db = shared(
        "initial(s0).
         transition(s0, go, s1).
         transition_guard(s0, go, s1, always).
         always :- dice0(0.0, 1.0).",
    );
    let sim = run(&db, 1000, Some(0));
    // The walk stops once s1 has no outgoing transitions.
    assert_eq!(sim.total, 1);
    assert_eq!(sim.timeline.len(), 1);
    let event = &sim.timeline[0];
    assert_eq!((event.step, event.from.as_str()), (0, "s0"));
    assert_eq!((event.label.as_str(), event.to.as_str()), ("go", "s1"));
    assert_eq!(sim.by_label.get("go"), Some(&1));
    assert_eq!(sim.steps, 1000);
}

#[test]
fn empty_without_initials_or_transitions() {
    let db = shared("transition(s0, a, s1).");
    assert_eq!(run(&db, 100, Some(0)), Simulation { steps: 100, ..Simulation::default() });

    let db = shared("initial(s0).");
    let sim = run(&db, 100, Some(0));
    assert_eq!(sim.total, 0);
}

#[test]
fn closed_guard_blocks_the_walk() {
    let db = shared(
        "initial(s0).
         transition(s0, go, s1).
         transition_guard(s0, go, s1, never).
         never :- dice0(0.5, 0.5).",
    );
    let sim = run(&db, 100, Some(3));
    assert_eq!(sim.total, 0);
    assert!(sim.timeline.is_empty());
}

#[test]
fn state_guards_apply_too() {
    let db = shared(
        "initial(s0).
         transition(s0, go, s1).
         state_guard(s0, blocked).
         blocked :- fail.",
    );
    let sim = run(&db, 100, Some(3));
    assert_eq!(sim.total, 0);
}

#[test]
fn dice_partition_drives_branching() {
    let db = shared(
        "initial(s0).
         transition(s0, low, s0).
         transition(s0, high, s0).
         transition_guard(s0, low, s0, low_guard).
         transition_guard(s0, high, s0, high_guard).
         low_guard :- dice0(0.0, 0.5).
         high_guard :- dice0(0.5, 1.0).",
    );
    let sim = run(&db, 100, Some(42));
    assert_eq!(sim.total, 100);
    let low = sim.by_label.get("low").copied().unwrap_or(0);
    let high = sim.by_label.get("high").copied().unwrap_or(0);
    assert_eq!(low + high, 100);
    assert!(low > 0 && high > 0, "low: {}, high: {}", low, high);
}

#[test]
fn actors_walk_independently() {
    let db = shared(
        "initial(client_idle).
         initial(server_idle).
         transition(client_idle, ask, client_wait).
         transition(client_wait, got, client_idle).
         transition(server_idle, serve, server_idle).",
    );
    let sim = run(&db, 200, Some(7));
    assert_eq!(sim.total, 200);
    assert!(sim.by_source.get("client").copied().unwrap_or(0) > 0);
    assert!(sim.by_source.get("server").copied().unwrap_or(0) > 0);

    // Aggregates are consistent with the timeline.
    let by_label_sum: u64 = sim.by_label.values().sum();
    assert_eq!(by_label_sum, sim.total);
    assert_eq!(sim.timeline.len() as u64, sim.total);
}

#[test]
fn dice_fact_never_leaks() {
    let db = shared(
        "initial(s0).
         transition(s0, go, s1).",
    );
    let _ = run(&db, 10, Some(1));
    let key = db::Indicator::new("dice0_value", 1);
    assert!(read_lock(&db).clauses_for(&key).is_none());
}

#[test]
fn actor_prefix() {
    assert_eq!(actor_of("proposer_idle_hard"), "proposer");
    assert_eq!(actor_of("s0"), "s0");
}
