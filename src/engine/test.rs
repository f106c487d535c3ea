//! Tests over the engine façade.

crate::prelude!();

use crate::engine::{Config, Engine};
use crate::solve::Deadline;

const TWO_STEP: &str = "\
initial(s0).
transition(s0, a, s1).
transition(s1, b, s2).
prop(s2, done).
";

fn engine() -> Engine {
    Engine::with_config(Config {
        sim_seed: Some(0),
        ..Config::default()
    })
}

#[test]
fn load_and_check() {
    let engine = engine();
    engine.load(TWO_STEP).unwrap();
    assert!(engine.check_ctl("ef(atom(done))", Deadline::none()).unwrap());
    assert!(!engine.check_ctl("ag(atom(done))", Deadline::none()).unwrap());

    let sm = engine.state_machine();
    assert_eq!(sm.states, vec!["s0", "s1", "s2"]);
    assert_eq!(sm.initial, vec!["s0"]);
}

#[test]
fn source_round_trip() {
    let engine = engine();
    engine.load(TWO_STEP).unwrap();
    assert_eq!(engine.source(), TWO_STEP);
}

#[test]
fn failed_load_restores_previous_database() {
    let engine = engine();
    engine.load(TWO_STEP).unwrap();

    let err = engine.load("initial(s0).\nbroken(").unwrap_err();
    assert!(err.is_parse(), "got: {}", err);

    // The previous spec is still fully loaded.
    assert_eq!(engine.source(), TWO_STEP);
    assert!(engine.check_ctl("ef(atom(done))", Deadline::none()).unwrap());
}

#[test]
fn reload_is_idempotent() {
    let engine = engine();
    engine.load(TWO_STEP).unwrap();
    let first = engine
        .raw_query("transition(F, L, T)", Deadline::none())
        .unwrap();
    engine.load(TWO_STEP).unwrap();
    let second = engine
        .raw_query("transition(F, L, T)", Deadline::none())
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(engine.state_machine(), engine.state_machine());
}

#[test]
fn reset_clears_user_predicates_only() {
    let engine = engine();
    engine.load(TWO_STEP).unwrap();
    engine.reset();

    assert_eq!(engine.source(), "");
    let result = engine
        .raw_query("transition(F, L, T)", Deadline::none())
        .unwrap();
    assert!(!result.ok);

    // Built-ins still work.
    let result = engine
        .raw_query("member(X, [a, b])", Deadline::none())
        .unwrap();
    assert_eq!(result.solutions, vec!["X = a", "X = b"]);

    // The cached simulation is gone.
    assert_eq!(engine.simulation().total, 0);
}

#[test]
fn raw_query_rendering() {
    let engine = engine();
    engine.load(TWO_STEP).unwrap();

    let result = engine
        .raw_query("transition(s0, L, T)", Deadline::none())
        .unwrap();
    assert!(result.ok);
    assert_eq!(result.solutions, vec!["L = a, T = s1"]);

    // No variables: solutions render as `true`.
    let result = engine
        .raw_query("transition(s0, a, s1).", Deadline::none())
        .unwrap();
    assert_eq!(result.solutions, vec!["true"]);

    let result = engine.raw_query("ghost(X)", Deadline::none()).unwrap();
    assert!(!result.ok);
    assert!(result.solutions.is_empty());
}

#[test]
fn raw_query_parse_error() {
    let engine = engine();
    let err = engine.raw_query("p(", Deadline::none()).unwrap_err();
    assert!(err.is_parse(), "got: {}", err);
}

#[test]
fn zero_deadline_times_out() {
    let engine = engine();
    engine.load(TWO_STEP).unwrap();
    let err = engine
        .raw_query("transition(F, L, T)", Deadline::in_millis(0))
        .unwrap_err();
    assert!(err.is_timeout(), "got: {}", err);

    let err = engine
        .check_ctl("ef(atom(done))", Deadline::in_millis(0))
        .unwrap_err();
    assert!(err.is_timeout(), "got: {}", err);
}

#[test]
fn assert_clause_extends_the_database() {
    let engine = engine();
    engine.load(TWO_STEP).unwrap();
    engine.assert_clause("prop(s0, fresh).").unwrap();
    assert!(engine
        .raw_query("prop(s0, fresh)", Deadline::none())
        .unwrap()
        .ok);

    let err = engine.assert_clause("member(a, b).").unwrap_err();
    assert!(matches!(err.source, Error::Redefine { .. }), "got: {}", err);
}

// Scenario: named property check.
#[test]
fn named_property_check() {
    let engine = engine();
    engine
        .load(
            "initial(s0).
             transition(s0, step, s1).
             transition(s1, back, s0).
             prop(s1, accepting_input).
             property(live, 'can always reach input', 'ag(ef(atom(accepting_input)))').",
        )
        .unwrap();

    assert!(engine.check_property("live", Deadline::none()).unwrap());
    assert!(engine.check_property("ghost", Deadline::none()).is_err());

    let results = engine.check_properties(Deadline::none());
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].satisfied, Some(true));
    assert!(results[0].error.is_none());
}

#[test]
fn broken_property_formula_reports() {
    let engine = engine();
    engine
        .load("initial(s0).\nproperty(bad, 'oops', 'ag(').")
        .unwrap();
    let err = engine.check_property("bad", Deadline::none()).unwrap_err();
    assert!(err.is_parse(), "got: {}", err);

    let results = engine.check_properties(Deadline::none());
    assert!(results[0].satisfied.is_none());
    assert!(results[0].error.is_some());
}

// Scenario: guarded simulation, cached at load time.
#[test]
fn simulation_cached_per_load() {
    let engine = engine();
    engine
        .load(
            "initial(s0).
             transition(s0, go, s1).
             transition_guard(s0, go, s1, always).
             always :- dice0(0.0, 1.0).",
        )
        .unwrap();
    let sim = engine.simulation();
    assert_eq!(sim.total, 1);
    assert_eq!(sim.timeline[0].label, "go");

    // A new load replaces the cached result.
    engine.load("initial(lone).").unwrap();
    assert_eq!(engine.simulation().total, 0);
}

#[test]
fn views_serialize() {
    let engine = engine();
    engine.load(TWO_STEP).unwrap();
    let json = serde_json::to_value(engine.state_machine()).unwrap();
    assert_eq!(json["initial"][0], "s0");
    assert_eq!(json["transitions"][1]["label"], "b");

    let json = serde_json::to_value(engine.simulation().as_ref()).unwrap();
    assert_eq!(json["steps"], 1000);
}

// Scenario: concurrent loads against concurrent checks; every observation
// is consistent with exactly one loaded spec, never a mix.
#[test]
fn concurrent_isolation() {
    let spec_a = "initial(s0).\npair(1).\npair(2).";
    let spec_b = "initial(s0).\npair(3).\npair(4).";
    let engine = Engine::new();
    engine.load(spec_a).unwrap();

    std::thread::scope(|scope| {
        let engine = &engine;
        scope.spawn(move || {
            for round in 0..50 {
                let spec = if round % 2 == 0 { spec_b } else { spec_a };
                engine.load(spec).unwrap();
            }
        });
        for _ in 0..2 {
            scope.spawn(move || {
                for _ in 0..100 {
                    let result = engine
                        .raw_query("findall(X, pair(X), L)", Deadline::none())
                        .unwrap();
                    assert_eq!(result.solutions.len(), 1);
                    let rendered = &result.solutions[0];
                    assert!(
                        rendered == "L = [1, 2]" || rendered == "L = [3, 4]",
                        "torn read: {}",
                        rendered
                    );
                }
            });
        }
    });
}

#[test]
fn demo_spec_loads_and_verifies() {
    let engine = engine();
    engine.load(crate::DEMO).unwrap();

    assert!(!engine.state_machine().states.is_empty());
    assert!(!engine.actors().is_empty());
    assert!(!engine.docs().is_empty());
    assert!(!engine.sequence_diagram().messages.is_empty());
    assert!(engine.simulation().total > 0);

    for result in engine.check_properties(Deadline::none()) {
        assert_eq!(
            result.satisfied,
            Some(true),
            "property `{}` failed: {:?}",
            result.name,
            result.error
        );
    }
}
