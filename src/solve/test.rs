//! Tests over the resolution engine.

crate::prelude!();

use crate::db::Db;
use crate::solve::{Deadline, Flow, Solver};
use crate::term::Term;

fn solver(src: &str) -> Solver {
    Solver::new(Db::consult(src).unwrap())
}

fn solutions(solver: &mut Solver, goal: &str, template: &str) -> Vec<String> {
    let goal = parse::goal(goal).unwrap();
    let template = parse::goal(template).unwrap();
    solver
        .collect(&goal, &template)
        .unwrap()
        .into_iter()
        .map(|t| t.to_string())
        .collect()
}

#[test]
fn facts_in_clause_order() {
    let mut solver = solver("p(a).\np(b).\np(c).");
    assert_eq!(
        solutions(&mut solver, "p(X)", "X"),
        vec!["a", "b", "c"],
    );
}

#[test]
fn rules_and_backtracking() {
    let mut solver = solver(
        "edge(a, b).\nedge(b, c).\nedge(a, d).\n\
         path(X, Y) :- edge(X, Y).\n\
         path(X, Y) :- edge(X, Z), path(Z, Y).",
    );
    // Direct edges first (clause order), then the recursive clause.
    assert_eq!(
        solutions(&mut solver, "path(a, X)", "X"),
        vec!["b", "d", "c"],
    );
}

#[test]
fn unknown_predicate_has_no_solutions() {
    let mut solver = solver("p(a).");
    let goal = parse::goal("ghost(X)").unwrap();
    assert!(!solver.has_solution(&goal).unwrap());
}

#[test]
fn library_member() {
    let mut solver = Solver::new(Db::library());
    assert_eq!(
        solutions(&mut solver, "member(X, [a, b, c])", "X"),
        vec!["a", "b", "c"],
    );
    let goal = parse::goal("member(b, [a, b])").unwrap();
    assert!(solver.has_solution(&goal).unwrap());
    let goal = parse::goal("member(z, [a, b])").unwrap();
    assert!(!solver.has_solution(&goal).unwrap());
}

#[test]
fn library_append() {
    let mut solver = Solver::new(Db::library());
    assert_eq!(
        solutions(&mut solver, "append([a], [b, c], X)", "X"),
        vec!["[a, b, c]"],
    );
    // Backtracking over all splits.
    assert_eq!(
        solutions(&mut solver, "append(X, Y, [a, b])", "s(X, Y)"),
        vec!["s([], [a, b])", "s([a], [b])", "s([a, b], [])"],
    );
}

#[test]
fn library_length() {
    let mut solver = Solver::new(Db::library());
    assert_eq!(
        solutions(&mut solver, "length([a, b, c], N)", "N"),
        vec!["3"],
    );
}

#[test]
fn findall_collects_and_is_deterministic() {
    let mut solver = solver("p(a).\np(b).");
    assert_eq!(
        solutions(&mut solver, "findall(f(X), p(X), L)", "L"),
        vec!["[f(a), f(b)]"],
    );
    // findall of a failing goal gives the empty list, it does not fail.
    assert_eq!(
        solutions(&mut solver, "findall(X, ghost(X), L)", "L"),
        vec!["[]"],
    );
}

#[test]
fn negation_as_failure() {
    let mut solver = solver("p(a).");
    assert!(solver
        .has_solution(&parse::goal("\\+ p(b)").unwrap())
        .unwrap());
    assert!(!solver
        .has_solution(&parse::goal("\\+ p(a)").unwrap())
        .unwrap());
    // Negation never binds.
    assert_eq!(
        solutions(&mut solver, "\\+ q(X), X = unbound_until_here", "X"),
        vec!["unbound_until_here"],
    );
}

#[test]
fn forall_all_or_nothing() {
    let mut solver = solver("n(1).\nn(2).\nn(3).");
    assert!(solver
        .has_solution(&parse::goal("forall(n(X), X > 0)").unwrap())
        .unwrap());
    assert!(!solver
        .has_solution(&parse::goal("forall(n(X), X > 1)").unwrap())
        .unwrap());
}

#[test]
fn disjunction_is_ordered() {
    let mut solver = solver("p(a).\nq(b).");
    assert_eq!(
        solutions(&mut solver, "p(X) ; q(X)", "X"),
        vec!["a", "b"],
    );
}

#[test]
fn call_executes_its_argument() {
    let mut solver = solver("always.\ng(always).");
    assert!(solver
        .has_solution(&parse::goal("g(G), call(G)").unwrap())
        .unwrap());
}

#[test]
fn arithmetic() {
    let mut solver = Solver::new(Db::library());
    assert_eq!(solutions(&mut solver, "X is 2 + 3 * 4", "X"), vec!["14"]);
    assert_eq!(solutions(&mut solver, "X is -(2 + 3)", "X"), vec!["-5"]);
    assert_eq!(solutions(&mut solver, "X is 7 / 2", "X"), vec!["3"]);
    assert_eq!(solutions(&mut solver, "X is 1.5 + 1", "X"), vec!["2.5"]);

    assert!(solver
        .has_solution(&parse::goal("0.33 >= 0, 0.33 < 0.5").unwrap())
        .unwrap());
    assert!(solver.has_solution(&parse::goal("2 =:= 2.0").unwrap()).unwrap());
    assert!(solver.has_solution(&parse::goal("1 =\\= 2").unwrap()).unwrap());
}

#[test]
fn arithmetic_type_errors() {
    let mut solver = Solver::new(Db::library());
    let err = solver
        .has_solution(&parse::goal("X is foo + 1").unwrap())
        .unwrap_err();
    assert!(matches!(err.source, Error::Type { .. }), "got: {}", err);

    let err = solver
        .has_solution(&parse::goal("X is Y + 1").unwrap())
        .unwrap_err();
    assert!(matches!(err.source, Error::Type { .. }), "got: {}", err);
}

#[test]
fn assertz_and_retractall() {
    let mut solver = solver("p(a).");
    assert!(solver
        .has_solution(&parse::goal("assertz(p(b)), p(b)").unwrap())
        .unwrap());
    // The mutation persists across queries on the same snapshot.
    assert_eq!(solutions(&mut solver, "p(X)", "X"), vec!["a", "b"]);

    assert!(solver
        .has_solution(&parse::goal("retractall(p(_))").unwrap())
        .unwrap());
    assert!(!solver.has_solution(&parse::goal("p(_)").unwrap()).unwrap());
}

#[test]
fn zero_timeout_aborts() {
    let mut solver = Solver::new(Db::library()).with_deadline(Deadline::in_millis(0));
    let err = solver
        .has_solution(&parse::goal("member(X, [a, b])").unwrap())
        .unwrap_err();
    assert!(err.is_timeout(), "got: {}", err);
}

#[test]
fn deadline_bounds_runaway_queries() {
    let mut solver = Solver::new(Db::consult("loop :- loop2.\nloop2 :- loop.").unwrap())
        .with_deadline(Deadline::in_millis(50));
    let err = solver
        .has_solution(&parse::goal("loop").unwrap())
        .unwrap_err();
    // Either the deadline or the depth limit fires first; both abort cleanly.
    assert!(
        err.is_timeout() || matches!(err.source, Error::Depth { .. }),
        "got: {}",
        err
    );
}

#[test]
fn depth_limit_reports() {
    let mut solver =
        Solver::new(Db::consult("down :- down.").unwrap()).with_max_depth(64);
    let err = solver
        .has_solution(&parse::goal("down").unwrap())
        .unwrap_err();
    assert!(matches!(err.source, Error::Depth { limit: 64 }), "got: {}", err);
}

#[test]
fn stop_flow_short_circuits() {
    let mut solver = solver("p(a).\np(b).\np(c).");
    let goal = parse::goal("p(X)").unwrap();
    let mut count = 0;
    solver
        .enumerate(&goal, &mut |_| {
            count += 1;
            if count == 2 {
                Flow::Stop
            } else {
                Flow::Continue
            }
        })
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn renaming_keeps_recursive_clauses_apart() {
    // `double` uses the same clause twice at different depths; without
    // renaming the two activations would share `X`.
    let mut solver = solver(
        "wrap(X, w(X)).\n\
         double(X, Z) :- wrap(X, Y), wrap(Y, Z).",
    );
    assert_eq!(
        solutions(&mut solver, "double(a, Z)", "Z"),
        vec!["w(w(a))"],
    );
}

#[test]
fn dice0_guard_semantics() {
    let mut solver = Solver::new(Db::library());
    // No dice fact asserted: the guard is vacuous.
    assert!(solver
        .has_solution(&parse::goal("dice0(0.0, 0.1)").unwrap())
        .unwrap());

    // With a dice fact the bounds matter.
    assert!(solver
        .has_solution(&parse::goal("assertz(dice0_value(0.25)), dice0(0.2, 0.3)").unwrap())
        .unwrap());
    assert!(!solver
        .has_solution(&parse::goal("dice0(0.3, 1.0)").unwrap())
        .unwrap());
    assert!(solver
        .has_solution(&parse::goal("dice0(0, 1)").unwrap())
        .unwrap());
}

#[test]
fn goal_must_be_callable() {
    let mut solver = Solver::new(Db::library());
    assert!(solver
        .has_solution(&parse::goal("X = 7, call(X)").unwrap())
        .is_err());
}

#[test]
fn collect_resolves_templates() {
    let mut solver = solver("age(alice, 31).\nage(bob, 12).");
    let goal = parse::goal("age(P, N), N > 18").unwrap();
    let template = Term::var(term::Var::new("P"));
    let adults = solver.collect(&goal, &template).unwrap();
    assert_eq!(adults, vec![Term::atom("alice")]);
}
