//! Tests over terms and unification.

crate::prelude!();

use crate::term::{Bindings, Term, Var};

#[test]
fn walk_follows_chains() {
    let mut env = Bindings::new();
    let x = Var::new("X");
    let y = Var::new("Y");

    assert!(env.unify(&Term::var(x.clone()), &Term::var(y.clone())));
    assert!(env.unify(&Term::var(y), &Term::atom("s0")));

    assert_eq!(env.walk(&Term::var(x)), Term::atom("s0"));
}

#[test]
fn unify_compounds() {
    let mut env = Bindings::new();
    let lhs = build_term!((transition s0 (var L) (var To)));
    let rhs = build_term!((transition (var F) a s1));

    assert!(env.unify(&lhs, &rhs));
    assert_eq!(env.resolve(&lhs), env.resolve(&rhs));
    assert_eq!(env.resolve(&rhs).to_string(), "transition(s0, a, s1)");
}

#[test]
fn unify_mismatch() {
    let mut env = Bindings::new();

    // Functor mismatch.
    assert!(!env.unify(&build_term!((f a)), &build_term!((g a))));
    // Arity mismatch.
    assert!(!env.unify(&build_term!((f a)), &build_term!((f a b))));
    // Atom vs number.
    assert!(!env.unify(&Term::atom("7"), &Term::int(7)));
    // Int vs float: numbers unify only when identical.
    assert!(!env.unify(&Term::int(3), &Term::float(3.0)));
}

#[test]
fn undo_to_mark() {
    let mut env = Bindings::new();
    let x = Var::new("X");

    assert!(env.unify(&Term::var(x.clone()), &Term::atom("a")));
    let mark = env.mark();
    let y = Var::new("Y");
    assert!(env.unify(&Term::var(y.clone()), &Term::atom("b")));
    assert!(env.lookup(&y).is_some());

    env.undo_to(mark);

    assert!(env.lookup(&y).is_none(), "binding after mark must be undone");
    assert!(env.lookup(&x).is_some(), "binding before mark must survive");
}

#[test]
fn partial_bindings_survive_failed_unification() {
    let mut env = Bindings::new();
    let mark = env.mark();
    // First argument binds X, second argument fails.
    assert!(!env.unify(&build_term!((f (var X) a)), &build_term!((f s0 b))));
    env.undo_to(mark);
    assert!(env.lookup(&Var::new("X")).is_none());
}

#[test]
fn stamps_keep_variables_apart() {
    let mut env = Bindings::new();
    let x0 = Var::new("X");
    let x1 = Var::with_stamp("X", 1);

    assert!(env.unify(&Term::var(x0.clone()), &Term::atom("a")));
    assert!(env.lookup(&x1).is_none());
    assert!(env.unify(&Term::var(x1), &Term::atom("b")));
    assert_eq!(env.walk(&Term::var(x0)), Term::atom("a"));
}

#[test]
fn list_construction() {
    let list = Term::list(vec![Term::atom("a"), Term::atom("b"), Term::int(3)]);
    assert_eq!(list.to_string(), "[a, b, 3]");

    let elems = list.as_list().unwrap();
    assert_eq!(elems.len(), 3);

    let partial = Term::cons(Term::atom("h"), Term::var(Var::new("T")));
    assert_eq!(partial.to_string(), "[h | T]");
    assert!(partial.as_list().is_none());
}

#[test]
fn char_list_round_trip() {
    let t = Term::char_list("agree");
    assert_eq!(t.char_codes().unwrap(), b"agree");
    assert_eq!(t.text(), "agree");

    // Not every int list is text, but `text` decodes whatever fits in bytes.
    assert!(Term::list(vec![Term::atom("a")]).char_codes().is_none());
    assert!(Term::nil().char_codes().is_none());
    assert!(Term::list(vec![Term::int(1000)]).char_codes().is_none());
}

#[test]
fn atom_quoting() {
    assert_eq!(Term::atom("s0").to_string(), "s0");
    assert_eq!(Term::atom("Weird").to_string(), "'Weird'");
    assert_eq!(Term::atom("two words").to_string(), "'two words'");
    assert_eq!(Term::atom("don't").to_string(), "'don''t'");
    assert_eq!(Term::atom("[]").to_string(), "[]");
}

#[test]
fn display_goals() {
    let goal = build_term!((
        ","
        (state_guard (var S) (var G))
        (call (var G))
    ));
    assert_eq!(goal.to_string(), "state_guard(S, G), call(G)");

    let neg = build_term!(("\\+" (dice0_value (var D))));
    assert_eq!(neg.to_string(), "\\+ dice0_value(D)");
}
