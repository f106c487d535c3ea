//! Tests over the clause database.

crate::prelude!();

use crate::db::{Db, Indicator};

const SPEC: &str = "\
initial(s0).
transition(s0, a, s1).
transition(s1, b, s2).
prop(s2, done).
";

#[test]
fn consult_keeps_clause_order() {
    let db = Db::consult(SPEC).unwrap();
    let clauses = db
        .clauses_for(&Indicator::new("transition", 3))
        .unwrap();
    assert_eq!(clauses.len(), 2);
    assert_eq!(clauses[0].head().to_string(), "transition(s0, a, s1)");
    assert_eq!(clauses[1].head().to_string(), "transition(s1, b, s2)");
    assert_eq!(db.source(), SPEC);
}

#[test]
fn consult_reports_parse_position() {
    let err = Db::consult("initial(s0).\ntransition(s0, a\n").unwrap_err();
    assert!(err.is_parse(), "got: {}", err);
}

#[test]
fn discontiguous_is_rejected() {
    let src = "\
p(a).
q(b).
p(c).
";
    let err = Db::consult(src).unwrap_err();
    match err.source {
        Error::Discontiguous { ref pred, row, .. } => {
            assert_eq!(pred, "p/1");
            assert_eq!(row, 2);
        }
        ref e => panic!("expected discontiguous error, got: {}", e),
    }
}

#[test]
fn builtins_cannot_be_redefined() {
    let err = Db::consult("member(a, b).").unwrap_err();
    match err.source {
        Error::Redefine { ref pred } => assert_eq!(pred, "member/2"),
        ref e => panic!("expected redefine error, got: {}", e),
    }

    let mut db = Db::library();
    let clause = parse::clause("findall(a, b, c).").unwrap();
    assert!(db.assertz(clause).is_err());
}

#[test]
fn assertz_appends_at_the_end() {
    let mut db = Db::consult("p(a).").unwrap();
    db.assertz(parse::clause("p(b).").unwrap()).unwrap();
    let clauses = db.clauses_for(&Indicator::new("p", 1)).unwrap();
    assert_eq!(clauses.len(), 2);
    assert_eq!(clauses[1].head().to_string(), "p(b)");
}

#[test]
fn retract_all_by_pattern() {
    let mut db = Db::consult("p(a, 1).\np(b, 2).\np(a, 3).").unwrap();
    db.retract_all(&parse::goal("p(a, _)").unwrap()).unwrap();
    let clauses = db.clauses_for(&Indicator::new("p", 2)).unwrap();
    assert_eq!(clauses.len(), 1);
    assert_eq!(clauses[0].head().to_string(), "p(b, 2)");

    // Retracting everything drops the predicate.
    db.retract_all(&parse::goal("p(_, _)").unwrap()).unwrap();
    assert!(db.clauses_for(&Indicator::new("p", 2)).is_none());

    // Unknown predicates are fine.
    db.retract_all(&parse::goal("ghost(_)").unwrap()).unwrap();
}

#[test]
fn snapshots_are_isolated_from_writers() {
    let mut db = Db::consult("p(a).").unwrap();
    let before = db.clauses_for(&Indicator::new("p", 1)).unwrap();
    db.assertz(parse::clause("p(b).").unwrap()).unwrap();
    assert_eq!(before.len(), 1, "snapshot must not see the new clause");
    assert_eq!(
        db.clauses_for(&Indicator::new("p", 1)).unwrap().len(),
        2
    );
}

#[test]
fn library_survives_reset() {
    let db = Db::library();
    for (name, arity) in [("member", 2), ("append", 3), ("length", 2), ("forall", 2)] {
        let key = Indicator::new(name, arity);
        assert!(db.clauses_for(&key).is_some(), "missing `{}`", key);
        assert!(db.is_protected(&key));
    }
    assert!(db.source().is_empty());
}
