//! CTL satisfaction over the Kripke structure a loaded specification encodes.
//!
//! The structure is derived, not stored: states and the transition relation
//! are whatever `transition/3` enumerates, the labeling is `prop/2`.
//! Formulas are a native sum type rather than interpreter terms, which
//! keeps the evaluator decoupled from the resolver's representation.
//!
//! Every temporal operator carries a visited list *along the current
//! recursive descent* (pushed before descending into successors, popped
//! after), so cycles cannot cause unbounded recursion while sibling
//! branches stay independent. Revisiting a state counts as cycle-success
//! for `eg`/`ag` and as failure for `ef`/`af`/`eu`/`au`.

prelude!();

use crate::solve::Solver;
use crate::term::Term;


/// A CTL formula.
///
/// Surface syntax is prefix constructors over atoms, e.g.
/// `ag(ef(atom(ready)))`; see [`crate::parse::formula`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formula {
    /// Atomic proposition, satisfied in states `S` with `prop(S, p)`.
    Atom(String),
    /// Negation.
    Not(Box<Formula>),
    /// Conjunction.
    And(Box<Formula>, Box<Formula>),
    /// Disjunction.
    Or(Box<Formula>, Box<Formula>),
    /// Some successor satisfies the formula.
    Ex(Box<Formula>),
    /// There is at least one successor and all of them satisfy the formula.
    Ax(Box<Formula>),
    /// Some path eventually reaches a satisfying state.
    Ef(Box<Formula>),
    /// All paths eventually reach a satisfying state.
    Af(Box<Formula>),
    /// Some path satisfies the formula globally.
    Eg(Box<Formula>),
    /// All paths satisfy the formula globally.
    Ag(Box<Formula>),
    /// Some path satisfies the first formula until the second holds.
    Eu(Box<Formula>, Box<Formula>),
    /// All paths satisfy the first formula until the second holds.
    Au(Box<Formula>, Box<Formula>),
}
impl Formula {
    /// Atomic proposition constructor.
    pub fn atom<S: Into<String>>(p: S) -> Self {
        Self::Atom(p.into())
    }
    /// Negation constructor.
    pub fn not(f: Self) -> Self {
        Self::Not(Box::new(f))
    }
    /// Conjunction constructor.
    pub fn and(f: Self, g: Self) -> Self {
        Self::And(Box::new(f), Box::new(g))
    }
    /// Disjunction constructor.
    pub fn or(f: Self, g: Self) -> Self {
        Self::Or(Box::new(f), Box::new(g))
    }
    /// `EX` constructor.
    pub fn ex(f: Self) -> Self {
        Self::Ex(Box::new(f))
    }
    /// `AX` constructor.
    pub fn ax(f: Self) -> Self {
        Self::Ax(Box::new(f))
    }
    /// `EF` constructor.
    pub fn ef(f: Self) -> Self {
        Self::Ef(Box::new(f))
    }
    /// `AF` constructor.
    pub fn af(f: Self) -> Self {
        Self::Af(Box::new(f))
    }
    /// `EG` constructor.
    pub fn eg(f: Self) -> Self {
        Self::Eg(Box::new(f))
    }
    /// `AG` constructor.
    pub fn ag(f: Self) -> Self {
        Self::Ag(Box::new(f))
    }
    /// `EU` constructor.
    pub fn eu(f: Self, g: Self) -> Self {
        Self::Eu(Box::new(f), Box::new(g))
    }
    /// `AU` constructor.
    pub fn au(f: Self, g: Self) -> Self {
        Self::Au(Box::new(f), Box::new(g))
    }
}
impl fmt::Display for Formula {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Atom(p) => write!(fmt, "atom({})", Term::atom(p.clone())),
            Self::Not(f) => write!(fmt, "not({})", f),
            Self::And(f, g) => write!(fmt, "and({}, {})", f, g),
            Self::Or(f, g) => write!(fmt, "or({}, {})", f, g),
            Self::Ex(f) => write!(fmt, "ex({})", f),
            Self::Ax(f) => write!(fmt, "ax({})", f),
            Self::Ef(f) => write!(fmt, "ef({})", f),
            Self::Af(f) => write!(fmt, "af({})", f),
            Self::Eg(f) => write!(fmt, "eg({})", f),
            Self::Ag(f) => write!(fmt, "ag({})", f),
            Self::Eu(f, g) => write!(fmt, "eu({}, {})", f, g),
            Self::Au(f, g) => write!(fmt, "au({}, {})", f, g),
        }
    }
}

/// True iff every initial state satisfies the formula.
///
/// Quantification over `initial/1` is **universal**: `check` holds when
/// all initial states satisfy `formula`, and is vacuously true for a
/// specification with no initial states.
pub fn check(solver: &mut Solver, formula: &Formula) -> Res<bool> {
    let state = build_term!((var S));
    let initials = solver.collect(&build_term!((initial (var S))), &state)?;
    for initial in &initials {
        if !sat(solver, initial, formula)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// True iff `state` satisfies `formula`.
pub fn sat(solver: &mut Solver, state: &Term, formula: &Formula) -> Res<bool> {
    match formula {
        Formula::Atom(p) => {
            let goal = Term::app("prop", vec![state.clone(), Term::atom(p.clone())]);
            solver.has_solution(&goal)
        }
        Formula::Not(f) => Ok(!sat(solver, state, f)?),
        Formula::And(f, g) => Ok(sat(solver, state, f)? && sat(solver, state, g)?),
        Formula::Or(f, g) => Ok(sat(solver, state, f)? || sat(solver, state, g)?),
        Formula::Ex(f) => {
            for succ in successors(solver, state)? {
                if sat(solver, &succ, f)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Formula::Ax(f) => {
            let succs = successors(solver, state)?;
            if succs.is_empty() {
                return Ok(false);
            }
            for succ in succs {
                if !sat(solver, &succ, f)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Formula::Ef(f) => ef(solver, state, f, &mut vec![]),
        Formula::Af(f) => af(solver, state, f, &mut vec![]),
        Formula::Eg(f) => eg(solver, state, f, &mut vec![]),
        Formula::Ag(f) => ag(solver, state, f, &mut vec![]),
        Formula::Eu(f, g) => eu(solver, state, f, g, &mut vec![]),
        Formula::Au(f, g) => au(solver, state, f, g, &mut vec![]),
    }
}

/// Successor states of `state`, in transition order, de-duplicated.
fn successors(solver: &mut Solver, state: &Term) -> Res<Vec<Term>> {
    let next = build_term!((var Next));
    let goal = Term::app(
        "transition",
        vec![state.clone(), build_term!((var _Label)), next.clone()],
    );
    let mut succs: Vec<Term> = vec![];
    for succ in solver.collect(&goal, &next)? {
        if !succs.contains(&succ) {
            succs.push(succ);
        }
    }
    Ok(succs)
}

fn ef(solver: &mut Solver, state: &Term, f: &Formula, visited: &mut Vec<Term>) -> Res<bool> {
    if sat(solver, state, f)? {
        return Ok(true);
    }
    if visited.contains(state) {
        return Ok(false);
    }
    visited.push(state.clone());
    for succ in successors(solver, state)? {
        if ef(solver, &succ, f, visited)? {
            visited.pop();
            return Ok(true);
        }
    }
    visited.pop();
    Ok(false)
}

fn af(solver: &mut Solver, state: &Term, f: &Formula, visited: &mut Vec<Term>) -> Res<bool> {
    if sat(solver, state, f)? {
        return Ok(true);
    }
    if visited.contains(state) {
        return Ok(false);
    }
    let succs = successors(solver, state)?;
    if succs.is_empty() {
        return Ok(false);
    }
    visited.push(state.clone());
    for succ in succs {
        if !af(solver, &succ, f, visited)? {
            visited.pop();
            return Ok(false);
        }
    }
    visited.pop();
    Ok(true)
}

fn eg(solver: &mut Solver, state: &Term, f: &Formula, visited: &mut Vec<Term>) -> Res<bool> {
    if !sat(solver, state, f)? {
        return Ok(false);
    }
    if visited.contains(state) {
        // A lasso: the path loops while satisfying `f` throughout.
        return Ok(true);
    }
    visited.push(state.clone());
    for succ in successors(solver, state)? {
        if eg(solver, &succ, f, visited)? {
            visited.pop();
            return Ok(true);
        }
    }
    visited.pop();
    Ok(false)
}

fn ag(solver: &mut Solver, state: &Term, f: &Formula, visited: &mut Vec<Term>) -> Res<bool> {
    if !sat(solver, state, f)? {
        return Ok(false);
    }
    if visited.contains(state) {
        return Ok(true);
    }
    visited.push(state.clone());
    for succ in successors(solver, state)? {
        if !ag(solver, &succ, f, visited)? {
            visited.pop();
            return Ok(false);
        }
    }
    visited.pop();
    Ok(true)
}

fn eu(
    solver: &mut Solver,
    state: &Term,
    f: &Formula,
    g: &Formula,
    visited: &mut Vec<Term>,
) -> Res<bool> {
    if sat(solver, state, g)? {
        return Ok(true);
    }
    if visited.contains(state) || !sat(solver, state, f)? {
        return Ok(false);
    }
    visited.push(state.clone());
    for succ in successors(solver, state)? {
        if eu(solver, &succ, f, g, visited)? {
            visited.pop();
            return Ok(true);
        }
    }
    visited.pop();
    Ok(false)
}

fn au(
    solver: &mut Solver,
    state: &Term,
    f: &Formula,
    g: &Formula,
    visited: &mut Vec<Term>,
) -> Res<bool> {
    if sat(solver, state, g)? {
        return Ok(true);
    }
    if visited.contains(state) || !sat(solver, state, f)? {
        return Ok(false);
    }
    let succs = successors(solver, state)?;
    if succs.is_empty() {
        return Ok(false);
    }
    visited.push(state.clone());
    for succ in succs {
        if !au(solver, &succ, f, g, visited)? {
            visited.pop();
            return Ok(false);
        }
    }
    visited.pop();
    Ok(true)
}
