//! Guarded stochastic simulation over the composed state machine.
//!
//! Runs once per successful load. Each actor (the prefix of a state name
//! before its first `_`) walks its own current state; each step samples a
//! scalar in `[0, 1)`, exposes it as the dynamic fact `dice0_value/1`,
//! enumerates the transitions whose state and transition guards succeed,
//! and fires one uniformly at random. The walk stops early when nothing is
//! enabled.

prelude!();

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::db::{Clause, Db};
use crate::solve::Solver;
use crate::term::Term;

#[cfg(test)]
mod test;

/// One fired transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Step index, starts at `0`.
    pub step: usize,
    /// Source state.
    pub from: String,
    /// Transition label.
    pub label: String,
    /// Target state.
    pub to: String,
}

/// An immutable simulation result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    /// Fired-transition counts by label.
    pub by_label: Map<String, u64>,
    /// Fired-transition counts by source actor.
    pub by_source: Map<String, u64>,
    /// Fired-transition counts by destination actor.
    pub by_dest: Map<String, u64>,
    /// Event timeline.
    pub timeline: Vec<Event>,
    /// Number of fired transitions.
    pub total: u64,
    /// Number of steps the walk was configured for.
    pub steps: usize,
}

/// The actor owning a state: the prefix before the first `_`, or the whole
/// name when there is none.
///
/// # Examples
///
/// ```rust
/// # use arbor::sim::actor_of;
/// assert_eq!(actor_of("proposer_idle"), "proposer");
/// assert_eq!(actor_of("loner"), "loner");
/// assert_eq!(actor_of("_odd"), "_odd");
/// ```
pub fn actor_of(state: &str) -> &str {
    match state.split_once('_') {
        Some((prefix, _)) if !prefix.is_empty() => prefix,
        _ => state,
    }
}

/// Scoped `dice0_value/1` fact.
///
/// Asserts the sample on construction and retracts it on drop, so the fact
/// cannot leak past a step on any exit path.
struct DiceFact<'a> {
    db: &'a Arc<RwLock<Db>>,
}
impl<'a> DiceFact<'a> {
    fn set(db: &'a Arc<RwLock<Db>>, value: f64) -> Self {
        let fact = Clause::new(Term::app("dice0_value", vec![Term::float(value)]), None);
        let mut guard = write_lock(db);
        Self::retract(&mut guard);
        if let Err(e) = guard.assertz(fact) {
            tracing::warn!(error = %e, "could not assert the dice fact");
        }
        Self { db }
    }

    fn retract(db: &mut Db) {
        let pattern = build_term!((dice0_value (var _D)));
        if let Err(e) = db.retract_all(&pattern) {
            tracing::warn!(error = %e, "could not retract the dice fact");
        }
    }
}
impl Drop for DiceFact<'_> {
    fn drop(&mut self) {
        Self::retract(&mut write_lock(self.db));
    }
}

/// One transition of the walk, kept as terms so guard goals can be built
/// without re-parsing.
struct Edge {
    from: Term,
    label: Term,
    to: Term,
}

/// Runs the simulation against the shared database.
///
/// Guard evaluation failures are logged, not surfaced: a lookup failure
/// counts as "no guard" and an evaluation failure disables the transition,
/// so a broken guard cannot wedge a load.
pub fn run(db: &Arc<RwLock<Db>>, steps: usize, seed: Option<u64>) -> Simulation {
    let mut sim = Simulation {
        steps,
        ..Simulation::default()
    };

    let mut solver = Solver::new(read_lock(db).clone());
    let edges = collect_edges(&mut solver);
    let initials = solver
        .collect(&build_term!((initial (var S))), &build_term!((var S)))
        .unwrap_or_default();
    if edges.is_empty() || initials.is_empty() {
        return sim;
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // Current state per actor.
    let mut current: IndexMap<String, Term> = IndexMap::new();
    for initial in initials {
        current.insert(actor_of(&initial.text()).to_string(), initial);
    }

    for step in 0..steps {
        let _dice = DiceFact::set(db, rng.gen::<f64>());
        // Fresh snapshot so guards observe the step's dice fact.
        let mut solver = Solver::new(read_lock(db).clone());

        let mut enabled: Vec<&Edge> = vec![];
        for state in current.values() {
            for edge in &edges {
                if edge.from == *state && edge_enabled(&mut solver, edge) {
                    enabled.push(edge);
                }
            }
        }
        if enabled.is_empty() {
            break;
        }

        let edge = enabled[rng.gen_range(0..enabled.len())];
        let (from, label, to) = (edge.from.text(), edge.label.text(), edge.to.text());
        current.insert(actor_of(&from).to_string(), edge.to.clone());

        *sim.by_label.entry(label.clone()).or_insert(0) += 1;
        *sim.by_source.entry(actor_of(&from).to_string()).or_insert(0) += 1;
        *sim.by_dest.entry(actor_of(&to).to_string()).or_insert(0) += 1;
        sim.total += 1;
        sim.timeline.push(Event {
            step,
            from,
            label,
            to,
        });
    }

    tracing::debug!(
        total = sim.total,
        steps = sim.steps,
        "simulation complete"
    );
    sim
}

fn collect_edges(solver: &mut Solver) -> Vec<Edge> {
    let goal = build_term!((transition (var From) (var Label) (var To)));
    let template = build_term!([(var From), (var Label), (var To)]);
    match solver.collect(&goal, &template) {
        Ok(rows) => rows
            .iter()
            .filter_map(|row| {
                let elems = row.as_list()?;
                Some(Edge {
                    from: elems[0].clone(),
                    label: elems[1].clone(),
                    to: elems[2].clone(),
                })
            })
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "transition enumeration failed, empty simulation");
            vec![]
        }
    }
}

/// A state has a guard iff `state_guard(S, G)` has a solution; enabling
/// then requires `call(G)` to succeed. Likewise `transition_guard/4`.
/// Absence of a guard is unconditional enabling.
fn edge_enabled(solver: &mut Solver, edge: &Edge) -> bool {
    let state_lookup = build_term!((state_guard {edge.from.clone()} (var G)));
    let state_eval = build_term!((
        ","
        (state_guard {edge.from.clone()} (var G))
        (call (var G))
    ));
    if !guard_satisfied(solver, &state_lookup, &state_eval) {
        return false;
    }

    let trans_lookup = build_term!((
        transition_guard
        {edge.from.clone()}
        {edge.label.clone()}
        {edge.to.clone()}
        (var G)
    ));
    let trans_eval = build_term!((
        ","
        (transition_guard
            {edge.from.clone()}
            {edge.label.clone()}
            {edge.to.clone()}
            (var G))
        (call (var G))
    ));
    guard_satisfied(solver, &trans_lookup, &trans_eval)
}

fn guard_satisfied(solver: &mut Solver, lookup: &Term, eval: &Term) -> bool {
    match solver.has_solution(lookup) {
        Ok(false) => true,
        Ok(true) => match solver.has_solution(eval) {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(goal = %eval, error = %e, "guard evaluation failed, disabling");
                false
            }
        },
        Err(e) => {
            tracing::warn!(goal = %lookup, error = %e, "guard lookup failed, treating as unguarded");
            true
        }
    }
}
