//! Core API façade: lifecycle, queries, checks, views, concurrency gating.
//!
//! One [`Engine`] lives for the process lifetime. The clause database sits
//! behind a reader-writer lock; load, reset and assert take it exclusively,
//! while queries, CTL checks and projections clone a copy-on-write snapshot
//! and run lock-free on it, so every reader observes either the pre-load or
//! the post-load database, never a torn state. The cached simulation result
//! is replaced atomically at the end of every successful load.
//!
//! Inputs and outputs are strings, typed records and booleans, never
//! interpreter-internal term structures.

prelude!();

use serde::{Deserialize, Serialize};

use crate::db::Db;
use crate::project::{
    ActorMachine, BarValue, Doc, LineSeries, PieSlice, Property, SequenceDiagram, StateMachine,
};
use crate::sim::Simulation;
use crate::solve::{Deadline, Flow, Solver};
use crate::term::Term;

#[cfg(test)]
mod test;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Simulation walk length.
    pub sim_steps: usize,
    /// Simulation seed; `None` seeds from entropy.
    pub sim_seed: Option<u64>,
    /// Resolution recursion limit.
    pub max_depth: usize,
    /// Cap on the solutions enumerated by [`Engine::raw_query`].
    pub max_solutions: usize,
    /// Deadline applied to projection queries.
    pub view_timeout: Duration,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            sim_steps: 1000,
            sim_seed: None,
            max_depth: solve::DEFAULT_MAX_DEPTH,
            max_solutions: 512,
            view_timeout: Duration::from_secs(5),
        }
    }
}

/// Outcome of a raw query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    /// True if the goal has at least one solution.
    pub ok: bool,
    /// Rendered solutions, one per success, `X = v`-style for the goal's
    /// named variables (`true` when it has none). Capped by
    /// [`Config::max_solutions`].
    pub solutions: Vec<String>,
}

/// A named property together with its check outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyResult {
    /// Property name.
    pub name: String,
    /// Human description.
    pub description: String,
    /// CTL formula source.
    pub formula: String,
    /// Check outcome, absent when the check errored.
    pub satisfied: Option<bool>,
    /// Check error, if any.
    pub error: Option<String>,
}

/// The specification-and-verification engine.
pub struct Engine {
    /// Clause database, exclusive writers / snapshotting readers.
    db: Arc<RwLock<Db>>,
    /// Cached simulation of the last successful load.
    sim: RwLock<Option<Arc<Simulation>>>,
    /// Configuration.
    config: Config,
}
impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
impl Engine {
    /// An engine holding only the built-in vocabulary and helper library.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }
    /// Constructor with an explicit configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            db: Arc::new(RwLock::new(Db::library())),
            sim: RwLock::new(None),
            config,
        }
    }

    /// A solver over the current database snapshot.
    fn solver(&self, deadline: Deadline) -> Solver {
        Solver::new(read_lock(&self.db).clone())
            .with_deadline(deadline)
            .with_max_depth(self.config.max_depth)
            .write_through(self.db.clone())
    }
    /// A solver for projection queries, bounded by the view timeout.
    fn view_solver(&self) -> Solver {
        self.solver(Deadline::after(self.config.view_timeout))
    }

    /// Loads a specification, replacing the database atomically.
    ///
    /// The new database is built aside (helper library plus the source's
    /// clauses); on a parse, redefinition or discontiguity error the
    /// previous database is left untouched. On success the simulation is
    /// run and its cached result swapped in.
    pub fn load(&self, source: &str) -> Res<()> {
        let db = Db::consult(source)?;
        let preds = db.pred_count();
        *write_lock(&self.db) = db;
        tracing::info!(predicates = preds, "specification loaded");

        let sim = sim::run(&self.db, self.config.sim_steps, self.config.sim_seed);
        *write_lock(&self.sim) = Some(Arc::new(sim));
        Ok(())
    }

    /// Drops all user clauses; built-ins and the helper library remain.
    pub fn reset(&self) {
        *write_lock(&self.db) = Db::library();
        *write_lock(&self.sim) = None;
        tracing::info!("engine reset");
    }

    /// The retained specification source, verbatim.
    pub fn source(&self) -> String {
        read_lock(&self.db).source().to_string()
    }

    /// Parses and appends a single clause.
    pub fn assert_clause(&self, text: &str) -> Res<()> {
        let clause = parse::clause(text)?;
        write_lock(&self.db).assertz(clause)
    }

    /// Executes a goal, enumerating solutions up to the configured cap.
    pub fn raw_query(&self, text: &str, deadline: Deadline) -> Res<QueryResult> {
        let goal = parse::goal(text)?;
        let mut vars = vec![];
        goal.named_vars(&mut vars);

        let mut solver = self.solver(deadline);
        let mut solutions = vec![];
        let cap = self.config.max_solutions;
        solver.enumerate(&goal, &mut |env| {
            // Variables the solution leaves free are omitted, toplevel-style.
            let rendered = vars
                .iter()
                .filter_map(|var| {
                    let value = env.resolve(&Term::var(var.clone()));
                    if value == Term::var(var.clone()) {
                        None
                    } else {
                        Some(format!("{} = {}", var, value))
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            if rendered.is_empty() {
                solutions.push("true".to_string());
            } else {
                solutions.push(rendered);
            }
            if solutions.len() >= cap {
                Flow::Stop
            } else {
                Flow::Continue
            }
        })?;
        Ok(QueryResult {
            ok: !solutions.is_empty(),
            solutions,
        })
    }

    /// Checks a CTL formula against the loaded specification.
    ///
    /// Quantification over initial states is **universal**: the formula
    /// must hold in every `initial/1` state. A specification with no
    /// initial states satisfies everything vacuously.
    pub fn check_ctl(&self, formula: &str, deadline: Deadline) -> Res<bool> {
        let formula = parse::formula(formula)?;
        ctl::check(&mut self.solver(deadline), &formula)
    }

    /// The composed state machine view.
    pub fn state_machine(&self) -> StateMachine {
        project::state_machine(&mut self.view_solver())
    }
    /// Per-actor state machines.
    pub fn actor_machines(&self) -> Vec<ActorMachine> {
        project::actor_machines(&mut self.view_solver())
    }
    /// The sequence diagram view.
    pub fn sequence_diagram(&self) -> SequenceDiagram {
        project::sequence_diagram(&mut self.view_solver())
    }
    /// The pie series.
    pub fn pie_chart(&self) -> Vec<PieSlice> {
        project::pie_chart(&mut self.view_solver())
    }
    /// The bar series.
    pub fn bar_chart(&self) -> Vec<BarValue> {
        project::bar_chart(&mut self.view_solver())
    }
    /// The line series.
    pub fn line_chart(&self) -> Vec<LineSeries> {
        project::line_chart(&mut self.view_solver())
    }
    /// The named properties.
    pub fn properties(&self) -> Vec<Property> {
        project::properties(&mut self.view_solver())
    }
    /// Documentation entries.
    pub fn docs(&self) -> Vec<Doc> {
        project::docs(&mut self.view_solver())
    }
    /// Declared actors.
    pub fn actors(&self) -> Vec<String> {
        project::actors(&mut self.view_solver())
    }

    /// Checks one named property.
    pub fn check_property(&self, name: &str, deadline: Deadline) -> Res<bool> {
        let properties = self.properties();
        let property = match properties.iter().find(|p| p.name == name) {
            Some(property) => property,
            None => bail!("no property named `{}`", name),
        };
        let formula = parse::formula(&property.formula)
            .chain_err(|| format!("in the formula of property `{}`", name))?;
        ctl::check(&mut self.solver(deadline), &formula)
    }

    /// Checks every named property, reporting outcomes side by side.
    pub fn check_properties(&self, deadline: Deadline) -> Vec<PropertyResult> {
        self.properties()
            .into_iter()
            .map(|property| {
                let mut result = PropertyResult {
                    name: property.name,
                    description: property.description,
                    formula: property.formula,
                    satisfied: None,
                    error: None,
                };
                let checked = parse::formula(&result.formula)
                    .and_then(|formula| ctl::check(&mut self.solver(deadline), &formula));
                match checked {
                    Ok(satisfied) => result.satisfied = Some(satisfied),
                    Err(e) => result.error = Some(e.to_string()),
                }
                result
            })
            .collect()
    }

    /// The cached simulation of the last load, empty if never loaded.
    pub fn simulation(&self) -> Arc<Simulation> {
        read_lock(&self.sim)
            .clone()
            .unwrap_or_else(|| Arc::new(Simulation::default()))
    }
}
