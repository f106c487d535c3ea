//! Goal solving: SLD resolution with backtracking, builtins, deadlines.
//!
//! Execution is a lazy enumeration of solutions. Given a goal list and a
//! binding environment, [`Solver::solve`] emits each environment in which
//! the goals succeed, in the order determined by clause order, left-to-right
//! body evaluation and leftmost selection. The emission callback returns a
//! [`Flow`] telling the solver whether to keep enumerating.
//!
//! Cut is not implemented; the supported specifications are written without
//! it.

prelude!();

use crate::db::{Clause, Db, Indicator};
use crate::term::{Bindings, Term};

#[cfg(test)]
mod test;

/// Default recursion limit.
///
/// Turns runaway left recursion into a reported error instead of a stack
/// overflow.
pub const DEFAULT_MAX_DEPTH: usize = 4096;

/// A query deadline.
///
/// The solver polls it before each goal reduction and on each backtrack
/// step; expiry aborts the query with [`Error::Timeout`], never a spurious
/// failure.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Option<Instant>);
impl Deadline {
    /// No deadline.
    pub fn none() -> Self {
        Self(None)
    }
    /// Deadline `duration` from now.
    pub fn after(duration: Duration) -> Self {
        Self(Some(Instant::now() + duration))
    }
    /// Deadline `millis` milliseconds from now.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use arbor::solve::Deadline;
    /// assert!(Deadline::in_millis(0).check().is_err());
    /// assert!(Deadline::none().check().is_ok());
    /// ```
    pub fn in_millis(millis: u64) -> Self {
        Self::after(Duration::from_millis(millis))
    }

    /// Fails with [`Error::Timeout`] if the deadline expired.
    pub fn check(&self) -> Res<()> {
        if let Some(instant) = self.0 {
            if Instant::now() >= instant {
                bail!(Error::Timeout);
            }
        }
        Ok(())
    }
}

/// What the solver should do after a solution was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep enumerating solutions.
    Continue,
    /// Stop, the caller has what it needs.
    Stop,
}

/// Solution callback.
///
/// Receives the environment *at emission time*; callers must extract
/// (resolve) whatever they need inside the callback, the bindings are
/// undone as the solver backtracks out.
pub type OnSolution<'a> = &'a mut dyn FnMut(&Bindings) -> Flow;

/// A solver over a database snapshot.
///
/// The snapshot is copy-on-write: `assertz`/`retractall` goals mutate the
/// local snapshot (so the running query observes its own mutations) and
/// write through to the shared database when one is attached, without the
/// solver ever holding a lock across goal reductions.
pub struct Solver {
    /// Local database snapshot.
    db: Db,
    /// Shared database, write-through target for mutation builtins.
    shared: Option<Arc<RwLock<Db>>>,
    /// Query deadline.
    deadline: Deadline,
    /// Recursion limit.
    max_depth: usize,
    /// Fresh-stamp source for clause renaming.
    gensym: u64,
}
impl Solver {
    /// Constructor over an owned snapshot, no deadline.
    pub fn new(db: Db) -> Self {
        Self {
            db,
            shared: None,
            deadline: Deadline::none(),
            max_depth: DEFAULT_MAX_DEPTH,
            gensym: 0,
        }
    }

    /// Sets the deadline.
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }
    /// Sets the recursion limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
    /// Attaches a shared database for mutation write-through.
    pub fn write_through(mut self, shared: Arc<RwLock<Db>>) -> Self {
        self.shared = Some(shared);
        self
    }

    /// Snapshot accessor.
    pub fn db(&self) -> &Db {
        &self.db
    }

    /// Enumerates the solutions of a goal in a fresh environment.
    pub fn enumerate(&mut self, goal: &Term, out: OnSolution) -> Res<()> {
        let mut env = Bindings::new();
        self.solve(std::slice::from_ref(goal), &mut env, 0, out)?;
        Ok(())
    }

    /// True if the goal has at least one solution.
    pub fn has_solution(&mut self, goal: &Term) -> Res<bool> {
        let mut found = false;
        self.enumerate(goal, &mut |_| {
            found = true;
            Flow::Stop
        })?;
        Ok(found)
    }

    /// All instances of `template` over the solutions of `goal`, findall-style.
    pub fn collect(&mut self, goal: &Term, template: &Term) -> Res<Vec<Term>> {
        let mut collected = vec![];
        self.enumerate(goal, &mut |env| {
            collected.push(env.resolve(template));
            Flow::Continue
        })?;
        Ok(collected)
    }

    /// Solves a goal list, emitting each solution environment through `out`.
    ///
    /// An empty goal list is a solution. Timeout, type and depth errors
    /// abort the whole enumeration.
    pub fn solve(
        &mut self,
        goals: &[Term],
        env: &mut Bindings,
        depth: usize,
        out: OnSolution,
    ) -> Res<Flow> {
        self.deadline.check()?;
        if depth > self.max_depth {
            bail!(Error::Depth {
                limit: self.max_depth
            });
        }

        let (goal, rest) = match goals.split_first() {
            None => return Ok(out(env)),
            Some(pair) => pair,
        };
        let goal = env.walk(goal);

        let (name, arity) = match goal.functor() {
            Some(pair) => pair,
            None => bail!("cannot call `{}` as a goal", goal),
        };
        let args: &[Term] = match &goal {
            Term::App { args, .. } => args,
            _ => &[],
        };

        match (name, arity) {
            ("true", 0) => self.solve(rest, env, depth, out),
            ("fail", 0) | ("false", 0) => Ok(Flow::Continue),

            (",", 2) => {
                let mut next = Vec::with_capacity(rest.len() + 2);
                next.push(args[0].clone());
                next.push(args[1].clone());
                next.extend_from_slice(rest);
                self.solve(&next, env, depth + 1, out)
            }

            (";", 2) => {
                let mark = env.mark();
                let flow = self.solve(&prepend(&args[0], rest), env, depth + 1, out)?;
                env.undo_to(mark);
                if flow == Flow::Stop {
                    return Ok(Flow::Stop);
                }
                let flow = self.solve(&prepend(&args[1], rest), env, depth + 1, out)?;
                env.undo_to(mark);
                Ok(flow)
            }

            ("\\+", 1) => {
                let mark = env.mark();
                let mut found = false;
                self.solve(
                    std::slice::from_ref(&args[0]),
                    env,
                    depth + 1,
                    &mut |_| {
                        found = true;
                        Flow::Stop
                    },
                )?;
                env.undo_to(mark);
                if found {
                    Ok(Flow::Continue)
                } else {
                    self.solve(rest, env, depth, out)
                }
            }

            ("=", 2) => {
                let mark = env.mark();
                let flow = if env.unify(&args[0], &args[1]) {
                    self.solve(rest, env, depth, out)?
                } else {
                    Flow::Continue
                };
                env.undo_to(mark);
                Ok(flow)
            }

            ("\\=", 2) => {
                let mark = env.mark();
                let unifiable = env.unify(&args[0], &args[1]);
                env.undo_to(mark);
                if unifiable {
                    Ok(Flow::Continue)
                } else {
                    self.solve(rest, env, depth, out)
                }
            }

            ("call", 1) => self.solve(&prepend(&args[0], rest), env, depth + 1, out),

            ("findall", 3) => {
                let mark = env.mark();
                let mut collected = vec![];
                let template = args[0].clone();
                self.solve(
                    std::slice::from_ref(&args[1]),
                    env,
                    depth + 1,
                    &mut |env| {
                        collected.push(env.resolve(&template));
                        Flow::Continue
                    },
                )?;
                env.undo_to(mark);

                let list = Term::list(collected);
                let mark = env.mark();
                let flow = if env.unify(&args[2], &list) {
                    self.solve(rest, env, depth, out)?
                } else {
                    Flow::Continue
                };
                env.undo_to(mark);
                Ok(flow)
            }

            ("assertz", 1) => {
                let clause = clause_of_term(env.resolve(&args[0]))?;
                self.db.assertz(clause.clone())?;
                if let Some(shared) = &self.shared {
                    write_lock(shared).assertz(clause)?;
                }
                self.solve(rest, env, depth, out)
            }

            ("retractall", 1) => {
                let pattern = env.resolve(&args[0]);
                self.db.retract_all(&pattern)?;
                if let Some(shared) = &self.shared {
                    write_lock(shared).retract_all(&pattern)?;
                }
                self.solve(rest, env, depth, out)
            }

            ("is", 2) => {
                let value = eval(&args[1], env)?.into_term();
                let mark = env.mark();
                let flow = if env.unify(&args[0], &value) {
                    self.solve(rest, env, depth, out)?
                } else {
                    Flow::Continue
                };
                env.undo_to(mark);
                Ok(flow)
            }

            ("=:=", 2) | ("=\\=", 2) | ("<", 2) | (">", 2) | ("=<", 2) | (">=", 2) => {
                let lhs = eval(&args[0], env)?;
                let rhs = eval(&args[1], env)?;
                if compare(name, &lhs, &rhs) {
                    self.solve(rest, env, depth, out)
                } else {
                    Ok(Flow::Continue)
                }
            }

            _ => self.solve_user(&goal, rest, env, depth, out),
        }
    }

    /// Clause resolution for a user (or library) predicate.
    ///
    /// Unknown predicates yield no solutions, closed-world style.
    fn solve_user(
        &mut self,
        goal: &Term,
        rest: &[Term],
        env: &mut Bindings,
        depth: usize,
        out: OnSolution,
    ) -> Res<Flow> {
        let key = Indicator::of(goal).expect("checked callable by caller");
        let clauses = match self.db.clauses_for(&key) {
            Some(clauses) => clauses,
            None => return Ok(Flow::Continue),
        };
        for clause in clauses.iter() {
            self.deadline.check()?;
            let renamed = clause.rename(&mut self.gensym);
            let mark = env.mark();
            if env.unify(goal, renamed.head()) {
                let mut next = renamed.body().to_vec();
                next.extend_from_slice(rest);
                let flow = self.solve(&next, env, depth + 1, out)?;
                if flow == Flow::Stop {
                    env.undo_to(mark);
                    return Ok(Flow::Stop);
                }
            }
            env.undo_to(mark);
        }
        Ok(Flow::Continue)
    }
}

fn prepend(goal: &Term, rest: &[Term]) -> Vec<Term> {
    let mut next = Vec::with_capacity(rest.len() + 1);
    next.push(goal.clone());
    next.extend_from_slice(rest);
    next
}

/// Turns a resolved term into a clause for `assertz`.
fn clause_of_term(term: Term) -> Res<Clause> {
    let (head, body) = match term {
        Term::App { functor, mut args } if functor == ":-" && args.len() == 2 => {
            let body = args.pop().expect("arity checked");
            let head = args.pop().expect("arity checked");
            (head, Some(body))
        }
        term => (term, None),
    };
    if head.functor().is_none() {
        bail!("cannot assert `{}`: head is not callable", head);
    }
    Ok(Clause::new(head, body))
}

/// A ground numeric value.
enum Num {
    /// Arbitrary-precision integer.
    I(Int),
    /// Double.
    F(f64),
}
impl Num {
    fn into_term(self) -> Term {
        match self {
            Self::I(i) => Term::Int(i),
            Self::F(f) => Term::Float(f),
        }
    }
    fn as_f64(&self) -> f64 {
        match self {
            Self::I(i) => num::ToPrimitive::to_f64(i).unwrap_or(f64::NAN),
            Self::F(f) => *f,
        }
    }
}

/// Arithmetic evaluation: numbers, `+`, binary and unary `-`, `*`, `/`.
///
/// Integer/integer stays exact (division truncates); anything mixed or
/// float-y goes through doubles. Non-ground or non-numeric operands are a
/// type error.
fn eval(term: &Term, env: &Bindings) -> Res<Num> {
    let term = env.walk(term);
    match &term {
        Term::Int(i) => Ok(Num::I(i.clone())),
        Term::Float(f) => Ok(Num::F(*f)),
        Term::Var(_) => bail!(Error::typ(format!(
            "arithmetic on unbound variable `{}`",
            term
        ))),
        Term::App { functor, args } if args.len() == 1 && functor == "-" => {
            match eval(&args[0], env)? {
                Num::I(i) => Ok(Num::I(-i)),
                Num::F(f) => Ok(Num::F(-f)),
            }
        }
        Term::App { functor, args }
            if args.len() == 2 && matches!(functor.as_str(), "+" | "-" | "*" | "/") =>
        {
            let lhs = eval(&args[0], env)?;
            let rhs = eval(&args[1], env)?;
            match (functor.as_str(), lhs, rhs) {
                ("+", Num::I(lhs), Num::I(rhs)) => Ok(Num::I(lhs + rhs)),
                ("-", Num::I(lhs), Num::I(rhs)) => Ok(Num::I(lhs - rhs)),
                ("*", Num::I(lhs), Num::I(rhs)) => Ok(Num::I(lhs * rhs)),
                ("/", Num::I(lhs), Num::I(rhs)) => {
                    if num::Zero::is_zero(&rhs) {
                        bail!(Error::typ("division by zero"));
                    }
                    Ok(Num::I(lhs / rhs))
                }
                ("+", lhs, rhs) => Ok(Num::F(lhs.as_f64() + rhs.as_f64())),
                ("-", lhs, rhs) => Ok(Num::F(lhs.as_f64() - rhs.as_f64())),
                ("*", lhs, rhs) => Ok(Num::F(lhs.as_f64() * rhs.as_f64())),
                (_, lhs, rhs) => Ok(Num::F(lhs.as_f64() / rhs.as_f64())),
            }
        }
        _ => bail!(Error::typ(format!(
            "cannot evaluate `{}` arithmetically",
            term
        ))),
    }
}

/// Numeric comparison; integer pairs compare exactly, everything else as
/// doubles. Incomparable values (NaN) fail the goal.
fn compare(op: &str, lhs: &Num, rhs: &Num) -> bool {
    use std::cmp::Ordering::*;
    let ord = match (lhs, rhs) {
        (Num::I(lhs), Num::I(rhs)) => Some(lhs.cmp(rhs)),
        (lhs, rhs) => lhs.as_f64().partial_cmp(&rhs.as_f64()),
    };
    let ord = match ord {
        Some(ord) => ord,
        None => return false,
    };
    match op {
        "=:=" => ord == Equal,
        "=\\=" => ord != Equal,
        "<" => ord == Less,
        ">" => ord == Greater,
        "=<" => ord != Greater,
        ">=" => ord != Less,
        _ => unreachable!("comparison dispatch is exhaustive"),
    }
}
