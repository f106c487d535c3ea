//! Clause database: indexed storage, assert/retract, consult, reset.
//!
//! Clauses for one predicate live in an `Arc`'d sequence, so a reader's
//! snapshot of the database is a cheap map clone and writers replace
//! sequences copy-on-write. Concurrent readers observe either the pre-load
//! or the post-load database, never a torn state.

prelude!();

use crate::parse::Spn;
use crate::term::{Bindings, Term, Var};

#[cfg(test)]
mod test;

/// A predicate indicator, `functor/arity`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Indicator {
    /// Functor name.
    name: String,
    /// Number of arguments.
    arity: usize,
}
impl Indicator {
    /// Constructor.
    pub fn new<S: Into<String>>(name: S, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }
    /// Indicator of a callable term.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use arbor::{build_term, db::Indicator};
    /// let goal = build_term!((transition s0 (var L) (var To)));
    /// let key = Indicator::of(&goal).unwrap();
    /// assert_eq!(key.to_string(), "transition/3");
    /// ```
    pub fn of(term: &Term) -> Option<Self> {
        term.functor()
            .map(|(name, arity)| Self::new(name, arity))
    }

    /// Functor accessor.
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Arity accessor.
    pub fn arity(&self) -> usize {
        self.arity
    }
}
impl fmt::Display for Indicator {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}/{}", self.name, self.arity)
    }
}

/// A clause: a head plus a (possibly empty) ordered list of body goals.
///
/// Facts are clauses with an empty body.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// Head term, always callable.
    head: Term,
    /// Body goals, in evaluation order.
    body: Vec<Term>,
}
impl Clause {
    /// Constructor.
    ///
    /// Flattens the body's top-level conjunctions into the goal list and
    /// stamps anonymous `_` occurrences apart so `p(_, _)` does not
    /// constrain its arguments to be equal.
    pub fn new(head: Term, body: Option<Term>) -> Self {
        let mut goals = vec![];
        if let Some(body) = body {
            flatten_conj(body, &mut goals);
        }
        let mut clause = Self { head, body: goals };
        let mut stamp = 0;
        clause.head = stamp_anonymous(&clause.head, &mut stamp);
        clause.body = clause
            .body
            .iter()
            .map(|goal| stamp_anonymous(goal, &mut stamp))
            .collect();
        clause
    }

    /// Head accessor.
    pub fn head(&self) -> &Term {
        &self.head
    }
    /// Body accessor.
    pub fn body(&self) -> &[Term] {
        &self.body
    }
    /// True if the clause has no body.
    pub fn is_fact(&self) -> bool {
        self.body.is_empty()
    }
    /// Indicator of the clause's head.
    pub fn indicator(&self) -> Indicator {
        Indicator::of(&self.head).expect("clause heads are callable by construction")
    }

    /// Copy of the clause with every variable renamed to a fresh stamp.
    ///
    /// `gensym` is bumped once per distinct variable, so recursive use of
    /// the same clause cannot cross-contaminate.
    pub fn rename(&self, gensym: &mut u64) -> Self {
        let mut map = Map::new();
        let head = rename_term(&self.head, &mut map, gensym);
        let body = self
            .body
            .iter()
            .map(|goal| rename_term(goal, &mut map, gensym))
            .collect();
        Self { head, body }
    }
}
impl fmt::Display for Clause {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        self.head.fmt(fmt)?;
        for (idx, goal) in self.body.iter().enumerate() {
            if idx == 0 {
                write!(fmt, " :- ")?;
            } else {
                write!(fmt, ", ")?;
            }
            goal.fmt(fmt)?;
        }
        write!(fmt, ".")
    }
}

/// Splits a term on its top-level `,`-s, in order.
fn flatten_conj(term: Term, out: &mut Vec<Term>) {
    match term {
        Term::App { functor, mut args } if functor == "," && args.len() == 2 => {
            let rhs = args.pop().expect("arity checked");
            let lhs = args.pop().expect("arity checked");
            flatten_conj(lhs, out);
            flatten_conj(rhs, out);
        }
        term => out.push(term),
    }
}

/// Gives every `_` occurrence its own stamp.
fn stamp_anonymous(term: &Term, stamp: &mut u64) -> Term {
    match term {
        Term::Var(var) if var.is_anonymous() => {
            *stamp += 1;
            Term::var(Var::with_stamp("_", *stamp))
        }
        Term::App { functor, args } => Term::App {
            functor: functor.clone(),
            args: args.iter().map(|arg| stamp_anonymous(arg, stamp)).collect(),
        },
        term => term.clone(),
    }
}

/// Renames variables to fresh stamps, consistently within one clause.
fn rename_term(term: &Term, map: &mut Map<Var, Var>, gensym: &mut u64) -> Term {
    match term {
        Term::Var(var) => {
            let fresh = map.entry(var.clone()).or_insert_with(|| {
                *gensym += 1;
                Var::with_stamp(var.name(), *gensym)
            });
            Term::var(fresh.clone())
        }
        Term::App { functor, args } => Term::App {
            functor: functor.clone(),
            args: args
                .iter()
                .map(|arg| rename_term(arg, map, gensym))
                .collect(),
        },
        term => term.clone(),
    }
}

lazy_static::lazy_static! {
    /// Indicators of the native built-in predicates.
    ///
    /// These shadow user clauses and cannot be redefined.
    pub static ref BUILTINS: Set<Indicator> = {
        let mut set = Set::new();
        for (name, arity) in [
            ("true", 0),
            ("fail", 0),
            ("false", 0),
            (",", 2),
            (";", 2),
            ("\\+", 1),
            ("=", 2),
            ("\\=", 2),
            ("call", 1),
            ("findall", 3),
            ("assertz", 1),
            ("retractall", 1),
            ("is", 2),
            ("=:=", 2),
            ("=\\=", 2),
            ("<", 2),
            (">", 2),
            ("=<", 2),
            (">=", 2),
        ] {
            let is_new = set.insert(Indicator::new(name, arity));
            assert!(is_new, "built-in `{}/{}` is listed twice", name, arity);
        }
        set
    };
}

/// The helper library reinstalled by [`Db::library`].
///
/// Kept cut-free on purpose: the resolver does not implement cut, so
/// `dice0/2` is two clauses instead of an if-then-else.
pub const LIBRARY: &str = r#"% List membership.
member(X, [X|_]).
member(X, [_|T]) :- member(X, T).

% List concatenation.
append([], L, L).
append([H|T], L, [H|R]) :- append(T, L, R).

% List length.
length([], 0).
length([_|T], N) :- length(T, N1), N is N1 + 1.

% Action succeeds for every solution of Cond.
forall(Cond, Action) :- \+ (Cond, \+ Action).

% Probabilistic guard support. The simulator asserts dice0_value/1 with the
% step's sampled scalar; with no sample asserted the guard is vacuous.
dice0(_, _) :- \+ dice0_value(_).
dice0(Low, High) :- dice0_value(D), D >= Low, D < High.
"#;

/// The clause database.
///
/// Maps predicate indicators to insertion-ordered clause sequences. Cloning
/// is cheap (the sequences are shared); mutation goes through
/// [`Arc::make_mut`], so clones taken before a mutation are unaffected.
#[derive(Debug, Clone)]
pub struct Db {
    /// Clause sequences by indicator.
    preds: IndexMap<Indicator, Arc<Vec<Clause>>>,
    /// Indicators that may not be redefined: library predicates.
    protected: Set<Indicator>,
    /// Specification source, retained verbatim for round-trip retrieval.
    source: String,
}
impl Db {
    /// A database containing only the helper library.
    pub fn library() -> Self {
        let mut db = Self {
            preds: IndexMap::new(),
            protected: Set::new(),
            source: String::new(),
        };
        let clauses = parse::spec(LIBRARY).expect("the built-in library parses");
        for clause in clauses {
            db.append(clause.inner);
        }
        db.protected = db.preds.keys().cloned().collect();
        db
    }

    /// Parses `source` and builds a fresh database from it.
    ///
    /// The result is the helper library plus the source's clauses; on any
    /// parse, redefinition or discontiguity error the error is returned and
    /// no database is produced, so callers installing the result replace
    /// their previous database atomically or not at all.
    pub fn consult(source: &str) -> Res<Self> {
        let clauses = parse::spec(source)?;
        let mut db = Self::library();
        db.install(clauses, source)?;
        db.source = source.to_string();
        Ok(db)
    }

    /// Installs parsed clauses, checking for redefinitions and
    /// discontiguous predicates.
    fn install(&mut self, clauses: Vec<Spn<Clause>>, source: &str) -> Res<()> {
        let mut seen = Set::new();
        let mut last: Option<Indicator> = None;
        for spanned in clauses {
            let key = spanned.indicator();
            self.check_unprotected(&key)?;
            if last.as_ref() != Some(&key) {
                if seen.contains(&key) {
                    let (_, row, col, line, _) = spanned.span.pretty_of(source);
                    bail!(Error::Discontiguous {
                        pred: key.to_string(),
                        row,
                        col,
                        line,
                    });
                }
                seen.insert(key.clone());
                last = Some(key);
            }
            self.append(spanned.inner);
        }
        Ok(())
    }

    /// Fails on an attempt to touch a built-in or library predicate.
    fn check_unprotected(&self, key: &Indicator) -> Res<()> {
        if BUILTINS.contains(key) || self.protected.contains(key) {
            bail!(Error::Redefine {
                pred: key.to_string(),
            });
        }
        Ok(())
    }

    /// Appends a clause to its predicate's sequence, unchecked.
    fn append(&mut self, clause: Clause) {
        let key = clause.indicator();
        Arc::make_mut(self.preds.entry(key).or_default()).push(clause);
    }

    /// Appends a clause, rejecting protected predicates.
    pub fn assertz(&mut self, clause: Clause) -> Res<()> {
        self.check_unprotected(&clause.indicator())?;
        self.append(clause);
        Ok(())
    }

    /// Removes every clause whose head unifies with `pattern`.
    ///
    /// Unknown predicates are fine: there is nothing to remove.
    pub fn retract_all(&mut self, pattern: &Term) -> Res<()> {
        let key = match Indicator::of(pattern) {
            Some(key) => key,
            None => bail!("retractall needs a callable pattern, got `{}`", pattern),
        };
        self.check_unprotected(&key)?;

        let clauses = match self.preds.get_mut(&key) {
            Some(clauses) => clauses,
            None => return Ok(()),
        };
        let mut gensym = pattern.max_stamp();
        let kept: Vec<Clause> = clauses
            .iter()
            .filter(|clause| {
                let head = clause.rename(&mut gensym).head;
                let mut env = Bindings::new();
                !env.unify(pattern, &head)
            })
            .cloned()
            .collect();
        if kept.is_empty() {
            self.preds.shift_remove(&key);
        } else {
            *clauses = Arc::new(kept);
        }
        Ok(())
    }

    /// Snapshot of a predicate's clause sequence.
    ///
    /// Readers iterate the snapshot; writers install a replacement.
    pub fn clauses_for(&self, key: &Indicator) -> Option<Arc<Vec<Clause>>> {
        self.preds.get(key).cloned()
    }

    /// True if `key` names a native built-in or a library predicate.
    pub fn is_protected(&self, key: &Indicator) -> bool {
        BUILTINS.contains(key) || self.protected.contains(key)
    }

    /// The retained specification source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of predicates, library included.
    pub fn pred_count(&self) -> usize {
        self.preds.len()
    }
}
impl Default for Db {
    fn default() -> Self {
        Self::library()
    }
}
