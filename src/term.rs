//! Defines the term structure used to represent clauses and goals.

prelude!();

#[cfg(test)]
mod test;

pub use crate::build_term as build;

/// A variable.
///
/// A variable is a name plus a *generation stamp*. Variables written in
/// source text carry stamp `0`; every clause activation renames its
/// variables with fresh stamps so that recursive use of the same clause
/// cannot cross-contaminate. Anonymous `_` occurrences are stamped apart
/// at parse time, one stamp per occurrence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var {
    /// Variable identifier.
    name: String,
    /// Generation stamp.
    stamp: u64,
}
impl Var {
    /// Constructor, stamp `0`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use arbor::term::Var;
    /// let var = Var::new("State");
    /// assert_eq!(var.name(), "State");
    /// assert_eq!(var.stamp(), 0);
    /// ```
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self::with_stamp(name, 0)
    }
    /// Constructor with an explicit stamp.
    pub fn with_stamp<S: Into<String>>(name: S, stamp: u64) -> Self {
        Self {
            name: name.into(),
            stamp,
        }
    }

    /// Name accessor.
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Stamp accessor.
    pub fn stamp(&self) -> u64 {
        self.stamp
    }
    /// True if the variable was written `_` in source text.
    pub fn is_anonymous(&self) -> bool {
        self.name == "_"
    }
}

/// A term.
///
/// Terms are immutable once constructed. Lists are `'.'/2` chains ending in
/// the atom `[]`; double-quoted strings parse to lists of character codes.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// A symbolic constant.
    Atom(String),
    /// An arbitrary-precision integer.
    Int(Int),
    /// An IEEE-754 double.
    Float(f64),
    /// A variable.
    Var(Var),
    /// A compound: functor plus ordered arguments.
    App {
        /// The functor.
        functor: String,
        /// The arguments, never empty.
        args: Vec<Term>,
    },
}

/// Functor of the list constructor, `'.'/2`.
pub const CONS: &str = ".";
/// The empty-list atom.
pub const NIL: &str = "[]";

impl Term {
    /// Atom constructor.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use arbor::term::Term;
    /// let t = Term::atom("s0");
    /// assert_eq!(t.to_string(), "s0");
    /// ```
    pub fn atom<S: Into<String>>(name: S) -> Self {
        Self::Atom(name.into())
    }
    /// Integer constructor.
    pub fn int<I: Into<Int>>(i: I) -> Self {
        Self::Int(i.into())
    }
    /// Float constructor.
    pub fn float(f: f64) -> Self {
        Self::Float(f)
    }
    /// Variable constructor.
    pub fn var(var: Var) -> Self {
        Self::Var(var)
    }
    /// Compound constructor.
    ///
    /// A compound with no arguments is the corresponding atom.
    pub fn app<S: Into<String>>(functor: S, args: Vec<Term>) -> Self {
        if args.is_empty() {
            Self::Atom(functor.into())
        } else {
            Self::App {
                functor: functor.into(),
                args,
            }
        }
    }

    /// The empty list.
    pub fn nil() -> Self {
        Self::Atom(NIL.into())
    }
    /// List cell constructor.
    pub fn cons(head: Term, tail: Term) -> Self {
        Self::app(CONS, vec![head, tail])
    }
    /// Proper-list constructor.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use arbor::term::Term;
    /// let t = Term::list(vec![Term::atom("a"), Term::int(7)]);
    /// assert_eq!(t.to_string(), "[a, 7]");
    /// assert_eq!(Term::list(vec![]), Term::nil());
    /// ```
    pub fn list(elems: Vec<Term>) -> Self {
        elems
            .into_iter()
            .rev()
            .fold(Self::nil(), |tail, head| Self::cons(head, tail))
    }
    /// Character-code list for a string, the classical representation of
    /// double-quoted text.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use arbor::term::Term;
    /// let t = Term::char_list("hi");
    /// assert_eq!(t, Term::list(vec![Term::int(104), Term::int(105)]));
    /// assert_eq!(t.text(), "hi");
    /// ```
    pub fn char_list(s: &str) -> Self {
        Self::list(s.bytes().map(|b| Self::int(b as i64)).collect())
    }

    /// True if `self` is the empty-list atom.
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Atom(a) if a == NIL)
    }
    /// Head and tail of a list cell.
    pub fn uncons(&self) -> Option<(&Term, &Term)> {
        match self {
            Self::App { functor, args } if functor == CONS && args.len() == 2 => {
                Some((&args[0], &args[1]))
            }
            _ => None,
        }
    }
    /// Elements of a proper list, `None` for anything else.
    pub fn as_list(&self) -> Option<Vec<&Term>> {
        let mut elems = vec![];
        let mut curr = self;
        loop {
            if curr.is_nil() {
                return Some(elems);
            }
            let (head, tail) = curr.uncons()?;
            elems.push(head);
            curr = tail;
        }
    }

    /// Atom name, if `self` is an atom.
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Self::Atom(a) => Some(a),
            _ => None,
        }
    }
    /// Functor and arity of a callable term: `(name, 0)` for an atom,
    /// `(functor, arity)` for a compound, `None` otherwise.
    pub fn functor(&self) -> Option<(&str, usize)> {
        match self {
            Self::Atom(a) => Some((a, 0)),
            Self::App { functor, args } => Some((functor, args.len())),
            _ => None,
        }
    }

    /// Decodes `self` as a character-code list, if it is one.
    ///
    /// This is the detection half of the string-as-character-list artifact:
    /// a non-empty proper list whose elements are all integers in `0..=255`.
    pub fn char_codes(&self) -> Option<Vec<u8>> {
        let elems = self.as_list()?;
        if elems.is_empty() {
            return None;
        }
        let mut bytes = Vec::with_capacity(elems.len());
        for elem in elems {
            match elem {
                Self::Int(i) => {
                    let code = u8::try_from(i).ok()?;
                    bytes.push(code);
                }
                _ => return None,
            }
        }
        Some(bytes)
    }

    /// Plain-text rendering for surfacing values to callers.
    ///
    /// Atoms render unquoted, numbers as themselves, character-code lists
    /// decode to the string they spell; everything else falls back to
    /// source syntax.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use arbor::term::Term;
    /// assert_eq!(Term::atom("send_prompt").text(), "send_prompt");
    /// assert_eq!(Term::int(42).text(), "42");
    /// assert_eq!(Term::char_list("ready").text(), "ready");
    /// ```
    pub fn text(&self) -> String {
        match self {
            Self::Atom(a) => a.clone(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => format!("{:?}", f),
            _ => {
                if let Some(bytes) = self.char_codes() {
                    String::from_utf8_lossy(&bytes).into_owned()
                } else {
                    self.to_string()
                }
            }
        }
    }

    /// Named (non-anonymous) variables in appearance order, de-duplicated.
    pub fn named_vars(&self, out: &mut Vec<Var>) {
        match self {
            Self::Var(var) => {
                if !var.is_anonymous() && !out.contains(var) {
                    out.push(var.clone());
                }
            }
            Self::App { args, .. } => {
                for arg in args {
                    arg.named_vars(out);
                }
            }
            _ => {}
        }
    }

    /// Largest variable stamp occurring in `self`, `0` if none.
    pub fn max_stamp(&self) -> u64 {
        match self {
            Self::Var(var) => var.stamp(),
            Self::App { args, .. } => args.iter().map(Self::max_stamp).max().unwrap_or(0),
            _ => 0,
        }
    }

    /// Numeric value as a double, if `self` is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => num::ToPrimitive::to_f64(i),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// A high-water mark in a [`Bindings`] trail.
///
/// Bindings recorded after the mark are undone by [`Bindings::undo_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

/// A binding environment.
///
/// Maps variables to terms, extended monotonically during a unification
/// attempt; a trail records binding order so the resolver can undo to a
/// [`Mark`] when backtracking.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    /// Current bindings.
    map: Map<Var, Term>,
    /// Bind order, for undoing.
    trail: Vec<Var>,
}
impl Bindings {
    /// Constructor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current high-water mark.
    pub fn mark(&self) -> Mark {
        Mark(self.trail.len())
    }
    /// Undoes every binding recorded after `mark`.
    pub fn undo_to(&mut self, mark: Mark) {
        while self.trail.len() > mark.0 {
            let var = self.trail.pop().expect("trail length checked above");
            self.map.remove(&var);
        }
    }

    /// Binds a variable, recording it on the trail.
    ///
    /// The variable must be free; binding a bound variable is a programming
    /// error upstream.
    fn bind(&mut self, var: Var, term: Term) {
        let prev = self.map.insert(var.clone(), term);
        debug_assert!(prev.is_none(), "rebinding `{}`", Term::var(var.clone()));
        self.trail.push(var);
    }

    /// Binding of a variable, if any.
    pub fn lookup(&self, var: &Var) -> Option<&Term> {
        self.map.get(var)
    }

    /// Shallow dereference: follows the binding chain of a variable to its
    /// current value, or to itself if free. Non-variables are returned
    /// unchanged; arguments are *not* rewritten.
    pub fn walk(&self, term: &Term) -> Term {
        let mut curr = term;
        while let Term::Var(var) = curr {
            match self.map.get(var) {
                Some(bound) => curr = bound,
                None => break,
            }
        }
        curr.clone()
    }

    /// Deep dereference: substitutes every bound variable in `term`.
    /// Free variables are left in place.
    pub fn resolve(&self, term: &Term) -> Term {
        let walked = self.walk(term);
        match walked {
            Term::App { functor, args } => Term::App {
                functor,
                args: args.iter().map(|arg| self.resolve(arg)).collect(),
            },
            other => other,
        }
    }

    /// Unification.
    ///
    /// Dereferences both sides; binds a free variable to the other side;
    /// matching atoms and identical numbers succeed without extension;
    /// compounds with matching functor and arity unify argument-wise,
    /// left to right. Everything else fails.
    ///
    /// Bindings made by a failed attempt are *not* removed here; callers
    /// take a [`Mark`] first and undo on failure. No occurs-check.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use arbor::{build_term, term::Bindings};
    /// let mut env = Bindings::new();
    /// let lhs = build_term!((transition s0 (var L) (var To)));
    /// let rhs = build_term!((transition (var F) a s1));
    /// assert!(env.unify(&lhs, &rhs));
    /// assert_eq!(env.resolve(&lhs).to_string(), "transition(s0, a, s1)");
    /// ```
    pub fn unify(&mut self, lhs: &Term, rhs: &Term) -> bool {
        let lhs = self.walk(lhs);
        let rhs = self.walk(rhs);
        match (&lhs, &rhs) {
            (Term::Var(lvar), Term::Var(rvar)) if lvar == rvar => true,
            (Term::Var(lvar), _) => {
                self.bind(lvar.clone(), rhs);
                true
            }
            (_, Term::Var(rvar)) => {
                self.bind(rvar.clone(), lhs);
                true
            }
            (Term::Atom(lhs), Term::Atom(rhs)) => lhs == rhs,
            (Term::Int(lhs), Term::Int(rhs)) => lhs == rhs,
            (Term::Float(lhs), Term::Float(rhs)) => lhs == rhs,
            (
                Term::App {
                    functor: lf,
                    args: largs,
                },
                Term::App {
                    functor: rf,
                    args: rargs,
                },
            ) => {
                if lf != rf || largs.len() != rargs.len() {
                    return false;
                }
                for (larg, rarg) in largs.iter().zip(rargs.iter()) {
                    if !self.unify(larg, rarg) {
                        return false;
                    }
                }
                true
            }
            _ => false,
        }
    }
}

/// True if an atom needs single quotes to re-parse as itself.
pub fn atom_needs_quotes(name: &str) -> bool {
    const BARE: [&str; 17] = [
        NIL, CONS, ",", ";", ":-", "=", "\\=", "\\+", "is", "<", ">", "=<", ">=", "=:=", "=\\=",
        "+", "-",
    ];
    if BARE.contains(&name) {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return true,
    }
    !chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Packs basic trait implementations.
mod trait_impls {
    use super::*;
    use std::fmt::Display;

    /// Infix binary operators, printed `lhs op rhs`.
    const INFIX: [&str; 16] = [
        ",", ";", ":-", "=", "\\=", "is", "<", ">", "=<", ">=", "=:=", "=\\=", "+", "-", "*", "/",
    ];

    fn fmt_infix_arg(arg: &Term, fmt: &mut fmt::Formatter) -> fmt::Result {
        let parens = matches!(
            arg,
            Term::App { functor, args }
                if args.len() == 2 && INFIX.contains(&functor.as_str()) && arg.uncons().is_none()
        );
        if parens {
            write!(fmt, "(")?;
            arg.fmt(fmt)?;
            write!(fmt, ")")
        } else {
            arg.fmt(fmt)
        }
    }

    impl fmt::Display for Var {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            if self.stamp == 0 {
                write!(fmt, "{}", self.name)
            } else {
                write!(fmt, "{}#{}", self.name, self.stamp)
            }
        }
    }

    impl fmt::Display for Term {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            match self {
                Self::Atom(name) => {
                    if atom_needs_quotes(name) {
                        write!(fmt, "'{}'", name.replace('\'', "''"))
                    } else {
                        name.fmt(fmt)
                    }
                }
                Self::Int(i) => i.fmt(fmt),
                Self::Float(f) => write!(fmt, "{:?}", f),
                Self::Var(var) => var.fmt(fmt),
                Self::App { functor, args } => {
                    if self.uncons().is_some() {
                        return fmt_list(self, fmt);
                    }
                    if args.len() == 2 && INFIX.contains(&functor.as_str()) {
                        fmt_infix_arg(&args[0], fmt)?;
                        if functor == "," {
                            write!(fmt, ", ")?;
                        } else {
                            write!(fmt, " {} ", functor)?;
                        }
                        return fmt_infix_arg(&args[1], fmt);
                    }
                    if args.len() == 1 && functor == "\\+" {
                        write!(fmt, "\\+ ")?;
                        return fmt_infix_arg(&args[0], fmt);
                    }
                    if atom_needs_quotes(functor) {
                        write!(fmt, "'{}'(", functor.replace('\'', "''"))?;
                    } else {
                        write!(fmt, "{}(", functor)?;
                    }
                    for (idx, arg) in args.iter().enumerate() {
                        if idx > 0 {
                            write!(fmt, ", ")?;
                        }
                        arg.fmt(fmt)?;
                    }
                    write!(fmt, ")")
                }
            }
        }
    }

    fn fmt_list(list: &Term, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "[")?;
        let mut curr = list;
        let mut first = true;
        loop {
            match curr.uncons() {
                Some((head, tail)) => {
                    if !first {
                        write!(fmt, ", ")?;
                    }
                    first = false;
                    head.fmt(fmt)?;
                    curr = tail;
                }
                None => {
                    if !curr.is_nil() {
                        write!(fmt, " | ")?;
                        curr.fmt(fmt)?;
                    }
                    return write!(fmt, "]");
                }
            }
        }
    }

    impl From<i32> for Term {
        fn from(i: i32) -> Self {
            Self::Int(i.into())
        }
    }
    impl From<i64> for Term {
        fn from(i: i64) -> Self {
            Self::Int(i.into())
        }
    }
    impl From<Int> for Term {
        fn from(i: Int) -> Self {
            Self::Int(i)
        }
    }
    impl From<f64> for Term {
        fn from(f: f64) -> Self {
            Self::Float(f)
        }
    }
    impl From<Var> for Term {
        fn from(var: Var) -> Self {
            Self::Var(var)
        }
    }
}
