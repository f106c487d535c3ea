//! Parsers for specification sources, goals and CTL formulas.
//!
//! The surface syntax is the classical one: `%` comments to end of line,
//! unquoted atoms starting lowercase, single-quoted atoms, variables
//! starting uppercase or `_`, signed integers and floats, `[H|T]` and
//! `[a, b, c]` lists, double-quoted strings as character-code lists, and
//! clauses terminated by `.`. There are no operator-definition directives;
//! the operator table is fixed (see [`rules::goal`]).
//!
//! CTL formulas use prefix constructors mirroring [`ctl::Formula`], for
//! instance `ag(ef(atom(ready)))`.

prelude!();

use crate::ctl::Formula;
use crate::db::Clause;
use crate::term::{Term, Var};


/// A span in the input text.
#[readonly::make]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Span's start (inclusive).
    pub start: usize,
    /// Span's end (exclusive).
    pub end: usize,
}
impl Span {
    /// Constructor.
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Span { start, end }
    }

    /// Extracts the relevant line of the input, and the previous/next line if any.
    ///
    /// Returns `(prev, row, col, line, next)`; `row` and `col` start at zero.
    pub fn pretty_of(self, text: &str) -> (Option<String>, usize, usize, String, Option<String>) {
        if text.is_empty() {
            return (None, 0, 0, "<EOI>".into(), None);
        }
        let mut lines = text.lines().enumerate();

        let mut count = self.start;
        let mut prev_line = None;

        while let Some((row, line)) = lines.next() {
            if line.len() >= count {
                let (line, next) = {
                    match lines.next().map(|(_, s)| s.to_string()) {
                        Some(next) if next.is_empty() => (line.into(), None),
                        Some(next) => (line.into(), Some(next)),
                        None if text.ends_with('\n') => (line.into(), None),
                        None => (format!("{}<EOI>", line), None),
                    }
                };
                return (prev_line.map(String::from), row, count, line, next);
            }

            count -= line.len() + 1;
            prev_line = Some(line);
        }

        let last_row = text.lines().count().saturating_sub(1);
        let last_line = text.lines().last().unwrap_or("<EOI>").to_string();
        (None, last_row, last_line.len(), last_line, None)
    }

    /// Positioned parse error at this span.
    pub fn error_at(self, text: &str, msg: impl Into<String>) -> Error {
        let (prev, row, col, line, next) = self.pretty_of(text);
        Error::parse(msg, row, col, line, prev, next)
    }
}
impl From<(usize, usize)> for Span {
    fn from((start, end): (usize, usize)) -> Self {
        Self::new(start, end)
    }
}

/// Wraps something with a span.
#[derive(Debug, Clone)]
pub struct Spn<T> {
    /// Value wrapped.
    pub inner: T,
    /// Span.
    pub span: Span,
}
impl<T: PartialEq> PartialEq for Spn<T> {
    fn eq(&self, that: &Self) -> bool {
        self.inner == that.inner
    }
}
impl<T> Spn<T> {
    /// Constructor.
    pub fn new(inner: T, span: impl Into<Span>) -> Self {
        let span = span.into();
        Self { inner, span }
    }

    /// Applies an operation to the inner value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spn<U> {
        Spn {
            inner: f(self.inner),
            span: self.span,
        }
    }
}
impl<T> Deref for Spn<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.inner
    }
}

fn app2(functor: &str, lhs: Term, rhs: Term) -> Term {
    Term::app(functor, vec![lhs, rhs])
}

/// Folds a unary minus over numeric literals, keeps an application otherwise.
fn negate(arg: Term) -> Term {
    match arg {
        Term::Int(i) => Term::Int(-i),
        Term::Float(f) => Term::Float(-f),
        arg => Term::app("-", vec![arg]),
    }
}

peg::parser! {
    /// PEG parsing rules.
    pub grammar rules() for str {
        /// Whitespace.
        rule whitespace() = quiet! {
            [ ' ' | '\n' | '\t' | '\r' ]
        }

        /// Comment, `%` to end of line.
        pub rule comment() = quiet! {
            "%" [^ '\n' ]* ("\n" / ![_])
        }
        / expected!("comment")

        /// Whitespace or comment.
        rule _() = quiet! { ( whitespace() / comment() )* }

        /// Unquoted atom name: lowercase-initial identifier.
        ///
        /// # Examples
        ///
        /// ```rust
        /// # use arbor::parse::rules::ident;
        /// assert_eq!(ident("s0_idle").unwrap(), "s0_idle");
        /// assert!(ident("Upper").is_err());
        /// assert!(ident("0digit").is_err());
        /// ```
        pub rule ident() -> &'input str
        = quiet! {
            $( ['a'..='z'] ['a'..='z' | 'A'..='Z' | '0'..='9' | '_']* )
        }
        / expected!("identifier")

        /// Variable name: uppercase- or underscore-initial.
        rule var_name() -> &'input str
        = $( ['A'..='Z' | '_'] ['a'..='z' | 'A'..='Z' | '0'..='9' | '_']* )

        /// Single-quoted atom; `''` is an escaped quote.
        ///
        /// # Examples
        ///
        /// ```rust
        /// # use arbor::parse::rules::quoted;
        /// assert_eq!(quoted("'two words'").unwrap(), "two words");
        /// assert_eq!(quoted("'don''t'").unwrap(), "don't");
        /// ```
        pub rule quoted() -> String
        = quiet! {
            "'" s:$( ( "''" / [^ '\''] )* ) "'" { s.replace("''", "'") }
        }
        / expected!("quoted atom")

        /// Atom name, quoted or not.
        rule atom_name() -> String
        = name:ident() { name.into() }
        / quoted()

        /// Signed integer literal, not followed by a fractional part.
        pub rule integer() -> Int
        = quiet! {
            n:$( "-"? ['0'..='9']+ ) !("." ['0'..='9']) {?
                Int::parse_bytes(n.as_bytes(), 10).ok_or("illegal integer")
            }
        }
        / expected!("integer")

        /// Signed float literal.
        pub rule float() -> f64
        = quiet! {
            n:$( "-"? ['0'..='9']+ "." ['0'..='9']+ ) {?
                n.parse().map_err(|_| "illegal float")
            }
        }
        / expected!("float")

        /// Double-quoted string, parsed as a character-code list.
        rule dq_string() -> Term
        = "\"" s:$( [^ '"']* ) "\"" { Term::char_list(s) }

        /// List: `[]`, `[a, b, c]` or `[H|T]`.
        rule list() -> Term
        = "[" _ "]" { Term::nil() }
        / "[" _ elems:( arg() ++ (_ "," _) ) _ tail:( "|" _ t:arg() _ { t } )? "]" {
            elems.into_iter().rev().fold(
                tail.unwrap_or_else(Term::nil),
                |tail, head| Term::cons(head, tail),
            )
        }

        /// Atom or compound.
        rule atom_or_app() -> Term
        = name:atom_name() args:( "(" _ a:( arg() ++ (_ "," _) ) _ ")" { a } )? {
            match args {
                Some(args) => Term::app(name, args),
                None => Term::atom(name),
            }
        }

        /// The `is` keyword, with an identifier boundary.
        rule kw_is()
        = "is" !['a'..='z' | 'A'..='Z' | '0'..='9' | '_']

        /// Argument-position term: everything but bare `,` and `;`.
        ///
        /// Operator table, loosest first: `\+` (prefix), the relational
        /// operators (`=`, `\=`, `is`, `=:=`, `=\=`, `=<`, `<`, `>=`, `>`),
        /// binary `+`/`-`, then `*`/`/`, then unary `-`.
        pub rule arg() -> Term
        = precedence! {
            "\\+" _ arg:@ { Term::app("\\+", vec![arg]) }
            --
            lhs:(@) _ "=:=" _ rhs:@ { app2("=:=", lhs, rhs) }
            lhs:(@) _ "=\\=" _ rhs:@ { app2("=\\=", lhs, rhs) }
            lhs:(@) _ "=<" _ rhs:@ { app2("=<", lhs, rhs) }
            lhs:(@) _ ">=" _ rhs:@ { app2(">=", lhs, rhs) }
            lhs:(@) _ "\\=" _ rhs:@ { app2("\\=", lhs, rhs) }
            lhs:(@) _ "=" _ rhs:@ { app2("=", lhs, rhs) }
            lhs:(@) _ "<" _ rhs:@ { app2("<", lhs, rhs) }
            lhs:(@) _ ">" _ rhs:@ { app2(">", lhs, rhs) }
            lhs:(@) _ kw_is() _ rhs:@ { app2("is", lhs, rhs) }
            --
            lhs:(@) _ "+" _ rhs:@ { app2("+", lhs, rhs) }
            lhs:(@) _ "-" _ rhs:@ { app2("-", lhs, rhs) }
            --
            lhs:(@) _ "*" _ rhs:@ { app2("*", lhs, rhs) }
            lhs:(@) _ "/" _ rhs:@ { app2("/", lhs, rhs) }
            --
            "-" _ arg:@ { negate(arg) }
            --
            f:float() { Term::Float(f) }
            i:integer() { Term::Int(i) }
            v:var_name() { Term::var(Var::new(v)) }
            s:dq_string() { s }
            l:list() { l }
            t:atom_or_app() { t }
            "(" _ t:goal() _ ")" { t }
        }

        /// Conjunction, right-associative.
        rule conj() -> Term
        = lhs:arg() _ "," _ rhs:conj() { app2(",", lhs, rhs) }
        / arg()

        /// Goal-position term: disjunction over conjunction over [`arg`].
        ///
        /// # Examples
        ///
        /// ```rust
        /// # use arbor::parse::rules::goal;
        /// let t = goal("a ; b, c").unwrap();
        /// assert_eq!(t.to_string(), "a ; (b, c)");
        /// ```
        pub rule goal() -> Term
        = lhs:conj() _ ";" _ rhs:goal() { app2(";", lhs, rhs) }
        / conj()

        /// Clause head: an atom or compound.
        rule head() -> Term
        = atom_or_app()

        /// A single clause, fact or rule, terminated by `.`.
        pub rule clause() -> Spn<Clause>
        = s:position!() head:head() _ body:( ":-" _ b:goal() _ { b } )? "." e:position!() {
            Spn::new(Clause::new(head, body), (s, e))
        }

        /// A whole specification: a sequence of clauses.
        pub rule spec() -> Vec<Spn<Clause>>
        = _ clauses:( c:clause() _ { c } )* ![_] { clauses }

        /// A query: one goal with an optional terminating `.`.
        pub rule query() -> Term
        = _ goal:goal() _ "."? _ ![_] { goal }

        /// A proposition name inside `atom(..)`.
        rule prop_name() -> String
        = atom_name()

        /// A CTL formula in prefix-constructor syntax.
        ///
        /// # Examples
        ///
        /// ```rust
        /// # use arbor::parse::rules::formula;
        /// let f = formula("ag(ef(atom(ready)))").unwrap();
        /// assert_eq!(f.to_string(), "ag(ef(atom(ready)))");
        /// ```
        pub rule formula() -> Formula
        = "atom" _ "(" _ p:prop_name() _ ")" { Formula::Atom(p) }
        / "not" _ "(" _ f:formula() _ ")" { Formula::not(f) }
        / "and" _ "(" _ f:formula() _ "," _ g:formula() _ ")" { Formula::and(f, g) }
        / "or" _ "(" _ f:formula() _ "," _ g:formula() _ ")" { Formula::or(f, g) }
        / "ex" _ "(" _ f:formula() _ ")" { Formula::ex(f) }
        / "ax" _ "(" _ f:formula() _ ")" { Formula::ax(f) }
        / "ef" _ "(" _ f:formula() _ ")" { Formula::ef(f) }
        / "af" _ "(" _ f:formula() _ ")" { Formula::af(f) }
        / "eg" _ "(" _ f:formula() _ ")" { Formula::eg(f) }
        / "ag" _ "(" _ f:formula() _ ")" { Formula::ag(f) }
        / "eu" _ "(" _ f:formula() _ "," _ g:formula() _ ")" { Formula::eu(f, g) }
        / "au" _ "(" _ f:formula() _ "," _ g:formula() _ ")" { Formula::au(f, g) }

        /// A CTL formula with nothing after it.
        pub rule formula_only() -> Formula
        = _ f:formula() _ ![_] { f }
    }
}

/// Converts a peg error into a positioned parse error.
fn convert<T>(txt: &str, res: Result<T, peg::error::ParseError<peg::str::LineCol>>) -> Res<T> {
    match res {
        Ok(res) => Ok(res),
        Err(e) => {
            let span = Span::new(e.location.offset, e.location.offset);
            let (prev, row, col, line, next) = span.pretty_of(txt);
            let err = Error::parse("", row, col, line, prev, next);
            Err(err.chain_err(|| format!("expected {}", e.expected)))
        }
    }
}

/// Parses a full specification into its clauses.
///
/// # Examples
///
/// ```rust
/// # use arbor::parse;
/// let clauses = parse::spec(
///     "initial(s0).\n\
///      transition(s0, a, s1). % step\n\
///      prop(s1, done).\n"
/// ).unwrap();
/// assert_eq!(clauses.len(), 3);
/// assert_eq!(clauses[1].head().to_string(), "transition(s0, a, s1)");
/// ```
pub fn spec(txt: &str) -> Res<Vec<Spn<Clause>>> {
    convert(txt, rules::spec(txt))
}

/// Parses a single clause.
pub fn clause(txt: &str) -> Res<Clause> {
    let mut clauses =
        convert(txt, rules::spec(txt)).chain_err(|| "expected exactly one clause")?;
    match (clauses.pop(), clauses.len()) {
        (Some(clause), 0) => Ok(clause.inner),
        _ => bail!("expected exactly one clause"),
    }
}

/// Parses a query goal; the terminating `.` is optional.
pub fn goal(txt: &str) -> Res<Term> {
    convert(txt, rules::query(txt))
}

/// Parses a CTL formula.
///
/// # Examples
///
/// ```rust
/// # use arbor::parse;
/// assert!(parse::formula("ag(ef(atom(ready)))").is_ok());
/// assert!(parse::formula("ag(ef(atom(ready))").is_err());
/// ```
pub fn formula(txt: &str) -> Res<Formula> {
    convert(txt, rules::formula_only(txt))
}
