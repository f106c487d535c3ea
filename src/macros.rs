//! Arbor's macros.

/// Imports arbor's prelude.
#[macro_export]
macro_rules! prelude {
    {} => { use $crate::prelude::*; };
    { pub } => { pub use $crate::prelude::*; };
}

/// Convenience macro, provides a DSL for writing terms.
///
/// - compounds are written prefix: `(functor arg1 arg2 ...)`;
/// - variables are written `(var X)`;
/// - `{ expr }` splices in an existing [`Term`][crate::term::Term];
/// - bare identifiers are atoms, literals are numbers.
///
/// # Examples
///
/// ```rust
/// # use arbor::build_term;
/// let t = build_term!((transition s0 (var To) 7));
/// assert_eq!(t.to_string(), "transition(s0, To, 7)");
/// ```
#[macro_export]
macro_rules! build_term {
    ( (var $var:ident) ) => (
        $crate::term::Term::var($crate::term::Var::new(stringify!($var)))
    );

    ( { $tm:expr } ) => ( $tm );

    ( ($functor:tt $($args:tt)+) ) => (
        $crate::term::Term::app(
            $crate::build_term!(@name $functor),
            vec![ $($crate::build_term!($args)),+ ],
        )
    );

    ( [ $($elems:tt),* ] ) => (
        $crate::term::Term::list(vec![ $($crate::build_term!($elems)),* ])
    );

    ( $atom:ident ) => ( $crate::term::Term::atom(stringify!($atom)) );

    ( $cst:literal ) => ( $crate::term::Term::from($cst) );

    (@name $functor:ident) => ( stringify!($functor) );
    (@name $functor:literal) => ( $functor );
}
