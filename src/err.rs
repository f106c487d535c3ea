//! Error-handling.

prelude!();

/// Plain errors.
#[derive(Debug)]
pub enum Error {
    /// Parse error.
    Parse {
        /// Message.
        msg: String,
        /// Row where the error occurred (starts at `0`).
        row: usize,
        /// Column where the error occured (starts at `0`).
        col: usize,
        /// Line of the error.
        line: String,
        /// Previous line.
        prev: Option<String>,
        /// Next line.
        next: Option<String>,
    },
    /// A predicate's clauses are interleaved with another's in a consulted
    /// source.
    Discontiguous {
        /// Predicate indicator, `functor/arity`.
        pred: String,
        /// Row of the offending clause (starts at `0`).
        row: usize,
        /// Column of the offending clause (starts at `0`).
        col: usize,
        /// Line of the offending clause.
        line: String,
    },
    /// Attempt to redefine a built-in or library predicate.
    Redefine {
        /// Predicate indicator, `functor/arity`.
        pred: String,
    },
    /// Arithmetic applied to a non-ground or non-numeric term.
    Type {
        /// Message, mentions the offending term.
        msg: String,
    },
    /// Deadline expired before the goal completed.
    Timeout,
    /// Resolution recursion exceeded the configured limit.
    Depth {
        /// The limit that was hit.
        limit: usize,
    },
    /// A simple message.
    Msg(String),
}
impl Error {
    /// Parse error constructor.
    pub fn parse(
        msg: impl Into<String>,
        row: usize,
        col: usize,
        line: impl Into<String>,
        prev: Option<String>,
        next: Option<String>,
    ) -> Self {
        Self::Parse {
            msg: msg.into(),
            row,
            col,
            line: line.into(),
            prev,
            next,
        }
    }

    /// Type error constructor.
    pub fn typ(msg: impl Into<String>) -> Self {
        Self::Type { msg: msg.into() }
    }

    /// True for [`Self::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
    /// True for [`Self::Parse`].
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Extends an error with a chain of errors.
    pub fn extend(self, errs: impl Iterator<Item = Error>) -> ErrorChain {
        ErrorChain::from(self).extend(errs)
    }
}
impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse {
                msg,
                row,
                col,
                line,
                ..
            } => {
                write!(
                    fmt,
                    "parse error at {}:{}: {} | {}",
                    row + 1,
                    col + 1,
                    msg,
                    line
                )
            }
            Self::Discontiguous {
                pred,
                row,
                col,
                line,
            } => write!(
                fmt,
                "clauses for `{}` are not contiguous, at {}:{} | {}",
                pred,
                row + 1,
                col + 1,
                line
            ),
            Self::Redefine { pred } => {
                write!(fmt, "cannot redefine built-in predicate `{}`", pred)
            }
            Self::Type { msg } => write!(fmt, "type error: {}", msg),
            Self::Timeout => write!(fmt, "timeout"),
            Self::Depth { limit } => {
                write!(fmt, "recursion limit ({}) exceeded", limit)
            }
            Self::Msg(msg) => msg.fmt(fmt),
        }
    }
}
impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::Msg(s)
    }
}
impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::Msg(s.into())
    }
}

/// A source error and a chain of errors.
#[derive(Debug)]
pub struct ErrorChain {
    /// Source error.
    pub source: Error,
    /// Chain of errors on top.
    pub chain: Vec<Error>,
}
impl fmt::Display for ErrorChain {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.iter().enumerate() {
            if idx > 0 {
                write!(fmt, ", ")?;
            }
            err.fmt(fmt)?;
        }
        Ok(())
    }
}
impl ErrorChain {
    /// Constructor.
    pub fn new(source: impl Into<Error>) -> Self {
        Self {
            source: source.into(),
            chain: vec![],
        }
    }

    /// Forces a new source, moves the old source to the front of the chain.
    pub fn force_source(mut self, source: impl Into<Error>) -> Self {
        let mut source = source.into();
        std::mem::swap(&mut source, &mut self.source);
        self.chain.insert(0, source);
        self
    }

    /// Ref-iterator over all the errors in the chain.
    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        Some(&self.source).into_iter().chain(&self.chain)
    }
    /// Own-iterator over all the errors in the chain.
    pub fn into_iter(self) -> impl Iterator<Item = Error> {
        Some(self.source).into_iter().chain(self.chain)
    }

    /// Extends the chain.
    pub fn extend(mut self, errs: impl Iterator<Item = Error>) -> Self {
        self.chain.extend(errs);
        self
    }

    /// True if the source error is a timeout.
    pub fn is_timeout(&self) -> bool {
        self.source.is_timeout()
    }
    /// True if the source error is a parse error.
    pub fn is_parse(&self) -> bool {
        self.source.is_parse()
    }
}
impl From<Error> for ErrorChain {
    fn from(source: Error) -> Self {
        Self::new(source)
    }
}
impl From<String> for ErrorChain {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
impl From<&str> for ErrorChain {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Result type.
pub type Res<T> = Result<T, ErrorChain>;

/// Error-chaining extension trait.
pub trait ChainExt {
    /// Error-chaining result type.
    type Res;
    /// Chains an error.
    fn chain_err<E>(self, err: impl FnOnce() -> E) -> Self::Res
    where
        E: Into<Error>;
}

impl ChainExt for ErrorChain {
    type Res = ErrorChain;
    fn chain_err<E>(mut self, err: impl FnOnce() -> E) -> Self::Res
    where
        E: Into<Error>,
    {
        self.chain.push(err().into());
        self
    }
}
impl ChainExt for Error {
    type Res = ErrorChain;
    fn chain_err<E>(self, err: impl FnOnce() -> E) -> Self::Res
    where
        E: Into<Error>,
    {
        ErrorChain::from(self).chain_err(err)
    }
}
impl<T, Err> ChainExt for Result<T, Err>
where
    Err: Into<ErrorChain>,
{
    type Res = Res<T>;
    fn chain_err<E>(self, err: impl FnOnce() -> E) -> Self::Res
    where
        E: Into<Error>,
    {
        self.map_err(|e| e.into().chain_err(err))
    }
}
