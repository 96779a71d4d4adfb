use tracing::warn;

use crate::Error;

/// The outcome of a lookup that may match more than one on-chain record.
///
/// Ambiguity is not an error by default: callers that can live with it take the first match via
/// [`Lookup::into_first`], which logs it. Callers that cannot use [`Lookup::unique`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Unique(T),
    Ambiguous { first: T, count: usize },
}

impl<T> Lookup<T> {
    /// Classify the matches for `what`. No match at all is [`Error::NotFound`].
    pub fn from_matches(what: impl Into<String>, matches: Vec<T>) -> Result<Self, Error> {
        let what: String = what.into();
        let count = matches.len();
        let mut it = matches.into_iter();

        match (it.next(), count) {
            (None, _) => Err(Error::NotFound(what)),
            (Some(first), 1) => Ok(Lookup::Unique(first)),
            (Some(first), count) => {
                warn!(%what, count, "lookup matched more than one result, using the first");
                Ok(Lookup::Ambiguous { first, count })
            }
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Lookup::Ambiguous { .. })
    }

    pub fn first(&self) -> &T {
        match self {
            Lookup::Unique(v) | Lookup::Ambiguous { first: v, .. } => v,
        }
    }

    pub fn into_first(self) -> T {
        match self {
            Lookup::Unique(v) | Lookup::Ambiguous { first: v, .. } => v,
        }
    }

    pub fn unique(self, what: impl Into<String>) -> Result<T, Error> {
        match self {
            Lookup::Unique(v) => Ok(v),
            Lookup::Ambiguous { count, .. } => Err(Error::AmbiguousResult {
                what: what.into(),
                count,
            }),
        }
    }
}
