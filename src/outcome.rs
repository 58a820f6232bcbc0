//! The success-or-failure result of a single task.

/// The settled result of one task: a value or an error.
///
/// Immutable once constructed. `any` emits these as data; the other
/// combinators project them into their own terminal signals.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome<V, E> {
    /// The task produced a value.
    Success(V),
    /// The task failed with an error.
    Failure(E),
}

impl<V, E> Outcome<V, E> {
    /// Returns `true` for [`Outcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns `true` for [`Outcome::Failure`].
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Extracts the value, if any.
    #[must_use]
    pub fn success(self) -> Option<V> {
        match self {
            Self::Success(v) => Some(v),
            Self::Failure(_) => None,
        }
    }

    /// Extracts the error, if any.
    #[must_use]
    pub fn failure(self) -> Option<E> {
        match self {
            Self::Success(_) => None,
            Self::Failure(e) => Some(e),
        }
    }

    /// Converts into a standard [`Result`].
    pub fn into_result(self) -> Result<V, E> {
        match self {
            Self::Success(v) => Ok(v),
            Self::Failure(e) => Err(e),
        }
    }
}

impl<V, E> From<Result<V, E>> for Outcome<V, E> {
    fn from(result: Result<V, E>) -> Self {
        match result {
            Ok(v) => Self::Success(v),
            Err(e) => Self::Failure(e),
        }
    }
}
