//! Result of one structured request/validate cycle.

use crate::errors::{Problem, ProblemKind, TransportError};

/// Either a validated value or a typed [`Problem`]. Never both.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The model output satisfied the contract.
    Success(T),
    /// The model output (or the contract itself) was unusable.
    Problem(Problem),
}

/// Result of a structured call: transport failures are errors, problems are values.
pub type ChatResult<T> = Result<Outcome<T>, TransportError>;

impl<T> Outcome<T> {
    /// Whether this is a success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// The problem kind, if this is a problem.
    #[must_use]
    pub fn problem_kind(&self) -> Option<ProblemKind> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Problem(problem) => Some(problem.kind),
        }
    }

    /// Borrow the problem, if any.
    #[must_use]
    pub fn problem(&self) -> Option<&Problem> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Problem(problem) => Some(problem),
        }
    }

    /// Borrow the value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Problem(_) => None,
        }
    }

    /// Map the success value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Problem(problem) => Outcome::Problem(problem),
        }
    }

    /// Convert into a standard `Result`.
    pub fn into_result(self) -> Result<T, Problem> {
        self.into()
    }
}

impl<T> From<Outcome<T>> for Result<T, Problem> {
    fn from(outcome: Outcome<T>) -> Self {
        match outcome {
            Outcome::Success(value) => Ok(value),
            Outcome::Problem(problem) => Err(problem),
        }
    }
}

impl<T> From<Result<T, Problem>> for Outcome<T> {
    fn from(result: Result<T, Problem>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(problem) => Outcome::Problem(problem),
        }
    }
}
