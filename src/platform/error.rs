//! Tooling errors. Domain failures raised by operations are `Failure` values, not these.

use thiserror::Error;

pub type StackfuzzResult<T> = Result<T, StackfuzzError>;

#[derive(Debug, Error)]
pub enum StackfuzzError {
    #[error("unable to find a failing program of length <= {prog_length} after {n_iters} iterations")]
    NoFailingProgram { prog_length: usize, n_iters: usize },

    #[error("program does not fail; only failing programs can be minimized")]
    NotFailing,

    #[error("internal consistency violation: {0}")]
    Invariant(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("program fails only through an inapplicable step; pruning removes the failure")]
    IllegalFailure,
}
