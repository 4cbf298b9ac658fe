//! Domain failures raised while invoking an operation.

use serde::{Deserialize, Serialize};

use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Mutation attempted on a stack inside a freeze scope.
    FrozenStack,
    /// Pop or peek past the bottom of a stack.
    EmptyStack,
    DivisionByZero,
    Overflow,
    /// A `Check` operation's test returned false.
    CheckFailed,
    Domain,
}

/// The outcome of a failed `invoke`.
///
/// The search and shrink loops only care that a failure happened; the kind is
/// carried so reports (and future hit policies) can tell failures apart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn frozen(stack: &str) -> Self {
        Self::new(
            FailureKind::FrozenStack,
            format!("cannot modify frozen varstack {stack:?}"),
        )
    }

    pub fn empty(stack: &str, depth: usize) -> Self {
        Self::new(
            FailureKind::EmptyStack,
            format!("varstack {stack:?} has no value at depth {depth}"),
        )
    }

    pub fn domain(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Domain, message)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Failure {}
