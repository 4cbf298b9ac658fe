//! Operation generators and the weighted choice combinator.

use rand_chacha::ChaCha20Rng;
use rand_core::RngCore as _;

use std::fmt;
use std::sync::Arc;

use crate::{
    BinaryOperator, Check, Operation, Push, ReadAndWrite, RunContext, UnaryOperator, Value,
};

/// Draws the value a `PushRandom` step will push.
pub type Produce = Arc<dyn Fn(&mut ChaCha20Rng) -> Value + Send + Sync>;

#[derive(Clone)]
pub struct PushRandom {
    pub target: String,
    pub produce: Produce,
    pub name: Option<String>,
}

impl fmt::Debug for PushRandom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushRandom")
            .field("target", &self.target)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Picks one child per step, weighted, among children whose inputs are
/// available in the current context.
#[derive(Debug, Clone, Default)]
pub struct ChooseFrom {
    children: Vec<(u32, Language)>,
}

impl ChooseFrom {
    pub fn uniform(children: impl IntoIterator<Item = Language>) -> Self {
        Self {
            children: children.into_iter().map(|c| (1, c)).collect(),
        }
    }

    pub fn weighted(children: impl IntoIterator<Item = (u32, Language)>) -> Self {
        Self {
            children: children.into_iter().filter(|(w, _)| *w > 0).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn inputs_available(&self, ctx: &RunContext<'_>) -> bool {
        self.children.iter().any(|(_, c)| c.inputs_available(ctx))
    }

    fn generate(&self, ctx: &mut RunContext<'_>) -> Option<Operation> {
        let candidates: Vec<&(u32, Language)> = self
            .children
            .iter()
            .filter(|(_, c)| c.inputs_available(ctx))
            .collect();
        let total: u64 = candidates.iter().map(|(w, _)| u64::from(*w)).sum();
        if total == 0 {
            return None;
        }
        let mut pick = ctx.rng().next_u64() % total;
        for (weight, child) in candidates {
            let weight = u64::from(*weight);
            if pick < weight {
                return child.generate(ctx);
            }
            pick -= weight;
        }
        None
    }
}

/// A generator of operations. Fixed operations generate themselves.
#[derive(Debug, Clone)]
pub enum Language {
    ReadAndWrite(Arc<ReadAndWrite>),
    Check(Arc<Check>),
    PushRandom(Arc<PushRandom>),
    BinaryOperator(Arc<BinaryOperator>),
    UnaryOperator(Arc<UnaryOperator>),
    Dup { stack: String },
    Drop { stack: String },
    ChooseFrom(ChooseFrom),
}

impl Language {
    /// Structural check only; domain preconditions are left to shrinking.
    pub fn inputs_available(&self, ctx: &RunContext<'_>) -> bool {
        match self {
            Self::PushRandom(_) => true,
            Self::ChooseFrom(choice) => choice.inputs_available(ctx),
            fixed => fixed
                .as_fixed()
                .is_some_and(|op| op.inputs_available(ctx)),
        }
    }

    /// `None` when nothing can be generated in this context.
    pub fn generate(&self, ctx: &mut RunContext<'_>) -> Option<Operation> {
        match self {
            Self::PushRandom(gen_push) => {
                let value = (gen_push.produce)(ctx.rng());
                Some(Operation::Push(Push {
                    target: gen_push.target.clone(),
                    value,
                    name: gen_push.name.clone(),
                }))
            }
            Self::ChooseFrom(choice) => choice.generate(ctx),
            fixed => fixed.as_fixed(),
        }
    }

    fn as_fixed(&self) -> Option<Operation> {
        Some(match self {
            Self::ReadAndWrite(op) => Operation::ReadAndWrite(Arc::clone(op)),
            Self::Check(op) => Operation::Check(Arc::clone(op)),
            Self::BinaryOperator(op) => Operation::BinaryOperator(Arc::clone(op)),
            Self::UnaryOperator(op) => Operation::UnaryOperator(Arc::clone(op)),
            Self::Dup { stack } => Operation::Dup {
                stack: stack.clone(),
            },
            Self::Drop { stack } => Operation::Drop {
                stack: stack.clone(),
            },
            Self::PushRandom(_) | Self::ChooseFrom(_) => return None,
        })
    }
}
