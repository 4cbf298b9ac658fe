//! Replay with per-step dependency logs, and statement rendering.

use serde::{Deserialize, Serialize};

use crate::{Failure, Machine, Operation, RunContext};

/// One executed step of an annotated program.
#[derive(Debug, Clone)]
pub struct ProgramStep {
    pub operation: Operation,
    /// Names this step wrote. Empty when the step failed.
    pub definitions: Vec<String>,
    /// Names this step read, in read order.
    pub arguments: Vec<String>,
    pub failure: Option<Failure>,
}

impl ProgramStep {
    pub fn failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn compile(&self) -> Vec<String> {
        self.operation.compile(&self.arguments, &self.definitions)
    }

    pub fn record(&self) -> StepRecord {
        StepRecord {
            operation: self.operation.to_string(),
            arguments: self.arguments.clone(),
            definitions: self.definitions.clone(),
            statements: self.compile(),
            failure: self.failure.clone(),
        }
    }
}

/// Serializable view of a [`ProgramStep`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub operation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub definitions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statements: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

impl Machine {
    /// Replays `program` once, recording what every step read and wrote.
    ///
    /// Stops after the first failing step; that step is still recorded.
    pub fn annotate_program(&mut self, program: &[Operation]) -> Vec<ProgramStep> {
        let mut ctx = RunContext::new(&mut self.rng);
        let mut steps = Vec::with_capacity(program.len());
        for operation in program {
            ctx.reset_tracking();
            let outcome = operation.invoke(&mut ctx);
            let arguments = ctx.values_read().to_vec();
            match outcome {
                Ok(()) => steps.push(ProgramStep {
                    operation: operation.clone(),
                    definitions: ctx.values_written().to_vec(),
                    arguments,
                    failure: None,
                }),
                Err(failure) => {
                    steps.push(ProgramStep {
                        operation: operation.clone(),
                        definitions: Vec::new(),
                        arguments,
                        failure: Some(failure),
                    });
                    break;
                }
            }
        }
        steps
    }
}

/// Statements of every step, in execution order.
pub fn render(steps: &[ProgramStep]) -> Vec<String> {
    steps.iter().flat_map(ProgramStep::compile).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinaryOperator, FailureKind, MachineConfig, Push, Value};
    use std::sync::Arc;

    fn push(v: i64) -> Operation {
        Operation::Push(Push {
            target: "N".to_string(),
            value: Value::Int(v),
            name: None,
        })
    }

    fn divide() -> Operation {
        Operation::BinaryOperator(Arc::new(BinaryOperator::new("/", "N", Value::div)))
    }

    #[test]
    fn failing_step_is_last_and_defines_nothing() {
        let mut machine = Machine::new(MachineConfig::default().with_seed(0));
        let program = vec![push(1), push(0), divide(), push(2)];
        let steps = machine.annotate_program(&program);
        assert_eq!(steps.len(), 3);
        assert!(!steps[0].failed());
        assert_eq!(steps[0].definitions, ["t1"]);
        assert!(steps[0].arguments.is_empty());
        assert_eq!(steps[1].definitions, ["t2"]);

        let last = &steps[2];
        assert!(last.failed());
        assert!(last.definitions.is_empty());
        assert_eq!(last.arguments, ["t2", "t1"]);
        assert_eq!(
            last.failure.as_ref().map(|f| f.kind),
            Some(FailureKind::DivisionByZero)
        );

        assert_eq!(render(&steps), vec!["let t1 = 1;", "let t2 = 0;", "t1 / t2;"]);
    }

    #[test]
    fn passing_program_annotates_every_step() {
        let mut machine = Machine::new(MachineConfig::default().with_seed(0));
        let dup = Operation::Dup {
            stack: "N".to_string(),
        };
        let steps = machine.annotate_program(&[push(6), dup, divide()]);
        assert_eq!(steps.len(), 3);
        assert!(steps.iter().all(|s| !s.failed()));
        assert!(steps[1].compile().is_empty());
        assert_eq!(steps[2].arguments, ["t1", "t1"]);
        assert_eq!(render(&steps), vec!["let t1 = 6;", "let t2 = t1 / t1;"]);
    }

    #[test]
    fn record_serializes_without_empty_fields() {
        let mut machine = Machine::new(MachineConfig::default().with_seed(0));
        let steps = machine.annotate_program(&[push(3)]);
        let json = serde_json::to_value(steps[0].record()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "operation": "push 3 -> N",
                "definitions": ["t1"],
                "statements": ["let t1 = 3;"],
            })
        );
    }
}
