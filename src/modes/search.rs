//! Random program search under a failure budget.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Failure, Language, Machine, Operation, RunContext, StackfuzzError, StackfuzzResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Programs generated, including the one that ended the search.
    pub trials: usize,
    /// Trials whose failure was kept.
    pub failures: usize,
    /// Failing trials dropped because the failure vanished once pruned.
    pub discarded: usize,
    /// Length of the best failing program, when one was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_length: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct FailingProgram {
    pub program: Vec<Operation>,
    pub failure: Failure,
}

impl Machine {
    /// Returns the shortest failing program among the sampled trials.
    pub fn find_failing_program(&mut self) -> StackfuzzResult<Vec<Operation>> {
        self.search().map(|found| found.program)
    }

    pub fn search(&mut self) -> StackfuzzResult<FailingProgram> {
        let n_iters = self.config.n_iters;
        let prog_length = self.config.prog_length;
        let good_enough = self.config.good_enough;
        let language = self.language();

        self.stats = SearchStats::default();
        let mut best: Option<FailingProgram> = None;

        for trial in 0..n_iters {
            self.stats.trials += 1;
            let Some(mut found) = self.run_trial(&language, prog_length) else {
                continue;
            };

            if self.config.legal_failures_only {
                let pruned = self.prune_program(&found.program);
                match self.run_program(&pruned) {
                    Err(failure) => {
                        found = FailingProgram {
                            program: pruned,
                            failure,
                        };
                    }
                    Ok(()) => {
                        self.stats.discarded += 1;
                        debug!(
                            trial,
                            kind = ?found.failure.kind,
                            "failure needs an inapplicable step; discarded"
                        );
                        continue;
                    }
                }
            }

            self.stats.failures += 1;
            debug!(
                trial,
                length = found.program.len(),
                kind = ?found.failure.kind,
                "failing program found"
            );
            if best
                .as_ref()
                .is_none_or(|b| found.program.len() < b.program.len())
            {
                self.stats.best_length = Some(found.program.len());
                best = Some(found);
            }
            if self.stats.failures >= good_enough {
                break;
            }
        }

        info!(
            trials = self.stats.trials,
            failures = self.stats.failures,
            discarded = self.stats.discarded,
            best = ?self.stats.best_length,
            "search finished"
        );
        best.ok_or(StackfuzzError::NoFailingProgram {
            prog_length,
            n_iters,
        })
    }

    /// Builds one program step by step, invoking each operation as it is chosen.
    fn run_trial(&mut self, language: &Language, prog_length: usize) -> Option<FailingProgram> {
        let mut ctx = RunContext::new(&mut self.rng);
        let mut program = Vec::new();
        for _ in 0..prog_length {
            let operation = language.generate(&mut ctx)?;
            program.push(operation.clone());
            if let Err(failure) = operation.invoke(&mut ctx) {
                return Some(FailingProgram { program, failure });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinaryOperator, MachineConfig, Value, rand_range};

    fn machine(config: MachineConfig, guarded: bool) -> Machine {
        let mut machine = Machine::new(config);
        machine.generate(|rng| Value::Int(rand_range(rng, -1, 1)), "N", None);
        let divide = BinaryOperator::new("/", "N", Value::div);
        machine.binary_operation(if guarded {
            divide.with_precondition(|_, y| !y.is_zero())
        } else {
            divide
        });
        machine
    }

    #[test]
    fn finds_a_division_by_zero() {
        let config = MachineConfig {
            seed: Some(5),
            ..MachineConfig::default()
        };
        let mut machine = machine(config, false);
        let found = machine.search().unwrap();
        assert_eq!(found.failure.kind, crate::FailureKind::DivisionByZero);
        assert!(matches!(found.program.last(), Some(Operation::BinaryOperator(_))));
        assert!(machine.program_fails(&found.program));
        assert_eq!(machine.search_stats().best_length, Some(found.program.len()));
    }

    #[test]
    fn failure_budget_stops_the_search_early() {
        let config = MachineConfig {
            seed: Some(5),
            n_iters: 1_000,
            good_enough: 3,
            ..MachineConfig::default()
        };
        let mut machine = machine(config, false);
        machine.search().unwrap();
        assert_eq!(machine.search_stats().failures, 3);
        assert!(machine.search_stats().trials < 1_000);
    }

    #[test]
    fn exhaustion_runs_every_trial() {
        let config = MachineConfig {
            seed: Some(5),
            n_iters: 25,
            prog_length: 30,
            ..MachineConfig::default()
        };
        let mut machine = Machine::new(config);
        machine.generate(|rng| Value::Int(rand_range(rng, 0, 9)), "N", None);
        machine.basic_operations("N");
        let err = machine.find_failing_program().unwrap_err();
        assert!(matches!(
            err,
            StackfuzzError::NoFailingProgram {
                prog_length: 30,
                n_iters: 25
            }
        ));
        assert_eq!(machine.search_stats().trials, 25);
        assert_eq!(machine.search_stats().failures, 0);
    }

    #[test]
    fn illegal_failures_are_discarded() {
        let config = MachineConfig {
            seed: Some(5),
            n_iters: 40,
            prog_length: 40,
            ..MachineConfig::default()
        };
        let mut machine = machine(config, true);
        assert!(machine.search().is_err());
        assert!(machine.search_stats().discarded > 0);
        assert_eq!(machine.search_stats().failures, 0);
    }

    #[test]
    fn raw_policy_keeps_illegal_failures() {
        let config = MachineConfig {
            seed: Some(5),
            n_iters: 40,
            prog_length: 40,
            legal_failures_only: false,
            ..MachineConfig::default()
        };
        let mut machine = machine(config, true);
        let found = machine.search().unwrap();
        assert_eq!(found.failure.kind, crate::FailureKind::DivisionByZero);
        assert_eq!(machine.search_stats().discarded, 0);
    }

    #[test]
    fn raw_policy_illegal_failures_cannot_be_minimized() {
        for seed in 0..20 {
            let config = MachineConfig {
                seed: Some(seed),
                n_iters: 40,
                prog_length: 40,
                legal_failures_only: false,
                ..MachineConfig::default()
            };
            let mut machine = machine(config, true);
            let program = machine.find_failing_program().unwrap();
            let err = machine.minimize_failing_program(&program).unwrap_err();
            assert!(matches!(err, StackfuzzError::IllegalFailure), "seed {seed}");
        }
    }

    #[test]
    fn raw_policy_minimizes_to_applicable_steps_only() {
        for seed in 0..20 {
            let config = MachineConfig {
                seed: Some(seed),
                legal_failures_only: false,
                ..MachineConfig::default()
            };
            let mut machine = machine(config, false);
            let program = machine.find_failing_program().unwrap();
            let minimal = machine.minimize_failing_program(&program).unwrap();
            assert_eq!(machine.prune_program(&minimal), minimal, "seed {seed}");
            assert!(machine.program_fails(&minimal), "seed {seed}");
        }
    }
}
