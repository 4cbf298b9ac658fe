//! Pruning replays and single-deletion minimization of failing programs.
//!
//! Deleting one operation can strand a later one (a pop with nothing left to
//! pop, a division whose divisor is now zero). Every candidate is therefore
//! pruned by replaying it from scratch and dropping whatever is no longer
//! applicable, and only candidates that still fail after pruning are kept.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Machine, Operation, RunContext, StackfuzzError, StackfuzzResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShrinkStats {
    /// Candidates pruned and replayed.
    pub attempts: usize,
    /// Candidates adopted as the new best.
    pub accepted: usize,
    /// Full passes over the program, including the final unproductive one.
    pub passes: usize,
}

impl Machine {
    /// Replays `program`, skipping inapplicable operations and stopping after
    /// the first one that fails.
    pub fn prune_program(&mut self, program: &[Operation]) -> Vec<Operation> {
        let mut ctx = RunContext::new(&mut self.rng);
        let mut results = Vec::with_capacity(program.len());
        for operation in program {
            if !operation.applicable(&ctx) {
                continue;
            }
            results.push(operation.clone());
            if operation.invoke(&mut ctx).is_err() {
                break;
            }
        }
        results
    }

    pub fn minimize_failing_program(
        &mut self,
        program: &[Operation],
    ) -> StackfuzzResult<Vec<Operation>> {
        self.shrink(program).map(|(minimal, _)| minimal)
    }

    /// Greedy delta debugging: delete one operation, prune, keep the result if
    /// it still fails and restart from the front; stop after a pass with no
    /// accepted deletion.
    ///
    /// The input is pruned first, so the result never holds an inapplicable
    /// step. An input that only fails through one is an
    /// [`StackfuzzError::IllegalFailure`].
    pub fn shrink(
        &mut self,
        program: &[Operation],
    ) -> StackfuzzResult<(Vec<Operation>, ShrinkStats)> {
        if !self.program_fails(program) {
            return Err(StackfuzzError::NotFailing);
        }
        let start = self.prune_program(program);
        if !self.program_fails(&start) {
            return Err(StackfuzzError::IllegalFailure);
        }

        let mut stats = ShrinkStats::default();
        let mut best = start;
        'pass: loop {
            stats.passes += 1;
            for i in 0..best.len() {
                let mut edit = best.clone();
                edit.remove(i);
                let pruned = self.prune_program(&edit);
                stats.attempts += 1;
                if self.program_fails(&pruned) {
                    debug!(
                        index = i,
                        from = best.len(),
                        to = pruned.len(),
                        "shrink step accepted"
                    );
                    stats.accepted += 1;
                    best = pruned;
                    continue 'pass;
                }
            }
            break;
        }

        info!(
            from = program.len(),
            to = best.len(),
            attempts = stats.attempts,
            passes = stats.passes,
            "minimized failing program"
        );
        Ok((best, stats))
    }
}
