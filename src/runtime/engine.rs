//! Core engine: search, shrink, annotate, render, and a final sanity replay.

use tracing::{info, warn};
use uuid::Uuid;

use std::time::Instant;

use crate::{
    Machine, ProgramStep, RunReport, RunStats, RunStatus, StackfuzzError, StackfuzzResult, render,
    wall_time_iso_utc,
};

impl Machine {
    /// Runs the whole pipeline once.
    ///
    /// Exhaustion yields an `exhausted` report rather than an error. A
    /// minimized program that stops failing on the sanity replay is an
    /// [`StackfuzzError::Invariant`]; anything else found fails the run.
    pub fn run(&mut self) -> StackfuzzResult<RunReport> {
        let run_id = Uuid::new_v4().to_string();
        let started_at = wall_time_iso_utc();
        let started = Instant::now();
        info!(run_id = %run_id, seed = self.seed, "run started");

        let found = match self.search() {
            Ok(found) => found,
            Err(err @ StackfuzzError::NoFailingProgram { .. }) => {
                warn!("{err}");
                let stats = self.run_stats(None, None, 0);
                return Ok(RunReport {
                    run_id,
                    seed: self.seed,
                    started_at,
                    finished_at: wall_time_iso_utc(),
                    duration_ms: elapsed_ms(started),
                    status: RunStatus::Exhausted,
                    stats,
                    statements: Vec::new(),
                    steps: Vec::new(),
                    failure: None,
                    message: Some(err.to_string()),
                });
            }
            Err(err) => return Err(err),
        };

        let (minimal, shrink) = self.shrink(&found.program)?;
        let steps = self.annotate_program(&minimal);
        let statements = render(&steps);

        let failure = match self.run_program(&minimal) {
            Err(failure) => failure,
            Ok(()) => {
                return Err(StackfuzzError::Invariant(format!(
                    "minimized program of {} operations no longer fails",
                    minimal.len()
                )));
            }
        };
        info!(
            found = found.program.len(),
            minimized = minimal.len(),
            kind = ?failure.kind,
            "run finished with a failing program"
        );

        let stats = self.run_stats(Some(found.program.len()), Some(minimal.len()), shrink.attempts);
        Ok(RunReport {
            run_id,
            seed: self.seed,
            started_at,
            finished_at: wall_time_iso_utc(),
            duration_ms: elapsed_ms(started),
            status: RunStatus::Fail,
            stats,
            statements,
            steps: steps.iter().map(ProgramStep::record).collect(),
            failure: Some(failure),
            message: None,
        })
    }

    fn run_stats(
        &self,
        found_length: Option<usize>,
        minimized_length: Option<usize>,
        shrink_attempts: usize,
    ) -> RunStats {
        RunStats {
            trials: self.stats.trials,
            failures: self.stats.failures,
            discarded: self.stats.discarded,
            found_length,
            minimized_length,
            shrink_attempts,
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}
