//! Run report types and the text renderer.

use serde::{Deserialize, Serialize};

use crate::{Failure, StepRecord};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// A failing program was found and minimized.
    Fail,
    /// The search used its whole budget without a failure.
    Exhausted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub trials: usize,
    pub failures: usize,
    pub discarded: usize,
    #[serde(rename = "foundLength", skip_serializing_if = "Option::is_none")]
    pub found_length: Option<usize>,
    #[serde(rename = "minimizedLength", skip_serializing_if = "Option::is_none")]
    pub minimized_length: Option<usize>,
    #[serde(rename = "shrinkAttempts")]
    pub shrink_attempts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(rename = "runId")]
    pub run_id: String,
    pub seed: u64,
    #[serde(rename = "startedAt")]
    pub started_at: String,
    #[serde(rename = "finishedAt")]
    pub finished_at: String,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    pub status: RunStatus,
    pub stats: RunStats,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statements: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RunReport {
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        for statement in &self.statements {
            out.push_str(statement);
            out.push('\n');
        }
        if let Some(failure) = &self.failure {
            out.push_str(&format!("failure: {failure}\n"));
        }
        if let Some(message) = &self.message {
            out.push_str(message);
            out.push('\n');
        }
        out.push_str(&format!(
            "status={:?} runId={} seed={} trials={}",
            self.status, self.run_id, self.seed, self.stats.trials
        ));
        if let (Some(found), Some(minimized)) =
            (self.stats.found_length, self.stats.minimized_length)
        {
            out.push_str(&format!(" shrunk={found}->{minimized}"));
        }
        out
    }
}
