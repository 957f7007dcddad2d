//! Status - 実行結果の要約（observability 用）

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{AttemptId, RunId, RunState, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Succeeded,
    Failed,
}

/// One stage as it ran within an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub task_id: String,
    pub outcome: StageOutcome,
    /// `None` for bronze, which runs in-process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

/// What happened during one execution attempt of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub attempt_id: AttemptId,
    pub state: RunState,
    pub stages: Vec<StageRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
}

impl RunSummary {
    /// 新しい RunSummary を作成（状態は NotStarted）
    pub fn new(run_id: RunId, attempt_id: AttemptId) -> Self {
        Self {
            run_id,
            attempt_id,
            state: RunState::NotStarted,
            stages: Vec::new(),
            report_path: None,
        }
    }

    /// Stages that were started, in execution order.
    pub fn stages_started(&self) -> Vec<Stage> {
        self.stages.iter().map(|r| r.stage).collect()
    }

    /// Record of `stage`, if it was started.
    pub fn record(&self, stage: Stage) -> Option<&StageRecord> {
        self.stages.iter().find(|r| r.stage == stage)
    }
}
