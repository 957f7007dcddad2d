//! QualityReport: the gold stage's pass/fail record.

use serde::{Deserialize, Serialize};

use super::command::CommandResult;
use super::ids::RunId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityStatus {
    Passed,
    Failed,
}

impl QualityStatus {
    /// Zero passes; any other code, including a missing one, fails.
    pub fn from_exit_code(exit_code: i32) -> Self {
        if exit_code == 0 {
            Self::Passed
        } else {
            Self::Failed
        }
    }
}

/// Serialized field order is part of the file format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    pub ds_nodash: RunId,
    pub status: QualityStatus,
    pub command: String,
    pub stdout: String,
    pub stderr: String,
}

impl QualityReport {
    /// コマンド結果からレポートを作成
    pub fn from_result(run_id: &RunId, command: &str, result: &CommandResult) -> Self {
        Self {
            ds_nodash: run_id.clone(),
            status: QualityStatus::from_exit_code(result.exit_code),
            command: command.to_string(),
            stdout: result.stdout.clone(),
            stderr: result.stderr.clone(),
        }
    }

    /// `dq_results_<run_id>.json`
    pub fn file_name(run_id: &RunId) -> String {
        format!("dq_results_{run_id}.json")
    }
}
