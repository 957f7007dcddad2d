//! CommandRunner port - 外部変換ツール（dbt）の起動
//!
//! ステージのロジックに触れずにツールを差し替え・モック化するための境界。

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{CommandResult, CommandSpec, ExecutionEnvironment};

/// Runs one external command to completion and captures both output streams.
///
/// A non-zero exit code is a normal `Ok(CommandResult)`; the caller inspects
/// `exit_code`. `Err` is reserved for the process not running at all.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn execute(
        &self,
        command: &CommandSpec,
        env: &ExecutionEnvironment,
    ) -> Result<CommandResult, RunnerError>;
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to run `{program}` in {working_dir}: {source}")]
    Spawn {
        program: String,
        working_dir: String,
        #[source]
        source: std::io::Error,
    },
}
