//! ProcessCommandRunner - `tokio::process` による CommandRunner 実装

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::{CommandResult, CommandSpec, ExecutionEnvironment};
use crate::ports::{CommandRunner, RunnerError};

/// Spawns the command as a child process and waits for it to exit.
///
/// The child sees exactly the given environment (the builder already copied
/// the ambient one into it) and runs in `CommandSpec::working_dir`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessCommandRunner;

impl ProcessCommandRunner {
    /// 新しい ProcessCommandRunner を作成
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessCommandRunner {
    async fn execute(
        &self,
        command: &CommandSpec,
        env: &ExecutionEnvironment,
    ) -> Result<CommandResult, RunnerError> {
        debug!(command = %command.display(), cwd = %command.working_dir.display(), "spawning");

        let output = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&command.working_dir)
            .env_clear()
            .envs(env.iter())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| RunnerError::Spawn {
                program: command.program.clone(),
                working_dir: command.working_dir.display().to_string(),
                source,
            })?;

        Ok(CommandResult::new(
            output.status.code().unwrap_or(CommandResult::NO_EXIT_CODE),
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ))
    }
}
