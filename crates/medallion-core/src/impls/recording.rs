//! In-memory test doubles for the ports.
//!
//! - `RecordingCommandRunner`: scripted exit codes per command, records every call
//! - `ScriptedCleaner`: succeeds or fails on demand, records every call

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{CommandResult, CommandSpec, ExecutionEnvironment};
use crate::ports::{CommandRunner, RecordCleaner, RunnerError, TransformationError};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A command as the runner received it.
#[derive(Debug, Clone)]
pub struct RecordedCommand {
    pub command: CommandSpec,
    pub env: ExecutionEnvironment,
}

/// Answers each command with the first scripted result whose pattern occurs in
/// the command line, or a plain success.
#[derive(Debug, Default)]
pub struct RecordingCommandRunner {
    responses: Mutex<Vec<(String, CommandResult)>>,
    calls: Mutex<Vec<RecordedCommand>>,
}

impl RecordingCommandRunner {
    /// 新しい RecordingCommandRunner を作成（全コマンドが成功する）
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `result` to any command line containing `pattern`.
    pub fn respond(self, pattern: impl Into<String>, result: CommandResult) -> Self {
        lock(&self.responses).push((pattern.into(), result));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCommand> {
        lock(&self.calls).clone()
    }

    /// Command lines executed so far, in order.
    pub fn command_lines(&self) -> Vec<String> {
        lock(&self.calls).iter().map(|c| c.command.display()).collect()
    }
}

#[async_trait]
impl CommandRunner for RecordingCommandRunner {
    async fn execute(
        &self,
        command: &CommandSpec,
        env: &ExecutionEnvironment,
    ) -> Result<CommandResult, RunnerError> {
        let line = command.display();
        lock(&self.calls).push(RecordedCommand {
            command: command.clone(),
            env: env.clone(),
        });
        let result = lock(&self.responses)
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_else(CommandResult::success);
        Ok(result)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanCall {
    pub logical_date: NaiveDate,
    pub raw_dir: PathBuf,
    pub clean_dir: PathBuf,
}

/// RecordCleaner whose outcome is fixed at construction.
#[derive(Debug, Default)]
pub struct ScriptedCleaner {
    failure: Option<String>,
    calls: Mutex<Vec<CleanCall>>,
}

impl ScriptedCleaner {
    /// Every call succeeds.
    pub fn succeeding() -> Self {
        Self::default()
    }

    /// Every call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            calls: Mutex::default(),
        }
    }

    pub fn calls(&self) -> Vec<CleanCall> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl RecordCleaner for ScriptedCleaner {
    async fn clean(
        &self,
        logical_date: NaiveDate,
        raw_dir: &Path,
        clean_dir: &Path,
    ) -> Result<(), TransformationError> {
        lock(&self.calls).push(CleanCall {
            logical_date,
            raw_dir: raw_dir.to_path_buf(),
            clean_dir: clean_dir.to_path_buf(),
        });
        match &self.failure {
            Some(message) => Err(TransformationError::Other(message.clone())),
            None => Ok(()),
        }
    }
}
