//! StageRunner - 各ステージ（bronze / silver / gold）の実行
//!
//! silver と gold は同じ `run_tool_stage` を通り、レポート出力の有無は
//! `quality_report` フラグ（`Stage::writes_quality_report`）で切り替える。

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use super::env::EnvironmentBuilder;
use super::reporter::QualityReporter;
use crate::config::PipelineConfig;
use crate::domain::{CommandResult, CommandSpec, RunContext, RunId, Stage};
use crate::error::PipelineError;
use crate::ports::{CommandRunner, RecordCleaner};

/// Result of a stage that completed without a pipeline-fatal error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOutput {
    /// Captured tool result; `None` for bronze.
    pub result: Option<CommandResult>,
    pub report_path: Option<PathBuf>,
}

/// StageRunner はステージ単位の実行を担当
pub struct StageRunner {
    config: Arc<PipelineConfig>,
    runner: Arc<dyn CommandRunner>,
    cleaner: Arc<dyn RecordCleaner>,
    reporter: QualityReporter,
}

impl StageRunner {
    /// 新しい StageRunner を作成
    pub fn new(
        config: Arc<PipelineConfig>,
        runner: Arc<dyn CommandRunner>,
        cleaner: Arc<dyn RecordCleaner>,
    ) -> Self {
        let reporter = QualityReporter::new(config.quality_dir.clone());
        Self {
            config,
            runner,
            cleaner,
            reporter,
        }
    }

    pub fn reporter(&self) -> &QualityReporter {
        &self.reporter
    }

    /// Dispatch to the routine for `stage`.
    pub async fn run(&self, stage: Stage, ctx: &RunContext) -> Result<StageOutput, PipelineError> {
        match stage {
            Stage::Bronze => self.run_bronze(ctx).await,
            Stage::Silver => self.run_silver(&ctx.run_id).await,
            Stage::Gold => self.run_gold(&ctx.run_id).await,
        }
    }

    /// In-process cleaning of the logical date's raw file.
    pub async fn run_bronze(&self, ctx: &RunContext) -> Result<StageOutput, PipelineError> {
        self.cleaner
            .clean(ctx.logical_date, &self.config.raw_dir, &self.config.clean_dir)
            .await?;
        Ok(StageOutput::default())
    }

    /// Builds the silver models. Never writes a report.
    pub async fn run_silver(&self, run_id: &RunId) -> Result<StageOutput, PipelineError> {
        self.run_tool_stage(Stage::Silver, run_id, Stage::Silver.writes_quality_report())
            .await
    }

    /// Tests the gold models and records the quality report, pass or fail.
    pub async fn run_gold(&self, run_id: &RunId) -> Result<StageOutput, PipelineError> {
        self.run_tool_stage(Stage::Gold, run_id, Stage::Gold.writes_quality_report())
            .await
    }

    /// Shared silver/gold routine; `quality_report` turns on the report side effect.
    async fn run_tool_stage(
        &self,
        stage: Stage,
        run_id: &RunId,
        quality_report: bool,
    ) -> Result<StageOutput, PipelineError> {
        let Some(command_text) = stage.tool_command() else {
            return Ok(StageOutput::default());
        };
        let env = EnvironmentBuilder::new(&self.config).build(run_id);
        let command = CommandSpec::tool(&self.config.tool, command_text, &self.config.project_dir);
        info!(command = %command.display(), "running tool command");

        let result = self
            .runner
            .execute(&command, &env)
            .await
            .map_err(|source| PipelineError::Runner { stage, source })?;

        info!(exit_code = result.exit_code, stdout = %result.stdout, "tool command finished");
        if !result.stderr.is_empty() {
            warn!(stderr = %result.stderr, "tool command wrote to stderr");
        }

        let report_path = if quality_report {
            match self.reporter.record(run_id, command_text, &result).await {
                Ok(path) => Some(path),
                Err(source) => {
                    if !result.is_success() {
                        warn!(
                            exit_code = result.exit_code,
                            stderr = %result.stderr,
                            "tool command failed and its quality report was not written"
                        );
                    }
                    return Err(PipelineError::ReportWrite {
                        run_id: run_id.clone(),
                        source,
                    });
                }
            }
        } else {
            None
        };

        if !result.is_success() {
            return Err(PipelineError::CommandFailure {
                stage,
                exit_code: result.exit_code,
                stderr: result.stderr,
            });
        }

        Ok(StageOutput {
            result: Some(result),
            report_path,
        })
    }
}
