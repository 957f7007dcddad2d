//! PipelineGraph - 1 run 分のオーケストレーション
//!
//! # 保証
//! - ステージは依存グラフのトポロジカル順に 1 つずつ実行する
//! - 同じ RunId の run は同時に 1 つまで（in-flight registry）
//! - 失敗したステージで run を止める（リトライしない）

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{Instrument, error, info, info_span, warn};

use super::stage::StageRunner;
use super::status::{RunSummary, StageOutcome, StageRecord};
use crate::config::PipelineConfig;
use crate::dependency::DependencyGraph;
use crate::domain::{PipelineDefinition, RunContext, RunId, Stage};
use crate::error::PipelineError;
use crate::ports::IdGenerator;

/// A run that halted, together with what it got through before halting.
#[derive(Debug, Error)]
#[error("run {} failed ({})", .summary.run_id, .summary.state)]
pub struct RunFailure {
    pub summary: RunSummary,
    #[source]
    pub error: PipelineError,
}

/// A backfill stopped at its first failed date.
#[derive(Debug, Error)]
#[error("backfill stopped after {} completed run(s)", .completed.len())]
pub struct BackfillFailure {
    pub completed: Vec<RunSummary>,
    #[source]
    pub failure: RunFailure,
}

/// PipelineGraph は組み立て済みのパイプライン（`PipelineBuilder::build` で作成）
///
/// # 使用例
/// ```ignore
/// let pipeline = PipelineBuilder::with_defaults(config).build()?;
/// let summary = pipeline.run(&RunContext::for_date(date)).await?;
/// ```
pub struct PipelineGraph {
    definition: PipelineDefinition,
    dependencies: DependencyGraph<Stage>,
    order: Vec<Stage>,
    stages: StageRunner,
    ids: Box<dyn IdGenerator>,
    in_flight: InFlightRegistry,
    config: Arc<PipelineConfig>,
}

impl PipelineGraph {
    pub(crate) fn new(
        definition: PipelineDefinition,
        dependencies: DependencyGraph<Stage>,
        order: Vec<Stage>,
        stages: StageRunner,
        ids: Box<dyn IdGenerator>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            definition,
            dependencies,
            order,
            stages,
            ids,
            in_flight: InFlightRegistry::default(),
            config,
        }
    }

    /// Scheduler-facing metadata.
    pub fn definition(&self) -> &PipelineDefinition {
        &self.definition
    }

    /// Stage execution order.
    pub fn order(&self) -> &[Stage] {
        &self.order
    }

    /// Direct upstream stages of `stage`, sorted.
    pub fn dependencies_of(&self, stage: Stage) -> Vec<Stage> {
        self.dependencies.get_dependencies(stage)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn stages(&self) -> &StageRunner {
        &self.stages
    }

    /// 指定 RunId の run が実行中かどうか
    pub fn is_in_flight(&self, run_id: &RunId) -> bool {
        self.in_flight.contains(run_id)
    }

    /// Execute every stage for `ctx`, stopping at the first failure.
    pub async fn run(&self, ctx: &RunContext) -> Result<RunSummary, RunFailure> {
        let mut summary = RunSummary::new(ctx.run_id.clone(), self.ids.generate_attempt_id());
        let span = info_span!(
            "pipeline_run",
            pipeline = %self.definition.id,
            run_id = %ctx.run_id,
            attempt_id = %summary.attempt_id,
        );

        let Some(_guard) = self.in_flight.acquire(&ctx.run_id) else {
            span.in_scope(|| warn!("run already in flight; rejected"));
            return Err(RunFailure {
                summary,
                error: PipelineError::RunInFlight(ctx.run_id.clone()),
            });
        };

        match self.drive(ctx, &mut summary).instrument(span).await {
            Ok(()) => Ok(summary),
            Err(error) => Err(RunFailure { summary, error }),
        }
    }

    /// Run `dates` one after another. Stops at the first failed run.
    ///
    /// `dates` is pulled one at a time, so a lazy range is never materialised.
    pub async fn backfill<I>(&self, dates: I) -> Result<Vec<RunSummary>, BackfillFailure>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut completed = Vec::new();
        for date in dates {
            match self.run(&RunContext::for_date(date)).await {
                Ok(summary) => completed.push(summary),
                Err(failure) => return Err(BackfillFailure { completed, failure }),
            }
        }
        Ok(completed)
    }

    async fn drive(&self, ctx: &RunContext, summary: &mut RunSummary) -> Result<(), PipelineError> {
        info!(logical_date = %ctx.logical_date, order = ?self.order, "run started");

        for &stage in &self.order {
            summary.state = summary.state.start(stage)?;
            let started = Instant::now();
            let outcome = self
                .stages
                .run(stage, ctx)
                .instrument(info_span!("stage", stage = %stage, task_id = stage.task_id()))
                .await;
            let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            match outcome {
                Ok(output) => {
                    summary.stages.push(StageRecord {
                        stage,
                        task_id: stage.task_id().to_string(),
                        outcome: StageOutcome::Succeeded,
                        exit_code: output.result.as_ref().map(|r| r.exit_code),
                        duration_ms,
                    });
                    if output.report_path.is_some() {
                        summary.report_path = output.report_path;
                    }
                    info!(%stage, duration_ms, "stage succeeded");
                }
                Err(err) => {
                    let exit_code = match &err {
                        PipelineError::CommandFailure { exit_code, .. } => Some(*exit_code),
                        _ => None,
                    };
                    summary.stages.push(StageRecord {
                        stage,
                        task_id: stage.task_id().to_string(),
                        outcome: StageOutcome::Failed,
                        exit_code,
                        duration_ms,
                    });
                    // a failed gold test still leaves its report behind
                    if stage.writes_quality_report() && exit_code.is_some() {
                        summary.report_path = Some(self.stages.reporter().report_path(&ctx.run_id));
                    }
                    summary.state = summary.state.fail()?;
                    error!(%stage, ?exit_code, error = %err, "stage failed; halting run");
                    return Err(err);
                }
            }
        }

        summary.state = summary.state.finish()?;
        info!(stages = summary.stages.len(), "run succeeded");
        Ok(())
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// RunIds currently executing in this process.
#[derive(Debug, Clone, Default)]
struct InFlightRegistry {
    runs: Arc<Mutex<HashSet<RunId>>>,
}

impl InFlightRegistry {
    /// `None` when `run_id` is already in flight.
    fn acquire(&self, run_id: &RunId) -> Option<InFlightGuard> {
        if !lock(&self.runs).insert(run_id.clone()) {
            return None;
        }
        Some(InFlightGuard {
            runs: Arc::clone(&self.runs),
            run_id: run_id.clone(),
        })
    }

    fn contains(&self, run_id: &RunId) -> bool {
        lock(&self.runs).contains(run_id)
    }
}

/// Releases the RunId on drop, whichever way the run ended.
struct InFlightGuard {
    runs: Arc<Mutex<HashSet<RunId>>>,
    run_id: RunId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.runs).remove(&self.run_id);
    }
}
