//! PipelineBuilder - PipelineGraph の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - コラボレータ（CommandRunner, RecordCleaner）が欠けていれば BuildError
//! - 宣言された依存にサイクルがあれば BuildError
//!
//! 基本の silver → bronze / gold → silver の辺は常に残る。追加できるのは辺だけなので、
//! 実行順は必ず bronze → silver → gold になる。

use std::sync::Arc;

use super::graph::PipelineGraph;
use super::stage::StageRunner;
use crate::config::PipelineConfig;
use crate::dependency::DependencyGraph;
use crate::domain::{PipelineDefinition, Stage};
use crate::impls::{DailyTransactionsCleaner, ProcessCommandRunner};
use crate::ports::{Clock, CommandRunner, IdGenerator, RecordCleaner, SystemClock, UlidGenerator};

/// PipelineBuilder は PipelineGraph を構築
///
/// # 使用例
/// ```ignore
/// let pipeline = PipelineBuilder::new(config)
///     .command_runner(Arc::new(ProcessCommandRunner::new()))
///     .record_cleaner(Arc::new(DailyTransactionsCleaner::new()))
///     .build()?;
/// ```
pub struct PipelineBuilder {
    config: PipelineConfig,
    definition: PipelineDefinition,
    runner: Option<Arc<dyn CommandRunner>>,
    cleaner: Option<Arc<dyn RecordCleaner>>,
    ids: Option<Box<dyn IdGenerator>>,
    dependencies: DependencyGraph<Stage>,
}

/// BuildError はパイプライン構築時のエラー
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("stage dependencies contain a cycle: {0:?}")]
    DependencyCycle(Vec<Stage>),
}

impl PipelineBuilder {
    /// Builder with the medallion definition and the silver→bronze and
    /// gold→silver dependencies already declared.
    pub fn new(config: PipelineConfig) -> Self {
        let mut dependencies = DependencyGraph::new();
        for stage in Stage::ALL {
            if let Some(upstream) = stage.upstream() {
                dependencies.add_dependency(stage, upstream);
            }
        }
        Self {
            config,
            definition: PipelineDefinition::medallion(),
            runner: None,
            cleaner: None,
            ids: None,
            dependencies,
        }
    }

    /// Production wiring: dbt subprocesses, the CSV cleaner and the system clock.
    pub fn with_defaults(config: PipelineConfig) -> Self {
        Self::new(config)
            .command_runner(Arc::new(ProcessCommandRunner::new()))
            .record_cleaner(Arc::new(DailyTransactionsCleaner::new()))
            .clock(SystemClock)
    }

    /// silver / gold のツール実行に使う CommandRunner を設定
    pub fn command_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// bronze ステージの RecordCleaner を設定
    pub fn record_cleaner(mut self, cleaner: Arc<dyn RecordCleaner>) -> Self {
        self.cleaner = Some(cleaner);
        self
    }

    /// Clock used for the timestamp part of attempt ids.
    pub fn clock<C: Clock + 'static>(self, clock: C) -> Self {
        self.id_generator(UlidGenerator::new(clock))
    }

    /// Overrides the attempt id source; defaults to ULIDs on the system clock.
    pub fn id_generator<G: IdGenerator + 'static>(mut self, ids: G) -> Self {
        self.ids = Some(Box::new(ids));
        self
    }

    pub fn definition(mut self, definition: PipelineDefinition) -> Self {
        self.definition = definition;
        self
    }

    /// Declare an extra edge: `stage` waits for `depends_on`.
    ///
    /// The linear edges cannot be removed. An edge that closes a cycle fails `build`.
    pub fn dependency(mut self, stage: Stage, depends_on: Stage) -> Self {
        self.dependencies.add_dependency(stage, depends_on);
        self
    }

    /// PipelineGraph を構築
    ///
    /// # Errors
    /// - コラボレータ未設定: `BuildError::MissingCollaborator`
    /// - 依存のサイクル: `BuildError::DependencyCycle`
    pub fn build(self) -> Result<PipelineGraph, BuildError> {
        let runner = self
            .runner
            .ok_or(BuildError::MissingCollaborator("command runner"))?;
        let cleaner = self
            .cleaner
            .ok_or(BuildError::MissingCollaborator("record cleaner"))?;

        if let Some(cycle) = self.dependencies.detect_cycle() {
            return Err(BuildError::DependencyCycle(cycle));
        }
        let order = self
            .dependencies
            .topological_order(&Stage::ALL)
            .map_err(BuildError::DependencyCycle)?;

        let ids = self
            .ids
            .unwrap_or_else(|| Box::new(UlidGenerator::new(SystemClock)));
        let config = Arc::new(self.config);
        let stages = StageRunner::new(Arc::clone(&config), runner, cleaner);

        Ok(PipelineGraph::new(
            self.definition,
            self.dependencies,
            order,
            stages,
            ids,
            config,
        ))
    }
}
