use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use medallion_core::app::env::{CLEAN_DIR_KEY, PROFILES_DIR_KEY, RUN_ID_KEY, WAREHOUSE_PATH_KEY};
use medallion_core::app::{PipelineBuilder, PipelineGraph, QualityReporter, ReportError};
use medallion_core::domain::{
    CommandResult, CommandSpec, ExecutionEnvironment, QualityStatus, RunContext, RunId, RunState,
    Stage,
};
use medallion_core::impls::{RecordingCommandRunner, ScriptedCleaner};
use medallion_core::ports::{CommandRunner, RecordCleaner, RunnerError, TransformationError};
use medallion_core::{PipelineConfig, PipelineError};
use tempfile::TempDir;
use tokio::sync::Notify;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ctx() -> RunContext {
    RunContext::for_date(date(2025, 12, 1))
}

struct Harness {
    _tmp: TempDir,
    runner: Arc<RecordingCommandRunner>,
    cleaner: Arc<ScriptedCleaner>,
    pipeline: PipelineGraph,
}

impl Harness {
    fn new(runner: RecordingCommandRunner, cleaner: ScriptedCleaner) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(runner);
        let cleaner = Arc::new(cleaner);
        let pipeline = PipelineBuilder::new(PipelineConfig::from_base_dir(tmp.path()))
            .command_runner(runner.clone())
            .record_cleaner(cleaner.clone())
            .build()
            .unwrap();
        Self {
            _tmp: tmp,
            runner,
            cleaner,
            pipeline,
        }
    }

    fn reporter(&self) -> &QualityReporter {
        self.pipeline.stages().reporter()
    }

    fn report_exists(&self, run_id: &RunId) -> bool {
        self.reporter().report_path(run_id).exists()
    }

    fn tool_stages_invoked(&self) -> Vec<&'static str> {
        self.runner
            .command_lines()
            .iter()
            .map(|line| if line.contains("tag:gold") { "gold" } else { "silver" })
            .collect()
    }
}

#[tokio::test]
async fn successful_run_executes_every_stage_in_order() {
    let h = Harness::new(RecordingCommandRunner::new(), ScriptedCleaner::succeeding());

    let summary = h.pipeline.run(&ctx()).await.unwrap();

    assert_eq!(summary.state, RunState::Succeeded);
    assert_eq!(summary.stages_started(), Stage::ALL.to_vec());
    assert_eq!(h.cleaner.calls().len(), 1);
    assert_eq!(h.tool_stages_invoked(), vec!["silver", "gold"]);
    assert_eq!(summary.record(Stage::Bronze).unwrap().exit_code, None);
    assert_eq!(summary.record(Stage::Gold).unwrap().exit_code, Some(0));

    let report = h.reporter().load(&summary.run_id).await.unwrap();
    assert_eq!(report.status, QualityStatus::Passed);
    assert_eq!(summary.report_path, Some(h.reporter().report_path(&summary.run_id)));
}

#[tokio::test]
async fn rerun_with_same_inputs_produces_identical_report() {
    let runner = RecordingCommandRunner::new()
        .respond("tag:gold", CommandResult::new(0, "Done. PASS=3 WARN=0 ERROR=0", ""));
    let h = Harness::new(runner, ScriptedCleaner::succeeding());

    let first = h.pipeline.run(&ctx()).await.unwrap();
    let path = first.report_path.clone().unwrap();
    let first_bytes = std::fs::read(&path).unwrap();

    let second = h.pipeline.run(&ctx()).await.unwrap();
    let second_bytes = std::fs::read(&path).unwrap();

    assert_eq!(first_bytes, second_bytes);
    assert_ne!(first.attempt_id, second.attempt_id);
    let quality_dir = h.reporter().quality_dir();
    assert_eq!(std::fs::read_dir(quality_dir).unwrap().count(), 1);
}

#[tokio::test]
async fn bronze_failure_skips_silver_and_gold() {
    let h = Harness::new(
        RecordingCommandRunner::new(),
        ScriptedCleaner::failing("raw file unreadable"),
    );

    let failure = h.pipeline.run(&ctx()).await.unwrap_err();

    assert!(matches!(failure.error, PipelineError::Transformation(_)));
    assert_eq!(failure.error.to_string(), "raw file unreadable");
    assert_eq!(failure.summary.state, RunState::Failed(Stage::Bronze));
    assert!(h.runner.calls().is_empty());
    assert!(!h.report_exists(&failure.summary.run_id));
}

#[tokio::test]
async fn silver_failure_skips_gold_and_writes_no_report() {
    let runner = RecordingCommandRunner::new()
        .respond("tag:silver", CommandResult::failure(1, "Compilation Error in model orders"));
    let h = Harness::new(runner, ScriptedCleaner::succeeding());

    let failure = h.pipeline.run(&ctx()).await.unwrap_err();

    assert_eq!(failure.summary.state, RunState::Failed(Stage::Silver));
    assert_eq!(h.tool_stages_invoked(), vec!["silver"]);
    assert!(failure.error.to_string().contains("Compilation Error in model orders"));
    assert!(!h.report_exists(&failure.summary.run_id));
    assert_eq!(failure.summary.report_path, None);
}

#[tokio::test]
async fn failed_quality_test_is_reported_then_raised() {
    let runner = RecordingCommandRunner::new()
        .respond("tag:gold", CommandResult::failure(1, "test X failed"));
    let h = Harness::new(runner, ScriptedCleaner::succeeding());
    let run_id = RunId::parse("20251201").unwrap();

    let failure = h.pipeline.run(&RunContext::from_ds_nodash("20251201").unwrap()).await.unwrap_err();

    assert_eq!(failure.summary.state, RunState::Failed(Stage::Gold));
    assert!(matches!(
        failure.error,
        PipelineError::CommandFailure { stage: Stage::Gold, exit_code: 1, .. }
    ));
    assert!(failure.error.to_string().contains("test X failed"));
    assert_eq!(failure.summary.record(Stage::Gold).unwrap().exit_code, Some(1));

    let report = h.reporter().load(&run_id).await.unwrap();
    assert_eq!(report.ds_nodash, run_id);
    assert_eq!(report.status, QualityStatus::Failed);
    assert!(report.stderr.contains("test X failed"));
    assert_eq!(report.command, "test --select tag:gold");
    assert_eq!(failure.summary.report_path, Some(h.reporter().report_path(&run_id)));
}

#[tokio::test]
async fn report_write_failure_fails_a_passing_run() {
    let h = Harness::new(RecordingCommandRunner::new(), ScriptedCleaner::succeeding());
    let quality_dir = h.reporter().quality_dir().to_path_buf();
    std::fs::create_dir_all(quality_dir.parent().unwrap()).unwrap();
    std::fs::write(&quality_dir, "not a directory").unwrap();

    let failure = h.pipeline.run(&ctx()).await.unwrap_err();

    assert!(matches!(
        failure.error,
        PipelineError::ReportWrite { source: ReportError::CreateDir { .. }, .. }
    ));
    assert_eq!(failure.summary.state, RunState::Failed(Stage::Gold));
}

#[tokio::test]
async fn tool_receives_run_scoped_environment() {
    let h = Harness::new(RecordingCommandRunner::new(), ScriptedCleaner::succeeding());
    let config = h.pipeline.config().clone();

    h.pipeline.run(&ctx()).await.unwrap();

    for call in h.runner.calls() {
        assert_eq!(call.env.get(RUN_ID_KEY), Some("20251201"));
        assert_eq!(call.env.get(CLEAN_DIR_KEY), Some(config.clean_dir.display().to_string().as_str()));
        assert_eq!(
            call.env.get(PROFILES_DIR_KEY),
            Some(config.profiles_dir.display().to_string().as_str())
        );
        assert_eq!(
            call.env.get(WAREHOUSE_PATH_KEY),
            Some(config.warehouse_path.display().to_string().as_str())
        );
        assert_eq!(call.command.working_dir, config.project_dir);
    }
}

#[tokio::test]
async fn backfill_stops_at_first_failed_date() {
    let runner = RecordingCommandRunner::new()
        .respond("tag:gold", CommandResult::failure(1, "freshness check failed"));
    let h = Harness::new(runner, ScriptedCleaner::succeeding());
    let dates = h.pipeline.definition().catchup_dates(None, date(2025, 12, 3));

    let failure = h.pipeline.backfill(dates).await.unwrap_err();

    assert!(failure.completed.is_empty());
    assert_eq!(failure.failure.summary.run_id.as_str(), "20251201");
    assert_eq!(h.cleaner.calls().len(), 1);
}

#[tokio::test]
async fn backfill_to_far_future_consumes_dates_lazily() {
    let runner = RecordingCommandRunner::new()
        .respond("tag:gold", CommandResult::failure(1, "stop here"));
    let h = Harness::new(runner, ScriptedCleaner::succeeding());
    let dates = h.pipeline.definition().catchup_dates(None, NaiveDate::MAX);

    let failure = h.pipeline.backfill(dates).await.unwrap_err();

    assert!(failure.completed.is_empty());
    assert_eq!(failure.failure.summary.run_id.as_str(), "20251201");
}

#[tokio::test]
async fn backfill_runs_each_date_in_order() {
    let h = Harness::new(RecordingCommandRunner::new(), ScriptedCleaner::succeeding());
    let dates = [date(2025, 12, 1), date(2025, 12, 2)];

    let summaries = h.pipeline.backfill(dates).await.unwrap();

    let ids: Vec<&str> = summaries.iter().map(|s| s.run_id.as_str()).collect();
    assert_eq!(ids, vec!["20251201", "20251202"]);
    let cleaned: Vec<NaiveDate> = h.cleaner.calls().iter().map(|c| c.logical_date).collect();
    assert_eq!(cleaned, dates.to_vec());
}

/// Cannot start any command whose line contains `pattern`; succeeds otherwise.
struct UnspawnableRunner {
    pattern: &'static str,
}

#[async_trait]
impl CommandRunner for UnspawnableRunner {
    async fn execute(
        &self,
        command: &CommandSpec,
        _: &ExecutionEnvironment,
    ) -> Result<CommandResult, RunnerError> {
        if command.display().contains(self.pattern) {
            return Err(RunnerError::Spawn {
                program: command.program.clone(),
                working_dir: command.working_dir.display().to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        Ok(CommandResult::success())
    }
}

#[tokio::test]
async fn gold_spawn_failure_halts_run_without_report() {
    let tmp = tempfile::tempdir().unwrap();
    let pipeline = PipelineBuilder::new(PipelineConfig::from_base_dir(tmp.path()))
        .command_runner(Arc::new(UnspawnableRunner { pattern: "tag:gold" }))
        .record_cleaner(Arc::new(ScriptedCleaner::succeeding()))
        .build()
        .unwrap();

    let failure = pipeline.run(&ctx()).await.unwrap_err();

    assert!(matches!(
        failure.error,
        PipelineError::Runner { stage: Stage::Gold, .. }
    ));
    assert_eq!(failure.summary.state, RunState::Failed(Stage::Gold));
    assert_eq!(failure.summary.record(Stage::Gold).unwrap().exit_code, None);
    assert_eq!(failure.summary.report_path, None);
    let reporter = pipeline.stages().reporter();
    assert!(!reporter.report_path(&failure.summary.run_id).exists());
}

/// Blocks inside bronze until released so a run stays in flight.
struct GatedCleaner {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl RecordCleaner for GatedCleaner {
    async fn clean(&self, _: NaiveDate, _: &Path, _: &Path) -> Result<(), TransformationError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(())
    }
}

#[tokio::test]
async fn concurrent_run_for_same_id_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let cleaner = Arc::new(GatedCleaner {
        entered: Notify::new(),
        release: Notify::new(),
    });
    let pipeline = Arc::new(
        PipelineBuilder::new(PipelineConfig::from_base_dir(tmp.path()))
            .command_runner(Arc::new(RecordingCommandRunner::new()))
            .record_cleaner(cleaner.clone())
            .build()
            .unwrap(),
    );

    let first = tokio::spawn({
        let pipeline = Arc::clone(&pipeline);
        async move { pipeline.run(&ctx()).await }
    });
    cleaner.entered.notified().await;
    assert!(pipeline.is_in_flight(&ctx().run_id));

    let rejected = pipeline.run(&ctx()).await.unwrap_err();
    assert!(matches!(rejected.error, PipelineError::RunInFlight(ref id) if id.as_str() == "20251201"));
    assert_eq!(rejected.summary.state, RunState::NotStarted);

    let other = tokio::spawn({
        let pipeline = Arc::clone(&pipeline);
        async move { pipeline.run(&RunContext::for_date(date(2025, 12, 2))).await }
    });
    cleaner.entered.notified().await;
    assert!(pipeline.is_in_flight(&RunId::parse("20251202").unwrap()));

    cleaner.release.notify_one();
    cleaner.release.notify_one();
    assert!(first.await.unwrap().is_ok());
    assert!(other.await.unwrap().is_ok());

    assert!(!pipeline.is_in_flight(&ctx().run_id));
}

#[cfg(unix)]
mod real_tool {
    use super::*;
    use medallion_core::impls::{DailyTransactionsCleaner, ProcessCommandRunner};

    /// Project whose `run` and `test` scripts stand in for dbt when the tool is `sh`.
    fn project(tmp: &TempDir, test_script: &str) -> PipelineConfig {
        let mut config = PipelineConfig::from_base_dir(tmp.path());
        config.tool = "sh".to_string();
        std::fs::create_dir_all(&config.project_dir).unwrap();
        std::fs::write(
            config.project_dir.join("run"),
            "printf '%s' \"$DS_NODASH\" > silver_ran\necho \"built $1 $2 $3\"\n",
        )
        .unwrap();
        std::fs::write(config.project_dir.join("test"), test_script).unwrap();

        std::fs::create_dir_all(&config.raw_dir).unwrap();
        std::fs::write(
            config.raw_dir.join("transactions_20251201.csv"),
            "id,amount\n1,10\n1,10\n2,\n3,30\n",
        )
        .unwrap();
        config
    }

    fn pipeline(config: PipelineConfig) -> PipelineGraph {
        PipelineBuilder::new(config)
            .command_runner(Arc::new(ProcessCommandRunner::new()))
            .record_cleaner(Arc::new(DailyTransactionsCleaner::new()))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn end_to_end_with_shell_scripts() {
        let tmp = tempfile::tempdir().unwrap();
        let config = project(&tmp, "echo \"checked $DUCKDB_PATH\"\n");
        let pipeline = pipeline(config.clone());

        let summary = pipeline.run(&ctx()).await.unwrap();

        assert_eq!(summary.state, RunState::Succeeded);
        let cleaned =
            std::fs::read_to_string(config.clean_dir.join("transactions_20251201.csv")).unwrap();
        assert_eq!(cleaned.lines().filter(|l| l.starts_with("1,")).count(), 1);
        assert!(!cleaned.contains("2,"));
        assert_eq!(
            std::fs::read_to_string(config.project_dir.join("silver_ran")).unwrap(),
            "20251201"
        );

        let report = pipeline.stages().reporter().load(&summary.run_id).await.unwrap();
        assert_eq!(report.status, QualityStatus::Passed);
        assert_eq!(
            report.stdout.trim(),
            format!("checked {}", config.warehouse_path.display())
        );
    }

    #[tokio::test]
    async fn end_to_end_failing_quality_test() {
        let tmp = tempfile::tempdir().unwrap();
        let config = project(&tmp, "echo 'test X failed' >&2\nexit 1\n");
        let pipeline = pipeline(config);

        let failure = pipeline.run(&ctx()).await.unwrap_err();

        assert!(failure.error.to_string().contains("test X failed"));
        let report = pipeline.stages().reporter().load(&failure.summary.run_id).await.unwrap();
        assert_eq!(report.status, QualityStatus::Failed);
        assert_eq!(report.stderr.trim(), "test X failed");
    }

    #[tokio::test]
    async fn missing_raw_file_halts_before_tool() {
        let tmp = tempfile::tempdir().unwrap();
        let config = project(&tmp, "exit 0\n");
        let pipeline = pipeline(config.clone());

        let failure = pipeline
            .run(&RunContext::for_date(date(2025, 12, 2)))
            .await
            .unwrap_err();

        assert!(matches!(
            failure.error,
            PipelineError::Transformation(TransformationError::MissingInput(_))
        ));
        assert!(!config.project_dir.join("silver_ran").exists());
    }
}
