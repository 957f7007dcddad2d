//! Subcommands: run, backfill, report, plan.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use medallion_core::config::BASE_DIR_VAR;
use medallion_core::domain::{RunContext, RunId, Stage};
use medallion_core::{PipelineBuilder, PipelineConfig, PipelineGraph, RunSummary};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "medallion", version, about = "Bronze/Silver/Gold medallion pipeline")]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Deployment root; every path defaults relative to it.
    #[arg(long, global = true, env = "MEDALLION_BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Execute one run.
    Run(RunArgs),
    /// Run every logical date in a range, oldest first.
    Backfill(BackfillArgs),
    /// Print the stored quality report of a run.
    Report {
        #[arg(long)]
        ds: String,
    },
    /// Print the pipeline definition and its stages.
    Plan,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Run identifier. Alone it must be YYYYMMDD; with --date any identifier is accepted.
    #[arg(long)]
    ds: Option<String>,

    /// Logical date as YYYY-MM-DD; defaults to the date in --ds, else today (UTC).
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Print the run summary as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
pub struct BackfillArgs {
    /// First logical date; defaults to the pipeline start date.
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last logical date (inclusive).
    #[arg(long)]
    to: NaiveDate,

    #[arg(long)]
    json: bool,
}

/// Resolve the configuration once, then dispatch the subcommand.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.base_dir.as_deref(), |key| std::env::var(key).ok())?;
    match cli.command {
        Command::Run(args) => run_once(config, args).await,
        Command::Backfill(args) => backfill(config, args).await,
        Command::Report { ds } => report(config, &ds).await,
        Command::Plan => plan(config),
    }
}

/// `--base-dir` replaces the base directory variable; every other key goes through `lookup`.
fn load_config<F>(base_dir: Option<&Path>, lookup: F) -> anyhow::Result<PipelineConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let base_dir = base_dir.map(|p| p.display().to_string());
    PipelineConfig::from_lookup(|key| {
        if key == BASE_DIR_VAR {
            base_dir.clone().or_else(|| lookup(key))
        } else {
            lookup(key)
        }
    })
    .context("invalid pipeline configuration")
}

fn build(config: PipelineConfig) -> anyhow::Result<PipelineGraph> {
    PipelineBuilder::with_defaults(config)
        .build()
        .context("cannot build pipeline")
}

fn run_context(args: &RunArgs) -> anyhow::Result<RunContext> {
    let ctx = match (&args.ds, args.date) {
        (Some(ds), Some(date)) => {
            let run_id = RunId::parse(ds.as_str()).with_context(|| format!("invalid --ds {ds}"))?;
            RunContext::new(run_id, date)
        }
        (Some(ds), None) => {
            RunContext::from_ds_nodash(ds).with_context(|| format!("invalid --ds {ds}"))?
        }
        (None, Some(date)) => RunContext::for_date(date),
        (None, None) => RunContext::for_date(Utc::now().date_naive()),
    };
    Ok(ctx)
}

async fn run_once(config: PipelineConfig, args: RunArgs) -> anyhow::Result<()> {
    let ctx = run_context(&args)?;
    let pipeline = build(config)?;

    match pipeline.run(&ctx).await {
        Ok(summary) => {
            print_summary(&summary, args.json)?;
            Ok(())
        }
        Err(failure) => {
            print_summary(&failure.summary, args.json)?;
            Err(failure.into())
        }
    }
}

async fn backfill(config: PipelineConfig, args: BackfillArgs) -> anyhow::Result<()> {
    let pipeline = build(config)?;
    let mut dates = pipeline.definition().catchup_dates(args.from, args.to).peekable();
    let Some(first) = dates.peek().copied() else {
        info!(to = %args.to, "nothing to backfill");
        return Ok(());
    };
    info!(%first, last = %args.to, "backfill started");

    match pipeline.backfill(dates).await {
        Ok(summaries) => {
            for summary in &summaries {
                print_summary(summary, args.json)?;
            }
            Ok(())
        }
        Err(stopped) => {
            for summary in &stopped.completed {
                print_summary(summary, args.json)?;
            }
            print_summary(&stopped.failure.summary, args.json)?;
            error!(
                completed = stopped.completed.len(),
                failed = %stopped.failure.summary.run_id,
                last = %args.to,
                "backfill halted"
            );
            Err(stopped.into())
        }
    }
}

async fn report(config: PipelineConfig, ds: &str) -> anyhow::Result<()> {
    let run_id = RunId::parse(ds).with_context(|| format!("invalid --ds {ds}"))?;
    let pipeline = build(config)?;
    let report = pipeline.stages().reporter().load(&run_id).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn plan(config: PipelineConfig) -> anyhow::Result<()> {
    let pipeline = build(config)?;
    let def = pipeline.definition();
    println!("{} - {}", def.id, def.description);
    println!(
        "schedule: {} (UTC), start {}, catchup {}, max active runs {}",
        def.schedule, def.start_date, def.catchup, def.max_active_runs
    );
    for stage in pipeline.order() {
        let waits_for: Vec<String> = pipeline
            .dependencies_of(*stage)
            .iter()
            .map(|s| s.task_id().to_string())
            .collect();
        println!(
            "  {:<12} {:<32} after [{}]",
            stage.task_id(),
            describe(*stage, &pipeline.config().tool),
            waits_for.join(", ")
        );
    }
    Ok(())
}

fn describe(stage: Stage, tool: &str) -> String {
    match stage.tool_command() {
        Some(command) => format!("{tool} {command}"),
        None => "clean raw records".to_string(),
    }
}

fn print_summary(summary: &RunSummary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }
    println!("{} {} {}", summary.run_id, summary.attempt_id, summary.state);
    for record in &summary.stages {
        let exit = record
            .exit_code
            .map(|c| format!(" exit={c}"))
            .unwrap_or_default();
        println!(
            "  {:<12} {:?} {}ms{exit}",
            record.task_id, record.outcome, record.duration_ms
        );
    }
    if let Some(path) = &summary.report_path {
        println!("  report: {}", path.display());
    }
    Ok(())
}
