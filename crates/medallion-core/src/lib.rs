//! medallion-core
//!
//! Orchestration core for a bronze → silver → gold medallion pipeline.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, stage, state, command, report, definition, errors）
//! - **ports**: 抽象化レイヤー（CommandRunner, RecordCleaner, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（builder, graph, stage, env, reporter, status）
//! - **impls**: 実装（ProcessCommandRunner, DailyTransactionsCleaner, テスト用ダブル）
//! - **dependency**: ステージ間の依存グラフ
//! - **config**: パス設定
//! - **error**: パイプラインのエラー型

pub mod app;
pub mod config;
pub mod dependency;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;

pub use app::{PipelineBuilder, PipelineGraph, RunFailure, RunSummary};
pub use config::PipelineConfig;
pub use error::PipelineError;
