//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてパイプラインを実装します。
//!
//! # 主要コンポーネント
//! - **PipelineBuilder**: パイプラインの構築とワイヤリング
//! - **PipelineGraph**: 依存順にステージを実行し、single-flight を保証
//! - **StageRunner**: bronze / silver / gold の各ステージ
//! - **EnvironmentBuilder**: dbt に渡す環境変数
//! - **QualityReporter**: gold の data-quality レポート
//! - **RunSummary**: 実行結果の要約

pub mod builder;
pub mod env;
pub mod graph;
pub mod reporter;
pub mod stage;
pub mod status;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, PipelineBuilder};
pub use self::env::EnvironmentBuilder;
pub use self::graph::{BackfillFailure, PipelineGraph, RunFailure};
pub use self::reporter::{QualityReporter, ReportError};
pub use self::stage::{StageOutput, StageRunner};
pub use self::status::{RunSummary, StageOutcome, StageRecord};
