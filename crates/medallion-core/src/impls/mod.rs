//! Impls - 実装（本番用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **ProcessCommandRunner**: 子プロセスとして dbt を起動
//! - **DailyTransactionsCleaner**: デフォルトの bronze クレンジング
//! - **RecordingCommandRunner / ScriptedCleaner**: テスト用のダブル

pub mod daily_cleaner;
pub mod process_runner;
pub mod recording;

pub use self::daily_cleaner::DailyTransactionsCleaner;
pub use self::process_runner::ProcessCommandRunner;
pub use self::recording::{RecordedCommand, RecordingCommandRunner, ScriptedCleaner};
