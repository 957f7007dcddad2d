//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部コラボレータ（dbt プロセス、bronze クレンジング関数、時計）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - スケジューラの状態は RunContext として注入する（トリガー方式は仮定しない）
//! - 外部ツールは CommandRunner 越しにのみ起動する

pub mod cleaner;
pub mod clock;
pub mod command_runner;
pub mod id_generator;

pub use self::cleaner::{RecordCleaner, TransformationError};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::command_runner::{CommandRunner, RunnerError};
pub use self::id_generator::{IdGenerator, UlidGenerator};
