//! RecordCleaner port - bronze 層のレコードクレンジング
//!
//! 日付付きの raw ファイルを読み、クレンジング済みファイルを clean_dir に書く
//! 純粋な変換。失敗は TransformationError で返す。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

#[async_trait]
pub trait RecordCleaner: Send + Sync {
    async fn clean(
        &self,
        logical_date: NaiveDate,
        raw_dir: &Path,
        clean_dir: &Path,
    ) -> Result<(), TransformationError>;
}

#[derive(Debug, Error)]
pub enum TransformationError {
    #[error("raw input not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("malformed input {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}
