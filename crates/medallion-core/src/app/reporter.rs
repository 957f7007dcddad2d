//! QualityReporter - gold ステージの data-quality レポート
//!
//! `<quality_dir>/dq_results_<run_id>.json` に pretty JSON で書く。
//! 同じ run_id の再実行は上書き（append しない）。

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::domain::{CommandResult, QualityReport, RunId};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot create quality directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot encode quality report: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// QualityReporter は `dq_results_<run_id>.json` の書き込みと読み出しを担当
///
/// # 使用例
/// ```ignore
/// let reporter = QualityReporter::new("/srv/medallion/data/quality");
/// let path = reporter.record(&run_id, "test --select tag:gold", &result).await?;
/// let report = reporter.load(&run_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct QualityReporter {
    quality_dir: PathBuf,
}

impl QualityReporter {
    /// 新しい QualityReporter を作成
    pub fn new(quality_dir: impl Into<PathBuf>) -> Self {
        Self {
            quality_dir: quality_dir.into(),
        }
    }

    pub fn quality_dir(&self) -> &Path {
        &self.quality_dir
    }

    /// Where the report for `run_id` lives, whether or not it exists yet.
    pub fn report_path(&self, run_id: &RunId) -> PathBuf {
        self.quality_dir.join(QualityReport::file_name(run_id))
    }

    /// Persist the report for `run_id`, replacing any earlier one.
    ///
    /// The directory is created on demand. Returns the written path.
    pub async fn record(
        &self,
        run_id: &RunId,
        command_text: &str,
        result: &CommandResult,
    ) -> Result<PathBuf, ReportError> {
        tokio::fs::create_dir_all(&self.quality_dir)
            .await
            .map_err(|source| ReportError::CreateDir {
                path: self.quality_dir.clone(),
                source,
            })?;

        let report = QualityReport::from_result(run_id, command_text, result);
        let body = serde_json::to_string_pretty(&report).map_err(ReportError::Encode)?;

        let path = self.report_path(run_id);
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| ReportError::Write {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), status = ?report.status, "quality report written");
        Ok(path)
    }

    /// 保存済みのレポートを読み出す
    ///
    /// # Errors
    /// - ファイルが無い・読めない: `ReportError::Read`
    /// - JSON として壊れている: `ReportError::Decode`
    pub async fn load(&self, run_id: &RunId) -> Result<QualityReport, ReportError> {
        let path = self.report_path(run_id);
        let body = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ReportError::Read {
                path: path.clone(),
                source,
            })?;
        serde_json::from_str(&body).map_err(|source| ReportError::Decode { path, source })
    }
}
