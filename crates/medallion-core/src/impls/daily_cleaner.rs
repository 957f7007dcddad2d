//! DailyTransactionsCleaner - デフォルトの bronze クレンジング
//!
//! `<raw_dir>/transactions_<YYYYMMDD>.csv` → `<clean_dir>/transactions_<YYYYMMDD>.csv`
//!
//! - CSV のクォートを解釈し、出力時は必要なフィールドだけクォートする
//! - ヘッダ行はそのまま（フィールドの前後空白のみ除去）
//! - 空行、列数がヘッダと異なる行、空フィールドを含む行を捨てる
//! - 完全一致の重複行は最初の 1 行だけ残す

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::ports::{RecordCleaner, TransformationError};

#[derive(Debug, Clone, Copy, Default)]
pub struct DailyTransactionsCleaner;

impl DailyTransactionsCleaner {
    /// 新しい DailyTransactionsCleaner を作成
    pub fn new() -> Self {
        Self
    }

    /// `transactions_<YYYYMMDD>.csv`; the same name in the raw and clean dirs.
    pub fn file_name(logical_date: NaiveDate) -> String {
        format!("transactions_{}.csv", logical_date.format("%Y%m%d"))
    }

    pub fn raw_path(raw_dir: &Path, logical_date: NaiveDate) -> PathBuf {
        raw_dir.join(Self::file_name(logical_date))
    }

    pub fn clean_path(clean_dir: &Path, logical_date: NaiveDate) -> PathBuf {
        clean_dir.join(Self::file_name(logical_date))
    }
}

#[async_trait]
impl RecordCleaner for DailyTransactionsCleaner {
    async fn clean(
        &self,
        logical_date: NaiveDate,
        raw_dir: &Path,
        clean_dir: &Path,
    ) -> Result<(), TransformationError> {
        let input = Self::raw_path(raw_dir, logical_date);
        let raw = match tokio::fs::read_to_string(&input).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TransformationError::MissingInput(input));
            }
            Err(source) => return Err(TransformationError::Io { path: input, source }),
        };

        let malformed = |reason: String| TransformationError::Malformed {
            path: input.clone(),
            reason,
        };
        let cleaned = clean_csv(&raw).map_err(malformed)?;
        let body = cleaned.render().map_err(|e| malformed(e.to_string()))?;
        if !cleaned.dropped_lines.is_empty() {
            warn!(
                input = %input.display(),
                lines = ?cleaned.dropped_lines,
                "dropped invalid or duplicate rows"
            );
        }

        tokio::fs::create_dir_all(clean_dir)
            .await
            .map_err(|source| TransformationError::Io {
                path: clean_dir.to_path_buf(),
                source,
            })?;
        let output = Self::clean_path(clean_dir, logical_date);
        tokio::fs::write(&output, body)
            .await
            .map_err(|source| TransformationError::Io {
                path: output.clone(),
                source,
            })?;

        info!(
            input = %input.display(),
            output = %output.display(),
            kept = cleaned.rows.len(),
            dropped = cleaned.dropped_lines.len(),
            "bronze records cleaned"
        );
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
struct CleanedCsv {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    /// 1-based input line of every dropped row.
    dropped_lines: Vec<u64>,
}

impl CleanedCsv {
    fn render(&self) -> Result<Vec<u8>, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.header)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
    }
}

fn clean_csv(raw: &str) -> Result<CleanedCsv, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());
    let mut records = reader.records();

    let header: Vec<String> = match records.next() {
        Some(record) => record
            .map_err(|e| e.to_string())?
            .iter()
            .map(str::to_string)
            .collect(),
        None => return Err("input has no header row".to_string()),
    };
    if header.iter().any(String::is_empty) {
        return Err("header contains an empty column name".to_string());
    }

    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    let mut dropped_lines = Vec::new();
    for record in records {
        let record = record.map_err(|e| e.to_string())?;
        let line = record.position().map_or(0, csv::Position::line);
        let fields: Vec<String> = record.iter().map(str::to_string).collect();
        let valid = fields.len() == header.len() && fields.iter().all(|f| !f.is_empty());
        if valid && seen.insert(fields.clone()) {
            rows.push(fields);
        } else {
            dropped_lines.push(line);
        }
    }

    Ok(CleanedCsv {
        header,
        rows,
        dropped_lines,
    })
}
