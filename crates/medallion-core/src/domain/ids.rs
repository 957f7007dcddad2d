//! Domain identifiers.
//!
//! - `RunId`: 外部スケジューラから渡される日付キー（`ds_nodash` 形式、例: `20251201`）
//! - `AttemptId`: 1 回の実行ごとに発行する ULID（ログ相関用、レポートには書かない）

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::errors::InvalidRunId;

/// Identifier of one scheduled pipeline execution.
///
/// The token ends up inside file names (`dq_results_<run_id>.json`), so only
/// ASCII alphanumerics, `_` and `-` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RunId(String);

impl RunId {
    /// `ds_nodash` layout.
    pub const DATE_FORMAT: &'static str = "%Y%m%d";

    /// 日付から RunId を作成（`YYYYMMDD`）
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format(Self::DATE_FORMAT).to_string())
    }

    /// Validate an arbitrary identifier.
    ///
    /// Accepts ASCII letters, digits, `_` and `-`, so the id is always safe
    /// inside a file name. It does not have to be a date.
    pub fn parse(value: impl Into<String>) -> Result<Self, InvalidRunId> {
        let value = value.into();
        if value.is_empty() {
            return Err(InvalidRunId::Empty);
        }
        if let Some(ch) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(InvalidRunId::IllegalCharacter { value, ch });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret the token as a `YYYYMMDD` date, if it is one.
    pub fn to_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.0, Self::DATE_FORMAT).ok()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for RunId {
    type Error = InvalidRunId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<RunId> for String {
    fn from(id: RunId) -> Self {
        id.0
    }
}

/// What the trigger hands over for one run: the identifier plus its logical date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    pub run_id: RunId,
    pub logical_date: NaiveDate,
}

impl RunContext {
    /// 新しい RunContext を作成（RunId と論理日付は独立に指定）
    pub fn new(run_id: RunId, logical_date: NaiveDate) -> Self {
        Self {
            run_id,
            logical_date,
        }
    }

    /// Context for a daily run: the identifier is the date in `ds_nodash` form.
    pub fn for_date(logical_date: NaiveDate) -> Self {
        Self::new(RunId::from_date(logical_date), logical_date)
    }

    /// Parse a `ds_nodash` token and derive the logical date from it.
    pub fn from_ds_nodash(ds_nodash: &str) -> Result<Self, InvalidRunId> {
        let run_id = RunId::parse(ds_nodash)?;
        let logical_date = run_id
            .to_date()
            .ok_or_else(|| InvalidRunId::NotADate(ds_nodash.to_string()))?;
        Ok(Self::new(run_id, logical_date))
    }
}

/// Identifier of one execution attempt of a run.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttemptId(Ulid);

impl AttemptId {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for AttemptId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt-{}", self.0)
    }
}
