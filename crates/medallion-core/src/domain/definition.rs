//! Pipeline definition metadata (what the scheduler is told about the pipeline).

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub id: String,
    pub description: String,
    /// Cron expression, evaluated in UTC by the scheduler.
    pub schedule: String,
    pub start_date: NaiveDate,
    pub catchup: bool,
    pub max_active_runs: u32,
}

impl PipelineDefinition {
    /// Daily at 06:00 UTC from 2025-12-01, with catch-up and one active run.
    pub fn medallion() -> Self {
        Self {
            id: "medallion_pipeline".to_string(),
            description: "Bronze/Silver/Gold medallion demo".to_string(),
            schedule: "0 6 * * *".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap_or_default(),
            catchup: true,
            max_active_runs: 1,
        }
    }

    /// Logical dates a catch-up over `[from, to]` covers, oldest first.
    ///
    /// `from` defaults to `start_date`; dates before `start_date` are never
    /// produced. Empty when the range is inverted. Dates are produced lazily,
    /// so an open-ended `to` costs nothing until iterated.
    pub fn catchup_dates(
        &self,
        from: Option<NaiveDate>,
        to: NaiveDate,
    ) -> impl Iterator<Item = NaiveDate> + use<> {
        let from = from.map_or(self.start_date, |d| d.max(self.start_date));
        std::iter::successors(Some(from), |d| d.checked_add_days(Days::new(1)))
            .take_while(move |d| *d <= to)
    }
}

impl Default for PipelineDefinition {
    fn default() -> Self {
        Self::medallion()
    }
}
