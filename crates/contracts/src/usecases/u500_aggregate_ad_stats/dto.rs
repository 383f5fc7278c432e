use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Days recomputed on every run so that late callbacks are picked up
pub const DEFAULT_ROLLBACK_DAYS: u32 = 7;

/// Body of POST /api/u500/aggregate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationRequest {
    /// Last day of the window, yesterday when omitted
    pub target_date: Option<NaiveDate>,
    /// Window length in days, [`DEFAULT_ROLLBACK_DAYS`] when omitted
    pub rollback_days: Option<u32>,
}

/// Outcome of one aggregation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationReport {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub deleted_rows: u64,
    pub inserted_rows: u64,
    pub total_requests: i64,
    pub total_callbacks: i64,
    /// Date bounds actually present in the window after the run
    pub min_date: Option<String>,
    pub max_date: Option<String>,
}
