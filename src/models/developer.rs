use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const ACTIVE_DEVELOPERS_METRIC: &str = "active_developers";

/// One row of the daily per-repository time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetricSample {
    pub project_name: String,
    pub sample_date: NaiveDate,
    pub metric_name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeveloperSeriesSummary {
    pub project_name: String,
    pub sample_days: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub latest_amount: f64,
    pub mean_daily_amount: f64,
    pub peak_daily_amount: f64,
}
