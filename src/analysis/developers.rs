use crate::models::developer::{DailyMetricSample, DeveloperSeriesSummary, ACTIVE_DEVELOPERS_METRIC};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Summarize the `active_developers` rows of the daily series per project.
/// Repository rows sharing a project and date are summed into one daily amount.
pub fn summarize_active_developers(samples: &[DailyMetricSample]) -> Vec<DeveloperSeriesSummary> {
    let mut daily: BTreeMap<&str, BTreeMap<NaiveDate, f64>> = BTreeMap::new();

    for sample in samples
        .iter()
        .filter(|s| s.metric_name == ACTIVE_DEVELOPERS_METRIC && s.amount.is_finite())
    {
        *daily
            .entry(sample.project_name.as_str())
            .or_default()
            .entry(sample.sample_date)
            .or_insert(0.0) += sample.amount;
    }

    daily
        .into_iter()
        .filter_map(|(project_name, by_date)| {
            let (first_date, _) = by_date.first_key_value()?;
            let (last_date, latest_amount) = by_date.last_key_value()?;
            let total: f64 = by_date.values().sum();
            let peak = by_date.values().copied().fold(f64::NEG_INFINITY, f64::max);

            Some(DeveloperSeriesSummary {
                project_name: project_name.to_string(),
                sample_days: by_date.len(),
                first_date: *first_date,
                last_date: *last_date,
                latest_amount: *latest_amount,
                mean_daily_amount: total / by_date.len() as f64,
                peak_daily_amount: peak,
            })
        })
        .collect()
}
