use crate::analysis::activity::{score_projects, ScoringOptions};
use crate::analysis::developers::summarize_active_developers;
use crate::analysis::highlights::build_highlights;
use crate::analysis::join::{build_combined_view, CombinedInputs};
use crate::analysis::trend::summarize_windows;
use crate::commands::loader;
use crate::commands::settings::{load_effective_report_settings, EffectiveReportSettings, SettingsOverrides};
use crate::error::ReportResult;
use crate::models::activity_score::ActivityScore;
use crate::models::combined::CombinedProjectView;
use crate::models::developer::{DailyMetricSample, DeveloperSeriesSummary};
use crate::models::project::{GranteeRecord, ProjectMetricsRow};
use crate::models::report::ImpactReport;
use crate::models::transaction::{TransactionEvent, TransactionWindowSummary};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Everything read from the snapshot directory for one run.
#[derive(Debug, Default)]
pub struct ReportInputs {
    pub metrics: Vec<ProjectMetricsRow>,
    pub events: Vec<TransactionEvent>,
    pub skipped_events: usize,
    pub developer_series: Vec<DailyMetricSample>,
    pub grantees: Vec<GranteeRecord>,
}

pub async fn run_full_report(data_dir: String, overrides: SettingsOverrides) -> Result<ImpactReport, String> {
    run_full_report_internal(&data_dir, &overrides, Utc::now()).map_err(|e| e.to_string())
}

pub async fn get_activity_scores(
    data_dir: String,
    overrides: SettingsOverrides,
) -> Result<Vec<ActivityScore>, String> {
    activity_scores_internal(&data_dir, &overrides).map_err(|e| e.to_string())
}

pub async fn get_transaction_trends(
    data_dir: String,
    overrides: SettingsOverrides,
) -> Result<Vec<TransactionWindowSummary>, String> {
    transaction_trends_internal(&data_dir, &overrides).map_err(|e| e.to_string())
}

pub async fn get_combined_view(
    data_dir: String,
    overrides: SettingsOverrides,
) -> Result<Vec<CombinedProjectView>, String> {
    combined_view_internal(&data_dir, &overrides, Utc::now()).map_err(|e| e.to_string())
}

pub async fn get_developer_activity(
    data_dir: String,
    overrides: SettingsOverrides,
) -> Result<Vec<DeveloperSeriesSummary>, String> {
    developer_activity_internal(&data_dir, &overrides).map_err(|e| e.to_string())
}

pub fn run_full_report_internal(
    data_dir: &str,
    overrides: &SettingsOverrides,
    now: DateTime<Utc>,
) -> ReportResult<ImpactReport> {
    let start = std::time::Instant::now();
    let settings = load_effective_report_settings(data_dir)?.apply(overrides);
    let inputs = load_report_inputs(&settings)?;

    let mut report = build_report(&inputs, &settings, now)?;
    report.duration_ms = start.elapsed().as_millis() as u64;
    Ok(report)
}

/// Scores need the metrics table only.
pub fn activity_scores_internal(
    data_dir: &str,
    overrides: &SettingsOverrides,
) -> ReportResult<Vec<ActivityScore>> {
    let settings = load_effective_report_settings(data_dir)?.apply(overrides);
    let metrics = loader::load_project_metrics(&settings.files.metrics)?;
    score_projects(&metrics, &scoring_options(&settings))
}

/// Trends need the transaction table (and the optional username lookup) only.
pub fn transaction_trends_internal(
    data_dir: &str,
    overrides: &SettingsOverrides,
) -> ReportResult<Vec<TransactionWindowSummary>> {
    let settings = load_effective_report_settings(data_dir)?.apply(overrides);
    let transactions = load_transaction_inputs(&settings)?;
    Ok(summarize_windows(&transactions.events, settings.cutoff))
}

pub fn developer_activity_internal(
    data_dir: &str,
    overrides: &SettingsOverrides,
) -> ReportResult<Vec<DeveloperSeriesSummary>> {
    let settings = load_effective_report_settings(data_dir)?.apply(overrides);
    let series = load_optional(&settings.files.developer_series, loader::load_developer_series)?
        .unwrap_or_default();
    Ok(summarize_active_developers(&series))
}

/// The combined view is where both engines meet.
pub fn combined_view_internal(
    data_dir: &str,
    overrides: &SettingsOverrides,
    now: DateTime<Utc>,
) -> ReportResult<Vec<CombinedProjectView>> {
    let settings = load_effective_report_settings(data_dir)?.apply(overrides);
    let metrics = loader::load_project_metrics(&settings.files.metrics)?;
    let transactions = load_transaction_inputs(&settings)?;
    let grantees = load_optional(&settings.files.grantees, loader::load_grantees)?.unwrap_or_default();

    let scores = score_projects(&metrics, &scoring_options(&settings))?;
    let trends = summarize_windows(&transactions.events, settings.cutoff);
    Ok(build_combined_view(
        &CombinedInputs {
            metrics: &metrics,
            scores: &scores,
            trends: &trends,
            grantees: &grantees,
        },
        settings.combined_join,
        now,
    ))
}

pub fn load_report_inputs(settings: &EffectiveReportSettings) -> ReportResult<ReportInputs> {
    let files = &settings.files;
    let metrics = loader::load_project_metrics(&files.metrics)?;
    let transactions = load_transaction_inputs(settings)?;
    let developer_series = load_optional(&files.developer_series, loader::load_developer_series)?
        .unwrap_or_default();
    let grantees = load_optional(&files.grantees, loader::load_grantees)?.unwrap_or_default();

    Ok(ReportInputs {
        metrics,
        events: transactions.events,
        skipped_events: transactions.skipped,
        developer_series,
        grantees,
    })
}

fn load_transaction_inputs(settings: &EffectiveReportSettings) -> ReportResult<loader::LoadedTransactions> {
    let files = &settings.files;
    let usernames = load_optional(&files.usernames, loader::load_usernames)?.unwrap_or_default();
    Ok(load_optional(&files.transactions, |path| loader::load_transactions(path, &usernames))?
        .unwrap_or_default())
}

fn scoring_options(settings: &EffectiveReportSettings) -> ScoringOptions<'_> {
    ScoringOptions {
        mode: settings.scoring_mode,
        degenerate_policy: settings.degenerate_policy,
        weights: &settings.weights,
    }
}

/// Pure part of the pipeline: derive every table from already loaded inputs.
pub fn build_report(
    inputs: &ReportInputs,
    settings: &EffectiveReportSettings,
    now: DateTime<Utc>,
) -> ReportResult<ImpactReport> {
    let scores = score_projects(&inputs.metrics, &scoring_options(settings))?;
    let trends = summarize_windows(&inputs.events, settings.cutoff);
    let developer_activity = summarize_active_developers(&inputs.developer_series);
    let combined = build_combined_view(
        &CombinedInputs {
            metrics: &inputs.metrics,
            scores: &scores,
            trends: &trends,
            grantees: &inputs.grantees,
        },
        settings.combined_join,
        now,
    );
    let highlights = build_highlights(&scores, &inputs.metrics, settings.top_n);

    Ok(ImpactReport {
        generated_at: now,
        cutoff: settings.cutoff,
        scoring_mode: settings.scoring_mode,
        join: settings.combined_join,
        project_count: scores.len(),
        scores,
        trends,
        developer_activity,
        combined,
        highlights,
        skipped_events: inputs.skipped_events,
        duration_ms: 0,
    })
}

fn load_optional<T, F>(path: &Path, load: F) -> ReportResult<Option<T>>
where
    F: FnOnce(&Path) -> ReportResult<T>,
{
    if !path.exists() {
        log::info!("{} not found, skipping", path.display());
        return Ok(None);
    }
    load(path).map(Some)
}
