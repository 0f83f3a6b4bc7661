use super::activity_score::{ActivityScore, ScoringMode};
use super::combined::{CombinedJoin, CombinedProjectView};
use super::developer::DeveloperSeriesSummary;
use super::transaction::TransactionWindowSummary;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlights {
    pub top_performers: Vec<String>,
    pub emerging_projects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactReport {
    pub generated_at: DateTime<Utc>,
    pub cutoff: DateTime<Utc>,
    pub scoring_mode: ScoringMode,
    pub join: CombinedJoin,
    pub project_count: usize,
    pub scores: Vec<ActivityScore>,
    pub trends: Vec<TransactionWindowSummary>,
    pub developer_activity: Vec<DeveloperSeriesSummary>,
    pub combined: Vec<CombinedProjectView>,
    pub highlights: Highlights,
    pub skipped_events: usize,
    pub duration_ms: u64,
}
