use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const COMMITS: &str = "commits";
pub const MERGED_PRS: &str = "merged_prs";
pub const ACTIVE_DEVELOPERS: &str = "active_developers";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Min-max normalized over log1p(commits), scaled to 0–100.
    #[default]
    Normalized,
    /// Unscaled weighted sum of raw counts. Kept for comparison with old reports.
    Legacy,
}

impl ScoringMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringMode::Normalized => "normalized",
            ScoringMode::Legacy => "legacy",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "normalized" => Some(ScoringMode::Normalized),
            "legacy" => Some(ScoringMode::Legacy),
            _ => None,
        }
    }
}

/// What to do when a sub-metric has the same value for every project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    #[default]
    Zero,
    Error,
}

impl DegeneratePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "zero" => Some(DegeneratePolicy::Zero),
            "error" => Some(DegeneratePolicy::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    /// Count as read from the metrics table.
    pub input: f64,
    /// Value after the per-metric transform (log1p for commits, identity otherwise).
    pub transformed: f64,
    /// Min-max normalized value in [0, 1]; equals `transformed` in legacy mode.
    pub normalized: f64,
    pub weight: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub commits: ComponentScore,
    pub merged_prs: ComponentScore,
    pub active_developers: ComponentScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityScore {
    pub project_key: String,
    pub display_name: String,
    pub rank: usize,
    pub mode: ScoringMode,
    pub score: f64,
    pub components: ScoreComponents,
    /// `None` when the project has no active developers.
    pub efficiency_ratio: Option<f64>,
}

/// Default scoring weights (sum to 1.0)
pub fn default_weights() -> HashMap<String, f64> {
    let mut w = HashMap::new();
    w.insert(COMMITS.to_string(), 0.5);
    w.insert(MERGED_PRS.to_string(), 0.3);
    w.insert(ACTIVE_DEVELOPERS.to_string(), 0.2);
    w
}
