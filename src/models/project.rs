use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last commit as found in the snapshot. Unparseable values are kept so the
/// report can say so instead of silently dropping them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum CommitTimestamp {
    #[default]
    Missing,
    Invalid(String),
    At(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetricsRow {
    pub project_key: String,
    pub display_name: String,
    pub commit_count: u64,
    pub merged_pr_count: u64,
    pub active_developer_count: u64,
    pub contributor_count: u64,
    pub new_contributor_count: u64,
    pub opened_pr_count: u64,
    pub opened_issue_count: u64,
    pub closed_issue_count: u64,
    pub repository_count: u64,
    pub last_commit: CommitTimestamp,
}

#[cfg(test)]
impl ProjectMetricsRow {
    /// Row with every counter at zero.
    pub fn empty(project_key: &str, display_name: &str) -> Self {
        Self {
            project_key: project_key.to_string(),
            display_name: display_name.to_string(),
            commit_count: 0,
            merged_pr_count: 0,
            active_developer_count: 0,
            contributor_count: 0,
            new_contributor_count: 0,
            opened_pr_count: 0,
            opened_issue_count: 0,
            closed_issue_count: 0,
            repository_count: 0,
            last_commit: CommitTimestamp::Missing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GranteeRecord {
    pub project_name: String,
    pub grantee: String,
    pub program: String,
}
