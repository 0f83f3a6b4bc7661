use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEvent {
    pub transaction_hash: String,
    pub project_name: String,
    pub block_timestamp: DateTime<Utc>,
    pub to_address: String,
    pub from_address: String,
    pub artifact_name: Option<String>,
    pub passport_score: Option<f64>,
    pub farcaster_username: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrendDirection {
    Increase,
    Decrease,
    NoChange,
}

impl TrendDirection {
    pub fn between(before: u64, after: u64) -> Self {
        match after.cmp(&before) {
            std::cmp::Ordering::Greater => TrendDirection::Increase,
            std::cmp::Ordering::Less => TrendDirection::Decrease,
            std::cmp::Ordering::Equal => TrendDirection::NoChange,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionWindowSummary {
    pub project_name: String,
    pub count_before: u64,
    pub count_after: u64,
    pub pct_change: f64,
    pub dropped: bool,
    pub direction: TrendDirection,
    pub senders_before: u64,
    pub senders_after: u64,
    pub identified_senders: u64,
    pub mean_passport_score: Option<f64>,
}
