use crate::models::transaction::{TransactionEvent, TransactionWindowSummary, TrendDirection};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Default)]
struct ProjectWindows<'a> {
    /// hash → earliest observation
    first_seen: HashMap<&'a str, DateTime<Utc>>,
    senders_before: HashSet<&'a str>,
    senders_after: HashSet<&'a str>,
    identified: HashSet<&'a str>,
    /// hashes whose passport score is already in the sum
    scored_hashes: HashSet<&'a str>,
    passport_sum: f64,
    passport_count: usize,
}

/// Percent change from `before` to `after`. A zero baseline is treated as 1.
pub fn pct_change(before: u64, after: u64) -> f64 {
    let denominator = if before == 0 { 1.0 } else { before as f64 };
    (after as f64 - before as f64) / denominator * 100.0
}

/// Split transactions at `cutoff` (before: `<`, after: `>=`) and compare the
/// distinct transaction counts per project.
///
/// A hash seen more than once for a project counts once, in the window of its
/// earliest timestamp. Projects with no events do not appear. Sorted by
/// `pct_change` descending; ties stay in project-name order.
pub fn summarize_windows(
    events: &[TransactionEvent],
    cutoff: DateTime<Utc>,
) -> Vec<TransactionWindowSummary> {
    let mut projects: BTreeMap<&str, ProjectWindows<'_>> = BTreeMap::new();

    for event in events {
        let windows = projects.entry(event.project_name.as_str()).or_default();

        windows
            .first_seen
            .entry(event.transaction_hash.as_str())
            .and_modify(|seen| {
                if event.block_timestamp < *seen {
                    *seen = event.block_timestamp;
                }
            })
            .or_insert(event.block_timestamp);

        if !event.from_address.is_empty() {
            if event.block_timestamp < cutoff {
                windows.senders_before.insert(event.from_address.as_str());
            } else {
                windows.senders_after.insert(event.from_address.as_str());
            }
            if event.farcaster_username.is_some() {
                windows.identified.insert(event.from_address.as_str());
            }
        }

        if let Some(score) = event.passport_score.filter(|s| s.is_finite()) {
            if windows.scored_hashes.insert(event.transaction_hash.as_str()) {
                windows.passport_sum += score;
                windows.passport_count += 1;
            }
        }
    }

    let mut summaries: Vec<TransactionWindowSummary> = projects
        .into_iter()
        .map(|(project_name, windows)| {
            let count_before = windows
                .first_seen
                .values()
                .filter(|ts| **ts < cutoff)
                .count() as u64;
            let count_after = windows.first_seen.len() as u64 - count_before;

            TransactionWindowSummary {
                project_name: project_name.to_string(),
                count_before,
                count_after,
                pct_change: pct_change(count_before, count_after),
                dropped: count_after < count_before,
                direction: TrendDirection::between(count_before, count_after),
                senders_before: windows.senders_before.len() as u64,
                senders_after: windows.senders_after.len() as u64,
                identified_senders: windows.identified.len() as u64,
                mean_passport_score: (windows.passport_count > 0)
                    .then(|| windows.passport_sum / windows.passport_count as f64),
            }
        })
        .collect();

    summaries.sort_by(|a, b| b.pct_change.total_cmp(&a.pct_change));

    let dropped = summaries.iter().filter(|s| s.dropped).count();
    log::info!(
        "summarized {} transactions across {} projects ({} dropped after {})",
        events.len(),
        summaries.len(),
        dropped,
        cutoff.to_rfc3339()
    );

    summaries
}
