use crate::analysis::recency::days_since_last_commit;
use crate::models::activity_score::ActivityScore;
use crate::models::combined::{Cell, CombinedDirection, CombinedJoin, CombinedProjectView};
use crate::models::project::{GranteeRecord, ProjectMetricsRow};
use crate::models::transaction::{TransactionWindowSummary, TrendDirection};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

pub struct CombinedInputs<'a> {
    pub metrics: &'a [ProjectMetricsRow],
    pub scores: &'a [ActivityScore],
    pub trends: &'a [TransactionWindowSummary],
    pub grantees: &'a [GranteeRecord],
}

/// Join scores, transaction trends and grantee labels on the project key.
///
/// `join` decides which table's projects become rows; every other side is
/// filled with "No Data" when it has no match. Row order follows the
/// authoritative table (score rank for metrics), with unmatched keys appended
/// in the order they were first seen for an outer join.
pub fn build_combined_view(
    inputs: &CombinedInputs<'_>,
    join: CombinedJoin,
    now: DateTime<Utc>,
) -> Vec<CombinedProjectView> {
    let metrics_by_key: HashMap<&str, &ProjectMetricsRow> = inputs
        .metrics
        .iter()
        .map(|row| (row.project_key.as_str(), row))
        .collect();
    let scores_by_key: HashMap<&str, &ActivityScore> = inputs
        .scores
        .iter()
        .map(|score| (score.project_key.as_str(), score))
        .collect();
    let trends_by_key: HashMap<&str, &TransactionWindowSummary> = inputs
        .trends
        .iter()
        .map(|trend| (trend.project_name.as_str(), trend))
        .collect();
    let mut grantees_by_key: HashMap<&str, &GranteeRecord> = HashMap::new();
    for grantee in inputs.grantees {
        grantees_by_key
            .entry(grantee.project_name.as_str())
            .or_insert(grantee);
    }

    let join = if join == CombinedJoin::GranteesLeft && inputs.grantees.is_empty() {
        log::warn!("grantee table is empty; combined view falls back to the metrics table");
        CombinedJoin::MetricsLeft
    } else {
        join
    };

    let score_keys = inputs.scores.iter().map(|s| s.project_key.as_str());
    let trend_keys = inputs.trends.iter().map(|t| t.project_name.as_str());
    let grantee_keys = inputs.grantees.iter().map(|g| g.project_name.as_str());

    let keys: Vec<&str> = match join {
        CombinedJoin::MetricsLeft => unique(score_keys),
        CombinedJoin::GranteesLeft => unique(grantee_keys),
        CombinedJoin::Outer => unique(score_keys.chain(trend_keys).chain(grantee_keys)),
    };

    let rows: Vec<CombinedProjectView> = keys
        .into_iter()
        .map(|key| {
            let metrics = metrics_by_key.get(key).copied();
            let score = scores_by_key.get(key).copied();
            let trend = trends_by_key.get(key).copied();
            let grantee = grantees_by_key.get(key).copied();

            let display_name = metrics
                .map(|m| m.display_name.clone())
                .or_else(|| score.map(|s| s.display_name.clone()))
                .or_else(|| grantee.map(|g| g.grantee.clone()))
                .unwrap_or_else(|| key.to_string());

            CombinedProjectView {
                project_key: key.to_string(),
                display_name,
                grantee: grantee.map(|g| g.grantee.clone()).into(),
                program: grantee.map(|g| g.program.clone()).into(),
                activity_score: score.map(|s| s.score).into(),
                days_since_last_commit: metrics
                    .map(|m| days_since_last_commit(&m.last_commit, now))
                    .unwrap_or(Cell::NoData),
                count_before: trend.map(|t| t.count_before).into(),
                count_after: trend.map(|t| t.count_after).into(),
                pct_change: trend.map(|t| t.pct_change).into(),
                direction: direction_of(trend),
            }
        })
        .collect();

    let unmatched = rows.iter().filter(|r| r.count_before.is_missing()).count();
    log::info!(
        "combined view has {} rows ({} join, {} without transaction data)",
        rows.len(),
        join.as_str(),
        unmatched
    );

    rows
}

fn direction_of(trend: Option<&TransactionWindowSummary>) -> CombinedDirection {
    match trend.map(|t| t.direction) {
        Some(TrendDirection::Increase) => CombinedDirection::Increase,
        Some(TrendDirection::Decrease) => CombinedDirection::Decrease,
        Some(TrendDirection::NoChange) => CombinedDirection::NoChange,
        None => CombinedDirection::UnknownInsufficientData,
    }
}

fn unique<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    keys.filter(|key| seen.insert(*key)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::activity::{score_projects, ScoringOptions};
    use crate::models::activity_score::{default_weights, DegeneratePolicy, ScoringMode};
    use crate::models::project::CommitTimestamp;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap()
    }

    fn metrics() -> Vec<ProjectMetricsRow> {
        vec![
            ProjectMetricsRow {
                commit_count: 120,
                merged_pr_count: 8,
                active_developer_count: 3,
                last_commit: CommitTimestamp::At(Utc.with_ymd_and_hms(2024, 7, 22, 0, 0, 0).unwrap()),
                ..ProjectMetricsRow::empty("alpha", "Alpha")
            },
            ProjectMetricsRow {
                commit_count: 4,
                merged_pr_count: 1,
                active_developer_count: 1,
                ..ProjectMetricsRow::empty("beta", "Beta")
            },
        ]
    }

    fn trend(name: &str, before: u64, after: u64) -> TransactionWindowSummary {
        TransactionWindowSummary {
            project_name: name.to_string(),
            count_before: before,
            count_after: after,
            pct_change: crate::analysis::trend::pct_change(before, after),
            dropped: after < before,
            direction: TrendDirection::between(before, after),
            senders_before: 0,
            senders_after: 0,
            identified_senders: 0,
            mean_passport_score: None,
        }
    }

    fn grantee(name: &str, label: &str) -> GranteeRecord {
        GranteeRecord {
            project_name: name.to_string(),
            grantee: label.to_string(),
            program: "Thank ARB".to_string(),
        }
    }

    fn scores(rows: &[ProjectMetricsRow]) -> Vec<ActivityScore> {
        let weights = default_weights();
        score_projects(
            rows,
            &ScoringOptions {
                mode: ScoringMode::Normalized,
                degenerate_policy: DegeneratePolicy::Zero,
                weights: &weights,
            },
        )
        .unwrap()
    }

    #[test]
    fn metrics_left_keeps_projects_without_transactions() {
        let metrics = metrics();
        let scores = scores(&metrics);
        let trends = vec![trend("alpha", 2, 6), trend("gamma", 1, 0)];
        let inputs = CombinedInputs {
            metrics: &metrics,
            scores: &scores,
            trends: &trends,
            grantees: &[],
        };

        let view = build_combined_view(&inputs, CombinedJoin::MetricsLeft, now());
        assert_eq!(view.len(), 2);

        let alpha = &view[0];
        assert_eq!(alpha.project_key, "alpha");
        assert_eq!(alpha.count_after, Cell::Value(6));
        assert_eq!(alpha.pct_change, Cell::Value(200.0));
        assert_eq!(alpha.direction, CombinedDirection::Increase);
        assert_eq!(alpha.days_since_last_commit, Cell::Value(10));
        assert_eq!(alpha.grantee, Cell::NoData);

        let beta = &view[1];
        assert_eq!(beta.count_before, Cell::NoData);
        assert_eq!(beta.pct_change, Cell::NoData);
        assert_eq!(beta.direction, CombinedDirection::UnknownInsufficientData);
        assert_eq!(beta.days_since_last_commit, Cell::NoData);
    }

    #[test]
    fn outer_join_appends_unmatched_projects() {
        let metrics = metrics();
        let scores = scores(&metrics);
        let trends = vec![trend("gamma", 3, 0)];
        let grantees = vec![grantee("delta", "Delta Labs")];
        let inputs = CombinedInputs {
            metrics: &metrics,
            scores: &scores,
            trends: &trends,
            grantees: &grantees,
        };

        let view = build_combined_view(&inputs, CombinedJoin::Outer, now());
        let keys: Vec<&str> = view.iter().map(|r| r.project_key.as_str()).collect();
        assert_eq!(keys, vec!["alpha", "beta", "gamma", "delta"]);

        let gamma = &view[2];
        assert_eq!(gamma.activity_score, Cell::NoData);
        assert_eq!(gamma.display_name, "gamma");
        assert_eq!(gamma.direction, CombinedDirection::Decrease);

        let delta = &view[3];
        assert_eq!(delta.display_name, "Delta Labs");
        assert_eq!(delta.program, Cell::Value("Thank ARB".to_string()));
        assert_eq!(delta.count_before, Cell::NoData);
    }

    #[test]
    fn grantees_left_uses_grantee_rows() {
        let metrics = metrics();
        let scores = scores(&metrics);
        let grantees = vec![grantee("beta", "Beta Collective"), grantee("omega", "Omega")];
        let inputs = CombinedInputs {
            metrics: &metrics,
            scores: &scores,
            trends: &[],
            grantees: &grantees,
        };

        let view = build_combined_view(&inputs, CombinedJoin::GranteesLeft, now());
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].display_name, "Beta");
        assert_eq!(view[0].grantee, Cell::Value("Beta Collective".to_string()));
        assert!(matches!(view[0].activity_score, Cell::Value(_)));
        assert_eq!(view[1].activity_score, Cell::NoData);
    }

    #[test]
    fn grantees_left_without_grantees_falls_back_to_metrics() {
        let metrics = metrics();
        let scores = scores(&metrics);
        let inputs = CombinedInputs {
            metrics: &metrics,
            scores: &scores,
            trends: &[],
            grantees: &[],
        };

        let view = build_combined_view(&inputs, CombinedJoin::GranteesLeft, now());
        assert_eq!(view.len(), 2);
    }
}
