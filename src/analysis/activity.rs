use crate::analysis::normalization::{log1p, min_max};
use crate::error::{ReportError, ReportResult};
use crate::models::activity_score::*;
use crate::models::project::ProjectMetricsRow;
use std::collections::HashMap;

pub struct ScoringOptions<'a> {
    pub mode: ScoringMode,
    pub degenerate_policy: DegeneratePolicy,
    pub weights: &'a HashMap<String, f64>,
}

/// Compute the Development Activity Index for every project.
///
/// Normalized mode (canonical):
///   100 * (w_c * norm(log1p(commits)) + w_p * norm(merged_prs) + w_d * norm(active_devs))
/// where `norm` is min-max over the whole batch, so every row depends on every other row.
///
/// Legacy mode is the plain weighted sum of raw counts.
///
/// Output is sorted by score descending; equal scores keep their input order.
pub fn score_projects(
    rows: &[ProjectMetricsRow],
    options: &ScoringOptions<'_>,
) -> ReportResult<Vec<ActivityScore>> {
    if rows.is_empty() {
        return Err(ReportError::empty_input("project metrics table has no rows"));
    }

    let commits: Vec<f64> = rows.iter().map(|r| r.commit_count as f64).collect();
    let merged_prs: Vec<f64> = rows.iter().map(|r| r.merged_pr_count as f64).collect();
    let active_devs: Vec<f64> = rows.iter().map(|r| r.active_developer_count as f64).collect();

    let commits_transformed: Vec<f64> = match options.mode {
        ScoringMode::Normalized => commits.iter().copied().map(log1p).collect(),
        ScoringMode::Legacy => commits.clone(),
    };

    let (commits_norm, prs_norm, devs_norm, scale) = match options.mode {
        ScoringMode::Normalized => (
            normalize_metric(COMMITS, &commits_transformed, options.degenerate_policy)?,
            normalize_metric(MERGED_PRS, &merged_prs, options.degenerate_policy)?,
            normalize_metric(ACTIVE_DEVELOPERS, &active_devs, options.degenerate_policy)?,
            100.0,
        ),
        ScoringMode::Legacy => (
            commits_transformed.clone(),
            merged_prs.clone(),
            active_devs.clone(),
            1.0,
        ),
    };

    let w = options.weights;
    let commit_weight = *w.get(COMMITS).unwrap_or(&0.5);
    let pr_weight = *w.get(MERGED_PRS).unwrap_or(&0.3);
    let dev_weight = *w.get(ACTIVE_DEVELOPERS).unwrap_or(&0.2);

    let mut scores: Vec<ActivityScore> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let components = ScoreComponents {
                commits: component(commits[i], commits_transformed[i], commits_norm[i], commit_weight, scale),
                merged_prs: component(merged_prs[i], merged_prs[i], prs_norm[i], pr_weight, scale),
                active_developers: component(active_devs[i], active_devs[i], devs_norm[i], dev_weight, scale),
            };

            let mut score = components.commits.contribution
                + components.merged_prs.contribution
                + components.active_developers.contribution;
            if options.mode == ScoringMode::Normalized {
                score = score.clamp(0.0, 100.0);
            }

            let efficiency_ratio =
                match efficiency_ratio(&row.project_key, score, row.active_developer_count) {
                    Ok(ratio) => Some(ratio),
                    Err(err) => {
                        log::debug!("{err}");
                        None
                    }
                };

            ActivityScore {
                project_key: row.project_key.clone(),
                display_name: row.display_name.clone(),
                rank: 0,
                mode: options.mode,
                score,
                components,
                efficiency_ratio,
            }
        })
        .collect();

    // `sort_by` is stable, which is what keeps tied projects in input order.
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
    for (index, score) in scores.iter_mut().enumerate() {
        score.rank = index + 1;
    }

    log::info!(
        "scored {} projects in {} mode",
        scores.len(),
        options.mode.as_str()
    );

    Ok(scores)
}

/// Activity score per active developer.
pub fn efficiency_ratio(project: &str, score: f64, active_developers: u64) -> ReportResult<f64> {
    if active_developers == 0 {
        return Err(ReportError::undefined_ratio(project));
    }
    Ok(score / active_developers as f64)
}

fn normalize_metric(metric: &str, values: &[f64], policy: DegeneratePolicy) -> ReportResult<Vec<f64>> {
    match min_max(metric, values) {
        Ok(normalized) => Ok(normalized),
        Err(ReportError::DegenerateInput { .. }) if policy == DegeneratePolicy::Zero => {
            log::warn!("`{metric}` is tied across all {} projects; using 0 for every project", values.len());
            Ok(vec![0.0; values.len()])
        }
        Err(err) => Err(err),
    }
}

fn component(input: f64, transformed: f64, normalized: f64, weight: f64, scale: f64) -> ComponentScore {
    ComponentScore {
        input,
        transformed,
        normalized,
        weight,
        contribution: normalized * weight * scale,
    }
}
