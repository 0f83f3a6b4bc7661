use crate::models::activity_score::ActivityScore;
use crate::models::project::ProjectMetricsRow;
use crate::models::report::Highlights;

/// Display names of the first `limit` projects. Expects scores already ranked.
pub fn top_performers(scores: &[ActivityScore], limit: usize) -> Vec<String> {
    scores
        .iter()
        .take(limit)
        .map(|s| s.display_name.clone())
        .collect()
}

/// Projects that gained new contributors, most first.
pub fn emerging_projects(rows: &[ProjectMetricsRow], limit: usize) -> Vec<String> {
    let mut emerging: Vec<&ProjectMetricsRow> =
        rows.iter().filter(|r| r.new_contributor_count > 0).collect();
    emerging.sort_by(|a, b| b.new_contributor_count.cmp(&a.new_contributor_count));
    emerging
        .into_iter()
        .take(limit)
        .map(|r| r.display_name.clone())
        .collect()
}

pub fn build_highlights(scores: &[ActivityScore], rows: &[ProjectMetricsRow], limit: usize) -> Highlights {
    Highlights {
        top_performers: top_performers(scores, limit),
        emerging_projects: emerging_projects(rows, limit),
    }
}
