use crate::error::{ReportError, ReportResult};

/// Compress a heavy-tailed count: ln(1 + x)
pub fn log1p(value: f64) -> f64 {
    value.ln_1p()
}

/// Min-max normalize a batch to [0, 1].
/// Fails with `DegenerateInput` when every value is equal (including a batch of one).
pub fn min_max(metric: &str, values: &[f64]) -> ReportResult<Vec<f64>> {
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if !range.is_finite() || range <= 0.0 {
        return Err(ReportError::degenerate(metric));
    }

    Ok(values.iter().map(|v| (v - min) / range).collect())
}
