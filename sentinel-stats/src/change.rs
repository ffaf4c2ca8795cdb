//! Guarded ratios used for period-over-period comparisons.

/// Relative change from `baseline` to `current`: `(current - baseline) / baseline`.
///
/// A zero baseline means "no comparable baseline" and yields 0.0, not infinity.
pub fn relative_change(current: f64, baseline: f64) -> f64 {
    if baseline == 0.0 {
        return 0.0;
    }
    (current - baseline) / baseline
}

/// `numerator / denominator`, or `None` when the denominator is zero.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}
