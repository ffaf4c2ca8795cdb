//! Deterministic alert ordering.

use std::cmp::Ordering;

use crate::types::{Alert, Severity};

/// Sort rank for a severity; lower sorts first.
pub fn severity_rank(severity: Severity) -> u8 {
    match severity {
        Severity::Critical => 0,
        Severity::Warning => 1,
        // Never emitted as a final severity, ranked last if it ever is.
        Severity::Info => 3,
    }
}

/// Severity first, then the YoY units change ascending (worst drops first).
///
/// NaN changes sort after every finite value.
pub fn compare_alerts(a: &Alert, b: &Alert) -> Ordering {
    severity_rank(a.severity)
        .cmp(&severity_rank(b.severity))
        .then_with(|| {
            let (ya, yb) = (a.yoy_comparison.units_change, b.yoy_comparison.units_change);
            match (ya.is_nan(), yb.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => ya.partial_cmp(&yb).unwrap_or(Ordering::Equal),
            }
        })
}

/// Stable in-place ranking; ties keep their encounter order.
pub fn rank_alerts(alerts: &mut [Alert]) {
    alerts.sort_by(compare_alerts);
}
