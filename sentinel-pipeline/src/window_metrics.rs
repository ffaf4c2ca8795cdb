//! Metrics over a trailing window and its prior-year counterpart.
//!
//! Every ratio is guarded: a zero denominator yields 0.0 or `None`,
//! never a NaN or infinity.

use sentinel_stats::{has_descending_run, mean, normalized_slope, ratio, relative_change};

use crate::config::ThresholdConfig;
use crate::types::{CurrentWindow, PointComparison, SalesRecord, WeeklyDetail, YoyComparison};

/// Which figure a year-over-year comparison sums.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    Units,
    Revenue,
}

impl Metric {
    fn value(self, record: &SalesRecord) -> f64 {
        match self {
            Metric::Units => record.units as f64,
            Metric::Revenue => record.revenue,
        }
    }
}

/// Everything the rule engine reads for one window.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WindowMetrics {
    pub current: CurrentWindow,
    pub yoy: YoyComparison,
    pub point: PointComparison,
    pub weeks_down: bool,
    pub weekly_detail: Vec<WeeklyDetail>,
}

/// Compute all window metrics under `config`.
pub fn compute_window_metrics(
    window: &[&SalesRecord],
    prior_year: &[&SalesRecord],
    config: &ThresholdConfig,
) -> WindowMetrics {
    let units: Vec<f64> = window.iter().map(|r| r.units as f64).collect();
    let returns: Vec<f64> = window.iter().map(|r| r.returns as f64).collect();

    let total_units = saturating_total(window, |r| r.units);
    let total_returns = saturating_total(window, |r| r.returns);
    let total_revenue: f64 = window.iter().map(|r| r.revenue).sum();

    let first = window.first();
    let last = window.last();

    let current = CurrentWindow {
        avg_units_per_week: mean(&units),
        total_units,
        total_revenue,
        total_returns,
        return_rate: return_rate(window),
        units_trend_per_week: normalized_slope(&units),
        returns_trend_per_week: normalized_slope(&returns),
        window_weeks: window.len(),
        start_week: first.map(|r| r.fiscal_week_label.clone()).unwrap_or_default(),
        end_week: last.map(|r| r.fiscal_week_label.clone()).unwrap_or_default(),
        start_date: first.map(|r| r.week_start_label.clone()).unwrap_or_default(),
        end_date: last.map(|r| r.week_start_label.clone()).unwrap_or_default(),
    };

    let yoy = if prior_year.len() >= config.min_prior_year_weeks() {
        YoyComparison {
            units_change: yoy_change(window, prior_year, Metric::Units),
            revenue_change: yoy_change(window, prior_year, Metric::Revenue),
            data_available: true,
        }
    } else {
        YoyComparison::default()
    };

    let same_week = yoy_same_week_change(window, prior_year);
    let point = PointComparison {
        wow_units_change: wow_change(window),
        yoy_same_week_units_change: same_week,
        yoy_same_week_data_available: same_week.is_some(),
    };

    WindowMetrics {
        current,
        yoy,
        point,
        weeks_down: consecutive_weeks_down(window, config.min_weeks_down),
        weekly_detail: window.iter().map(|r| WeeklyDetail::from(*r)).collect(),
    }
}

/// Relative change of `metric` summed over `current` against `prior`.
///
/// Zero prior total means no comparable baseline and yields 0.0.
pub fn yoy_change(current: &[&SalesRecord], prior: &[&SalesRecord], metric: Metric) -> f64 {
    let current_total: f64 = current.iter().map(|r| metric.value(r)).sum();
    let prior_total: f64 = prior.iter().map(|r| metric.value(r)).sum();
    relative_change(current_total, prior_total)
}

/// Returns over units for the window; 0.0 with no units. Not clamped to 1.0.
pub fn return_rate(window: &[&SalesRecord]) -> f64 {
    let units = saturating_total(window, |r| r.units);
    let returns = saturating_total(window, |r| r.returns);
    ratio(returns as f64, units as f64).unwrap_or(0.0)
}

/// Sum a count over the window, pinned at `u64::MAX` instead of overflowing.
fn saturating_total(window: &[&SalesRecord], count: impl Fn(&SalesRecord) -> u64) -> u64 {
    window
        .iter()
        .map(|r| count(*r))
        .fold(0u64, u64::saturating_add)
}

/// True if the window's units decline strictly for `min_weeks` weeks in a row.
pub fn consecutive_weeks_down(window: &[&SalesRecord], min_weeks: usize) -> bool {
    let units: Vec<u64> = window.iter().map(|r| r.units).collect();
    has_descending_run(&units, min_weeks)
}

/// Units change of the last week against the one before it.
pub fn wow_change(window: &[&SalesRecord]) -> Option<f64> {
    match window {
        [.., previous, last] => {
            ratio(last.units as f64 - previous.units as f64, previous.units as f64)
        }
        _ => None,
    }
}

/// Units change of the last week against the same ISO week a year earlier.
///
/// Uses the first prior-year record with a matching week number; `None`
/// when there is none or it sold nothing.
pub fn yoy_same_week_change(window: &[&SalesRecord], prior: &[&SalesRecord]) -> Option<f64> {
    let last = window.last()?;
    let week = last.iso_week_number();
    let matched = prior.iter().find(|r| r.iso_week_number() == week)?;
    if matched.units == 0 {
        return None;
    }
    Some(relative_change(last.units as f64, matched.units as f64))
}
