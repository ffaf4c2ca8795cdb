//! Alert classification from window metrics.
//!
//! Seven independent threshold rules are evaluated in a fixed order against
//! the same metrics. Every rule that fires appends one reason and escalates
//! the severity towards its target; severity never moves down, so a later
//! warning-tier rule cannot soften an earlier critical one.
//!
//! | # | Rule | Target |
//! |---|------|--------|
//! | 1 | declining units trend on meaningful volume | Warning |
//! | 2 | year-over-year units drop | Critical |
//! | 3 | consecutive weeks of decline | Warning |
//! | 4 | high return rate | Warning |
//! | 5 | rising returns trend | Warning |
//! | 6 | week-over-week units drop on meaningful volume | Warning |
//! | 7 | same-week year-over-year drop on meaningful volume | Warning |

use sentinel_stats::thresholds::MIN_RETURNS_FOR_TREND;

use crate::config::ThresholdConfig;
use crate::series::{build_windows, SeriesGroup, SeriesWindows};
use crate::types::{Alert, Severity};
use crate::window_metrics::{compute_window_metrics, WindowMetrics};

/// Severity and reasons accumulated by the rules for one window.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleOutcome {
    pub severity: Severity,
    pub reasons: Vec<String>,
}

impl RuleOutcome {
    fn fire(&mut self, target: Severity, reason: String) {
        self.severity.escalate(target);
        self.reasons.push(reason);
    }

    pub fn fired(&self) -> bool {
        !self.reasons.is_empty()
    }
}

/// What one product/store series produced.
#[derive(Clone, Debug)]
pub enum GroupOutcome {
    /// Too few weeks to fill the window.
    Skipped,
    /// Analyzed, no rule fired.
    Quiet,
    Alert(Alert),
}

/// Run every rule against `metrics`.
pub fn evaluate_rules(metrics: &WindowMetrics, config: &ThresholdConfig) -> RuleOutcome {
    let mut outcome = RuleOutcome::default();
    let current = &metrics.current;
    let has_volume = current.avg_units_per_week >= config.min_volume;

    // --- Declining trend ---
    if current.units_trend_per_week < config.slope_floor && has_volume {
        outcome.fire(
            Severity::Warning,
            format!(
                "Declining sales trend ({} per week)",
                percent(current.units_trend_per_week, 2)
            ),
        );
    }

    // --- Year-over-year drop ---
    if metrics.yoy.data_available && metrics.yoy.units_change < config.yoy_drop_floor {
        outcome.fire(
            Severity::Critical,
            format!("YoY drop of {} in units", percent(metrics.yoy.units_change, 1)),
        );
    }

    // --- Consecutive weeks down ---
    if metrics.weeks_down {
        outcome.fire(
            Severity::Warning,
            format!("{}+ consecutive weeks declining", config.min_weeks_down),
        );
    }

    // --- High return rate ---
    if current.return_rate > config.return_ratio_ceiling {
        outcome.fire(
            Severity::Warning,
            format!("High return rate ({})", percent(current.return_rate, 1)),
        );
    }

    // --- Rising returns ---
    if current.returns_trend_per_week > config.returns_slope_ceiling
        && current.total_returns > MIN_RETURNS_FOR_TREND
    {
        outcome.fire(
            Severity::Warning,
            format!(
                "Returns trending up ({} per week)",
                percent(current.returns_trend_per_week, 2)
            ),
        );
    }

    // --- Week-over-week drop ---
    if let Some(wow) = metrics.point.wow_units_change {
        if wow < config.wow_drop_floor && has_volume {
            outcome.fire(
                Severity::Warning,
                format!("WoW drop of {} in units", percent(wow, 1)),
            );
        }
    }

    // --- Same-week year-over-year drop ---
    if let Some(same_week) = metrics.point.yoy_same_week_units_change {
        if same_week < config.yoy_same_week_drop_floor && has_volume {
            outcome.fire(
                Severity::Warning,
                format!("Same-week YoY drop of {} in units", percent(same_week, 1)),
            );
        }
    }

    outcome
}

/// Build windows, compute metrics and classify one series.
pub fn classify_group(group: &SeriesGroup<'_>, config: &ThresholdConfig) -> GroupOutcome {
    let (window, prior_year) = match build_windows(group, config.window_weeks) {
        SeriesWindows::Ready { window, prior_year } => (window, prior_year),
        SeriesWindows::InsufficientData { available, required } => {
            log::debug!(
                "skipping {}|{}: {} of {} weeks",
                group.product_id,
                group.store_code,
                available,
                required
            );
            return GroupOutcome::Skipped;
        }
    };

    let metrics = compute_window_metrics(&window, &prior_year, config);
    let outcome = evaluate_rules(&metrics, config);
    if !outcome.fired() {
        return GroupOutcome::Quiet;
    }

    // Display fields come from the oldest week of the window.
    let (title, brand) = window
        .first()
        .map(|r| (r.title.clone(), r.brand.clone()))
        .unwrap_or_default();

    GroupOutcome::Alert(Alert {
        product_id: group.product_id.to_string(),
        title,
        brand,
        store_code: group.store_code.to_string(),
        severity: outcome.severity,
        reasons: outcome.reasons,
        current_window: metrics.current,
        yoy_comparison: metrics.yoy,
        point_comparison: metrics.point,
        weekly_detail: metrics.weekly_detail,
    })
}

/// Render a fraction as a signed percentage, e.g. `-0.0706` -> `-7.06%`.
fn percent(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value * 100.0)
}
