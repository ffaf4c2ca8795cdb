use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::candidate_pipeline::HasRequestId;
use crate::config::ThresholdConfig;

// ---------------------------------------------------------------------------
// Input records
// ---------------------------------------------------------------------------

/// One weekly sales observation for one product at one store.
#[derive(Clone, Debug, PartialEq)]
pub struct SalesRecord {
    pub product_id: String,
    pub store_code: String,
    pub title: String,
    pub brand: String,
    pub revenue: f64,
    /// Carried for display; the engine never reads it.
    pub cogs: f64,
    pub units: u64,
    /// May exceed `units`; not validated.
    pub returns: u64,
    /// Canonical temporal key. Unparseable inputs hold the 2000-01-01 sentinel.
    pub week_start: NaiveDate,
    /// The week start exactly as received.
    pub week_start_label: String,
    pub fiscal_week_label: String,
}

impl SalesRecord {
    /// ISO week-numbering year of `week_start`.
    pub fn iso_year(&self) -> i32 {
        self.week_start.iso_week().year()
    }

    /// ISO week number (1..=53) of `week_start`.
    pub fn iso_week_number(&self) -> u32 {
        self.week_start.iso_week().week()
    }
}

impl Default for SalesRecord {
    fn default() -> Self {
        Self {
            product_id: String::new(),
            store_code: String::new(),
            title: String::new(),
            brand: String::new(),
            revenue: 0.0,
            cogs: 0.0,
            units: 0,
            returns: 0,
            week_start: crate::record_loader::sentinel_week_start(),
            week_start_label: String::new(),
            fiscal_week_label: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// A request to run the weekly trend digest.
///
/// Each query carries its own threshold snapshot, so concurrent digests
/// with different thresholds never observe each other.
#[derive(Clone, Debug)]
pub struct TrendQuery {
    pub request_id: String,
    /// Store codes to analyze; empty means every store in the data.
    pub store_codes: Vec<String>,
    /// Alerts below this severity are filtered out of the digest.
    pub min_severity: Severity,
    pub thresholds: ThresholdConfig,
}

impl TrendQuery {
    pub fn new(request_id: impl Into<String>, thresholds: ThresholdConfig) -> Self {
        Self {
            request_id: request_id.into(),
            store_codes: Vec::new(),
            min_severity: Severity::Warning,
            thresholds,
        }
    }

    /// Whether `store_code` falls inside this query's store scope.
    pub fn includes_store(&self, store_code: &str) -> bool {
        self.store_codes.is_empty() || self.store_codes.iter().any(|s| s == store_code)
    }
}

impl HasRequestId for TrendQuery {
    fn request_id(&self) -> &str {
        &self.request_id
    }
}

// ---------------------------------------------------------------------------
// Alert types
// ---------------------------------------------------------------------------

/// Ordered alert severity. Escalation only ever moves up this order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// Raise `self` to `target` if `target` is more severe; never lowers it.
    pub fn escalate(&mut self, target: Severity) {
        *self = (*self).max(target);
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            other => Err(format!(
                "invalid severity '{other}', expected one of: info, warning, critical"
            )),
        }
    }
}

/// Aggregates over the current trailing window.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWindow {
    pub avg_units_per_week: f64,
    pub total_units: u64,
    pub total_revenue: f64,
    pub total_returns: u64,
    pub return_rate: f64,
    /// Normalized units slope (fraction of the mean per week).
    pub units_trend_per_week: f64,
    /// Normalized returns slope (fraction of the mean per week).
    pub returns_trend_per_week: f64,
    pub window_weeks: usize,
    pub start_week: String,
    pub end_week: String,
    pub start_date: String,
    pub end_date: String,
}

/// Window totals against the same ISO weeks one year earlier.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YoyComparison {
    pub units_change: f64,
    pub revenue_change: f64,
    pub data_available: bool,
}

/// Single-week comparisons anchored on the most recent week.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointComparison {
    pub wow_units_change: Option<f64>,
    pub yoy_same_week_units_change: Option<f64>,
    pub yoy_same_week_data_available: bool,
}

/// Raw figures for one week of the window.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyDetail {
    pub week: String,
    pub date: String,
    pub units: u64,
    pub revenue: f64,
    pub returns: u64,
}

impl From<&SalesRecord> for WeeklyDetail {
    fn from(record: &SalesRecord) -> Self {
        Self {
            week: record.fiscal_week_label.clone(),
            date: record.week_start_label.clone(),
            units: record.units,
            revenue: record.revenue,
            returns: record.returns,
        }
    }
}

/// Outcome for one product/store whose recent window tripped at least one rule.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub product_id: String,
    pub title: String,
    pub brand: String,
    pub store_code: String,
    pub severity: Severity,
    /// One entry per fired rule, in rule order.
    pub reasons: Vec<String>,
    pub current_window: CurrentWindow,
    pub yoy_comparison: YoyComparison,
    pub point_comparison: PointComparison,
    pub weekly_detail: Vec<WeeklyDetail>,
}
