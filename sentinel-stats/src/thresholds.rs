//! Default alerting thresholds for weekly sales trend detection.
//!
//! These are the calibrated defaults; every value can be overridden per
//! analysis through the pipeline's `ThresholdConfig`.

/// Normalized units slope below which a declining trend is flagged (-5%/week).
pub const SLOPE_FLOOR: f64 = -0.05;

/// Minimum average units per week for volume-sensitive rules.
pub const MIN_VOLUME: f64 = 30.0;

/// Year-over-year units change below which the alert is critical.
pub const YOY_DROP_FLOOR: f64 = -0.15;

/// Weeks of unbroken decline needed to flag a consecutive drop.
pub const MIN_WEEKS_DOWN: usize = 3;

/// Return rate above which returns are flagged.
pub const RETURN_RATIO_CEILING: f64 = 0.08;

/// Normalized returns slope above which rising returns are flagged.
pub const RETURNS_SLOPE_CEILING: f64 = 0.05;

/// Week-over-week units change below which a sudden drop is flagged.
pub const WOW_DROP_FLOOR: f64 = -0.12;

/// Same-ISO-week year-over-year units change below which a drop is flagged.
pub const YOY_SAME_WEEK_DROP_FLOOR: f64 = -0.15;

/// Trailing window length in weeks.
pub const WINDOW_WEEKS: usize = 4;

/// Returns in the window must exceed this before the returns trend counts.
pub const MIN_RETURNS_FOR_TREND: u64 = 5;

/// Absolute floor on prior-year weeks required for a YoY comparison.
pub const MIN_PRIOR_YEAR_WEEKS: usize = 3;
