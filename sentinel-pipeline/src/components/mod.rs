pub mod alert_summary_side_effect;
pub mod severity_floor_filter;
pub mod severity_rank_selector;
pub mod trend_analytics_source;
