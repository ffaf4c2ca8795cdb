//! Weekly sales trend detection and alerting.
//!
//! Records are grouped per (product, store), the trailing window of each
//! series is compared against its own trend and the same weeks a year
//! earlier, and a fixed rule set turns the metrics into ranked alerts.
//! [`analyze`] is the synchronous entry point; the candidate pipeline in
//! [`pipelines`] wraps the same engine for digest-style requests.

pub mod alert_rules;
pub mod analysis;
pub mod candidate_pipeline;
pub mod components;
pub mod config;
pub mod error;
pub mod filter;
pub mod pipelines;
pub mod ranking;
pub mod record_loader;
pub mod selector;
pub mod series;
pub mod side_effect;
pub mod source;
pub mod types;
pub mod util;
pub mod window_metrics;

pub use analysis::analyze;
pub use config::ThresholdConfig;
pub use error::{ConfigError, LoadError};
pub use types::{Alert, SalesRecord, Severity};
