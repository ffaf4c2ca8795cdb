//! The trend analysis entry point.
//!
//! Groups are independent, so they are classified on the rayon pool.
//! `collect` keeps group order, which makes the ranked output identical to
//! a sequential run.

use rayon::prelude::*;

use crate::alert_rules::{classify_group, GroupOutcome};
use crate::config::ThresholdConfig;
use crate::ranking::rank_alerts;
use crate::series::group_series;
use crate::types::{Alert, SalesRecord};

/// Unranked alerts plus group bookkeeping for one analysis pass.
#[derive(Clone, Debug, Default)]
pub struct AnalysisReport {
    /// Alerts in group encounter order.
    pub alerts: Vec<Alert>,
    pub groups_analyzed: usize,
    /// Groups with fewer weeks than the window.
    pub groups_skipped: usize,
}

/// Classify every (product, store) series in `records` without ranking.
pub fn evaluate_groups<'a, I>(records: I, config: &ThresholdConfig) -> AnalysisReport
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let groups = group_series(records);
    let outcomes: Vec<GroupOutcome> = groups
        .par_iter()
        .map(|group| classify_group(group, config))
        .collect();

    let mut report = AnalysisReport::default();
    for outcome in outcomes {
        match outcome {
            GroupOutcome::Skipped => report.groups_skipped += 1,
            GroupOutcome::Quiet => report.groups_analyzed += 1,
            GroupOutcome::Alert(alert) => {
                report.groups_analyzed += 1;
                report.alerts.push(alert);
            }
        }
    }
    report
}

/// Count groups that fill a `window_weeks` window and those that do not,
/// without running any rules.
pub fn group_stats<'a, I>(records: I, window_weeks: usize) -> (usize, usize)
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let required = window_weeks.max(1);
    group_series(records)
        .iter()
        .fold((0, 0), |(analyzed, skipped), group| {
            if group.records.len() >= required {
                (analyzed + 1, skipped)
            } else {
                (analyzed, skipped + 1)
            }
        })
}

/// Analyze a batch of records and return the ranked alerts.
pub fn analyze(records: &[SalesRecord], config: &ThresholdConfig) -> Vec<Alert> {
    let mut alerts = evaluate_groups(records, config).alerts;
    rank_alerts(&mut alerts);
    alerts
}
