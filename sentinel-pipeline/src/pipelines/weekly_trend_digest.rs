use async_trait::async_trait;
use std::sync::Arc;

use crate::candidate_pipeline::CandidatePipeline;
use crate::components::alert_summary_side_effect::AlertSummarySideEffect;
use crate::components::severity_floor_filter::SeverityFloorFilter;
use crate::components::severity_rank_selector::SeverityRankSelector;
use crate::components::trend_analytics_source::TrendAnalyticsSource;
use crate::filter::Filter;
use crate::selector::Selector;
use crate::side_effect::SideEffect;
use crate::source::Source;
use crate::types::{Alert, SalesRecord, TrendQuery};

/// The weekly sales trend digest.
///
/// Pipeline flow:
/// 1. TrendAnalyticsSource evaluates every product/store series
/// 2. SeverityFloorFilter drops alerts below the query's floor
/// 3. SeverityRankSelector ranks and optionally truncates
/// 4. AlertSummarySideEffect logs the digest summary
pub struct WeeklyTrendDigestPipeline {
    sources: Vec<Box<dyn Source<TrendQuery, Alert>>>,
    filters: Vec<Box<dyn Filter<TrendQuery, Alert>>>,
    selector: SeverityRankSelector,
    side_effects: Arc<Vec<Box<dyn SideEffect<TrendQuery, Alert>>>>,
}

impl WeeklyTrendDigestPipeline {
    /// Pipeline over `records` returning every alert.
    pub fn with_records(records: Vec<SalesRecord>) -> Self {
        Self::build(records, SeverityRankSelector::default())
    }

    /// Pipeline over `records` returning at most `limit` alerts.
    pub fn with_records_and_limit(records: Vec<SalesRecord>, limit: usize) -> Self {
        Self::build(records, SeverityRankSelector::top(limit))
    }

    fn build(records: Vec<SalesRecord>, selector: SeverityRankSelector) -> Self {
        let sources: Vec<Box<dyn Source<TrendQuery, Alert>>> =
            vec![Box::new(TrendAnalyticsSource::new(records))];

        let filters: Vec<Box<dyn Filter<TrendQuery, Alert>>> =
            vec![Box::new(SeverityFloorFilter)];

        let side_effects: Arc<Vec<Box<dyn SideEffect<TrendQuery, Alert>>>> =
            Arc::new(vec![Box::new(AlertSummarySideEffect)]);

        Self {
            sources,
            filters,
            selector,
            side_effects,
        }
    }
}

#[async_trait]
impl CandidatePipeline<TrendQuery, Alert> for WeeklyTrendDigestPipeline {
    fn sources(&self) -> &[Box<dyn Source<TrendQuery, Alert>>] {
        &self.sources
    }

    fn filters(&self) -> &[Box<dyn Filter<TrendQuery, Alert>>] {
        &self.filters
    }

    fn selector(&self) -> &dyn Selector<TrendQuery, Alert> {
        &self.selector
    }

    fn side_effects(&self) -> Arc<Vec<Box<dyn SideEffect<TrendQuery, Alert>>>> {
        Arc::clone(&self.side_effects)
    }
}
