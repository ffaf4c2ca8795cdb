use async_trait::async_trait;

use crate::analysis::evaluate_groups;
use crate::source::Source;
use crate::types::{Alert, SalesRecord, TrendQuery};

/// Source that turns loaded weekly sales into trend alerts.
///
/// Records outside the query's store scope are ignored. Alerts come out
/// in group encounter order; ranking is the selector's job.
pub struct TrendAnalyticsSource {
    records: Vec<SalesRecord>,
}

impl TrendAnalyticsSource {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }
}

#[async_trait]
impl Source<TrendQuery, Alert> for TrendAnalyticsSource {
    fn enable(&self, _query: &TrendQuery) -> bool {
        !self.records.is_empty()
    }

    async fn get_candidates(&self, query: &TrendQuery) -> Result<Vec<Alert>, String> {
        query
            .thresholds
            .validate()
            .map_err(|e| e.to_string())?;

        let scoped = self
            .records
            .iter()
            .filter(|r| query.includes_store(&r.store_code));
        let report = evaluate_groups(scoped, &query.thresholds);

        log::info!(
            "request_id={} analyzed {} groups ({} skipped), {} alerts",
            query.request_id,
            report.groups_analyzed,
            report.groups_skipped,
            report.alerts.len()
        );
        Ok(report.alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThresholdConfig;
    use chrono::{Duration, NaiveDate};

    fn declining(product: &str, store: &str) -> Vec<SalesRecord> {
        let start = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
        [100u64, 90, 80, 70]
            .iter()
            .enumerate()
            .map(|(i, &units)| SalesRecord {
                product_id: product.into(),
                store_code: store.into(),
                units,
                week_start: start + Duration::weeks(i as i64),
                ..SalesRecord::default()
            })
            .collect()
    }

    fn sample_records() -> Vec<SalesRecord> {
        let mut records = declining("B0A", "IT");
        records.extend(declining("B0B", "DE"));
        records
    }

    #[tokio::test]
    async fn source_produces_alerts_for_all_stores() {
        let source = TrendAnalyticsSource::new(sample_records());
        let query = TrendQuery::new("test-001", ThresholdConfig::default());
        let alerts = source.get_candidates(&query).await.unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].product_id, "B0A");
    }

    #[tokio::test]
    async fn source_respects_store_scope() {
        let source = TrendAnalyticsSource::new(sample_records());
        let mut query = TrendQuery::new("test-002", ThresholdConfig::default());
        query.store_codes = vec!["DE".into()];
        let alerts = source.get_candidates(&query).await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert!(alerts.iter().all(|a| a.store_code == "DE"));
    }

    #[tokio::test]
    async fn source_rejects_invalid_thresholds() {
        let source = TrendAnalyticsSource::new(sample_records());
        let mut thresholds = ThresholdConfig::default();
        thresholds.window_weeks = 0;
        let query = TrendQuery::new("test-003", thresholds);
        assert!(source.get_candidates(&query).await.is_err());
    }

    #[test]
    fn source_disabled_for_empty_data() {
        let source = TrendAnalyticsSource::new(vec![]);
        let query = TrendQuery::new("test-004", ThresholdConfig::default());
        assert!(!source.enable(&query));
    }
}
