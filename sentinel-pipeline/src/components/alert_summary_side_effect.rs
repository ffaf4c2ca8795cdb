use async_trait::async_trait;
use std::sync::Arc;

use crate::side_effect::{SideEffect, SideEffectInput};
use crate::types::{Alert, Severity, TrendQuery};

/// Logs a one-line summary of the selected alerts.
pub struct AlertSummarySideEffect;

#[async_trait]
impl SideEffect<TrendQuery, Alert> for AlertSummarySideEffect {
    async fn run(&self, input: Arc<SideEffectInput<TrendQuery, Alert>>) -> Result<(), String> {
        let alerts = &input.selected_candidates;
        let critical = alerts
            .iter()
            .filter(|a| a.severity == Severity::Critical)
            .count();
        log::info!(
            "request_id={} digest ready: {} alerts ({} critical, {} warning)",
            input.query.request_id,
            alerts.len(),
            critical,
            alerts.len() - critical
        );
        Ok(())
    }
}
