use async_trait::async_trait;

use crate::filter::{Filter, FilterResult};
use crate::types::{Alert, TrendQuery};

/// Removes alerts below the query's minimum severity.
///
/// A floor of `Info` or `Warning` keeps everything the rules emit.
pub struct SeverityFloorFilter;

#[async_trait]
impl Filter<TrendQuery, Alert> for SeverityFloorFilter {
    async fn filter(
        &self,
        query: &TrendQuery,
        candidates: Vec<Alert>,
    ) -> Result<FilterResult<Alert>, String> {
        let (kept, removed): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|a| a.severity >= query.min_severity);

        Ok(FilterResult { kept, removed })
    }
}
