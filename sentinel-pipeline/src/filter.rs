use async_trait::async_trait;

use crate::util;

/// One filter pass: candidates that continue and candidates dropped.
pub struct FilterResult<C> {
    pub kept: Vec<C>,
    pub removed: Vec<C>,
}

/// Filters drop candidates the request does not want, such as alerts under
/// its severity floor. They run in order, each seeing only what the
/// previous one kept.
#[async_trait]
pub trait Filter<Q, C>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    /// Whether this filter runs for the query.
    fn enable(&self, _query: &Q) -> bool {
        true
    }

    /// Partition candidates. Kept ones move on to the selector; removed ones
    /// are reported in `PipelineResult::filtered_candidates`. On `Err` the
    /// input passes through unchanged.
    async fn filter(&self, query: &Q, candidates: Vec<C>) -> Result<FilterResult<C>, String>;

    /// Short type name used in stage-failure log lines.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
