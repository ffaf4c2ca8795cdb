use async_trait::async_trait;

use crate::util;

/// Sources produce the initial candidates, e.g. trend alerts computed from
/// the loaded sales weeks. Output from every enabled source is concatenated
/// in source order before filtering.
#[async_trait]
pub trait Source<Q, C>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    /// Whether this source runs for the query.
    fn enable(&self, _query: &Q) -> bool {
        true
    }

    /// Produce candidates for the query. An `Err` is logged under the
    /// query's request id and the run continues without this source.
    async fn get_candidates(&self, query: &Q) -> Result<Vec<C>, String>;

    /// Short type name used in stage-failure log lines.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
