use async_trait::async_trait;
use std::sync::Arc;

use crate::util;

/// The query and the ranked selection handed to side effects.
#[derive(Clone)]
pub struct SideEffectInput<Q, C> {
    pub query: Arc<Q>,
    pub selected_candidates: Vec<C>,
}

/// Reacts to a finished digest, e.g. logging its alert counts. Side effects
/// run in order after selection and cannot change the result.
#[async_trait]
pub trait SideEffect<Q, C>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    /// Whether this side effect runs for the query.
    fn enable(&self, _query: Arc<Q>) -> bool {
        true
    }

    /// React to the selected candidates.
    async fn run(&self, input: Arc<SideEffectInput<Q, C>>) -> Result<(), String>;

    /// Short type name used in stage-failure log lines.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
