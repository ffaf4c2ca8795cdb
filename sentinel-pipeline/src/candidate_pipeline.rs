use async_trait::async_trait;
use std::sync::Arc;

use crate::filter::{Filter, FilterResult};
use crate::selector::Selector;
use crate::side_effect::{SideEffect, SideEffectInput};
use crate::source::Source;

/// Queries carry a request id so every stage can tag its log lines.
pub trait HasRequestId {
    fn request_id(&self) -> &str;
}

/// Everything a pipeline run produced, stage by stage.
#[derive(Clone, Debug)]
pub struct PipelineResult<Q, C> {
    pub query: Arc<Q>,
    /// Candidates returned by all enabled sources, in source order.
    pub retrieved_candidates: Vec<C>,
    /// Candidates removed by filters.
    pub filtered_candidates: Vec<C>,
    pub selected_candidates: Vec<C>,
}

/// A staged candidate pipeline: sources, filters, one selector, side effects.
///
/// A failing source or filter is logged and skipped; the run always
/// produces a result. Side effects see the selection but cannot change it.
#[async_trait]
pub trait CandidatePipeline<Q, C>: Send + Sync
where
    Q: HasRequestId + Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    fn sources(&self) -> &[Box<dyn Source<Q, C>>];

    fn filters(&self) -> &[Box<dyn Filter<Q, C>>];

    fn selector(&self) -> &dyn Selector<Q, C>;

    fn side_effects(&self) -> Arc<Vec<Box<dyn SideEffect<Q, C>>>>;

    async fn execute(&self, query: Q) -> PipelineResult<Q, C> {
        let query = Arc::new(query);
        let request_id = query.request_id().to_string();

        let retrieved_candidates = self.fetch_candidates(&query).await;
        let (kept, filtered_candidates) = self
            .apply_filters(&query, retrieved_candidates.clone())
            .await;

        let selector = self.selector();
        let selected_candidates = if selector.enable(&query) {
            selector.select(&query, kept)
        } else {
            kept
        };

        log::debug!(
            "request_id={} retrieved={} filtered={} selected={}",
            request_id,
            retrieved_candidates.len(),
            filtered_candidates.len(),
            selected_candidates.len()
        );

        self.run_side_effects(Arc::new(SideEffectInput {
            query: Arc::clone(&query),
            selected_candidates: selected_candidates.clone(),
        }))
        .await;

        PipelineResult {
            query,
            retrieved_candidates,
            filtered_candidates,
            selected_candidates,
        }
    }

    async fn fetch_candidates(&self, query: &Q) -> Vec<C> {
        let mut candidates = Vec::new();
        for source in self.sources().iter().filter(|s| s.enable(query)) {
            match source.get_candidates(query).await {
                Ok(found) => candidates.extend(found),
                Err(err) => log::warn!(
                    "request_id={} source {} failed: {}",
                    query.request_id(),
                    source.name(),
                    err
                ),
            }
        }
        candidates
    }

    /// Run filters in order; returns (kept, removed).
    async fn apply_filters(&self, query: &Q, candidates: Vec<C>) -> (Vec<C>, Vec<C>) {
        let mut kept = candidates;
        let mut removed = Vec::new();
        for filter in self.filters().iter().filter(|f| f.enable(query)) {
            let backup = kept.clone();
            match filter.filter(query, kept).await {
                Ok(FilterResult {
                    kept: next,
                    removed: dropped,
                }) => {
                    kept = next;
                    removed.extend(dropped);
                }
                Err(err) => {
                    log::warn!(
                        "request_id={} filter {} failed: {}",
                        query.request_id(),
                        filter.name(),
                        err
                    );
                    kept = backup;
                }
            }
        }
        (kept, removed)
    }

    /// Side effects run in order after selection; failures are only logged.
    async fn run_side_effects(&self, input: Arc<SideEffectInput<Q, C>>) {
        let side_effects = self.side_effects();
        for side_effect in side_effects.iter() {
            if !side_effect.enable(Arc::clone(&input.query)) {
                continue;
            }
            if let Err(err) = side_effect.run(Arc::clone(&input)).await {
                log::warn!(
                    "request_id={} side effect {} failed: {}",
                    input.query.request_id(),
                    side_effect.name(),
                    err
                );
            }
        }
    }
}
