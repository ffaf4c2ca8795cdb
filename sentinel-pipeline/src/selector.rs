use std::cmp::Ordering;

use crate::util;

/// Selectors order the surviving candidates and optionally truncate them.
pub trait Selector<Q, C>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    /// Default selection: sort, then truncate to `size()` if set.
    fn select(&self, _query: &Q, candidates: Vec<C>) -> Vec<C> {
        let mut sorted = self.sort(candidates);
        if let Some(limit) = self.size() {
            sorted.truncate(limit);
        }
        sorted
    }

    /// Decide if this selector should run for the given query.
    fn enable(&self, _query: &Q) -> bool {
        true
    }

    /// Total order between two candidates; `Less` sorts first.
    fn compare(&self, a: &C, b: &C) -> Ordering;

    /// Stable sort by `compare`, so equal candidates keep their input order.
    fn sort(&self, candidates: Vec<C>) -> Vec<C> {
        let mut sorted = candidates;
        sorted.sort_by(|a, b| self.compare(a, b));
        sorted
    }

    /// Maximum number of candidates to keep. `None` keeps all of them.
    fn size(&self) -> Option<usize> {
        None
    }

    /// Short type name used in stage-failure log lines.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
