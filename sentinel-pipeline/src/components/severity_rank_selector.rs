use std::cmp::Ordering;

use crate::ranking::compare_alerts;
use crate::selector::Selector;
use crate::types::{Alert, TrendQuery};

/// Orders alerts Critical first, then by the steepest YoY units drop.
///
/// With `limit` set, only the first `limit` alerts are kept.
#[derive(Default)]
pub struct SeverityRankSelector {
    pub limit: Option<usize>,
}

impl SeverityRankSelector {
    pub fn top(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }
}

impl Selector<TrendQuery, Alert> for SeverityRankSelector {
    fn compare(&self, a: &Alert, b: &Alert) -> Ordering {
        compare_alerts(a, b)
    }

    fn size(&self) -> Option<usize> {
        self.limit
    }
}
