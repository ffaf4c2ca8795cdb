//! Per product/store time series and their comparison windows.

use std::collections::{HashMap, HashSet};

use crate::types::SalesRecord;

/// All records for one (product, store) pair, sorted by week start.
#[derive(Clone, Debug)]
pub struct SeriesGroup<'a> {
    pub product_id: &'a str,
    pub store_code: &'a str,
    pub records: Vec<&'a SalesRecord>,
}

/// Windows extracted from a series, or the reason none could be.
#[derive(Clone, Debug)]
pub enum SeriesWindows<'a> {
    Ready {
        /// Trailing `window_weeks` records, oldest first.
        window: Vec<&'a SalesRecord>,
        /// Records from the same ISO weeks one ISO year earlier, oldest first.
        prior_year: Vec<&'a SalesRecord>,
    },
    InsufficientData { available: usize, required: usize },
}

/// Group records by (product, store).
///
/// Groups come out in first-encounter order; within a group the sort by
/// week start is stable, so duplicate weeks keep their input order.
pub fn group_series<'a, I>(records: I) -> Vec<SeriesGroup<'a>>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut index: HashMap<(&'a str, &'a str), usize> = HashMap::new();
    let mut groups: Vec<SeriesGroup<'a>> = Vec::new();

    for record in records {
        let key = (record.product_id.as_str(), record.store_code.as_str());
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(SeriesGroup {
                product_id: key.0,
                store_code: key.1,
                records: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].records.push(record);
    }

    for group in &mut groups {
        group.records.sort_by_key(|r| r.week_start);
    }

    groups
}

/// Extract the trailing window and its prior-year counterpart.
///
/// Prior-year matching is by ISO week number only; 53-week years are not
/// re-aligned, so the matched weeks can drift by up to one calendar week.
pub fn build_windows<'a>(group: &SeriesGroup<'a>, window_weeks: usize) -> SeriesWindows<'a> {
    let required = window_weeks.max(1);
    let available = group.records.len();
    if available < required {
        return SeriesWindows::InsufficientData { available, required };
    }

    let window: Vec<&SalesRecord> = group.records[available - required..].to_vec();
    let prior_year = prior_year_matches(&group.records, &window);

    SeriesWindows::Ready { window, prior_year }
}

fn prior_year_matches<'a>(
    records: &[&'a SalesRecord],
    window: &[&'a SalesRecord],
) -> Vec<&'a SalesRecord> {
    let Some(first) = window.first() else {
        return Vec::new();
    };
    let target_year = first.iso_year() - 1;
    let weeks: HashSet<u32> = window.iter().map(|r| r.iso_week_number()).collect();

    records
        .iter()
        .filter(|r| r.iso_year() == target_year && weeks.contains(&r.iso_week_number()))
        .copied()
        .collect()
}
