//! Record filtering for [`crate::types::RecordSet`].

use crate::types::{Record, RecordSet};

/// Returns a new [`RecordSet`] containing only records for which `predicate` returns `true`.
///
/// This is a convenience wrapper around [`RecordSet::filter_records`].
pub fn filter<F>(records: &RecordSet, predicate: F) -> RecordSet
where
    F: FnMut(&Record) -> bool,
{
    records.filter_records(predicate)
}
