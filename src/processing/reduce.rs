//! Reduction operations over one integer key of a [`crate::types::RecordSet`].

use crate::types::RecordSet;

/// Built-in reduction operations over a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    /// Count records that carry an integer under the key.
    Count,
    /// Sum of integer values (saturating).
    Sum,
    /// Minimum integer value.
    Min,
    /// Maximum integer value.
    Max,
}

/// Reduce `key` using a built-in [`ReduceOp`].
///
/// Records where `key` is absent or holds a string are ignored.
///
/// - For `Count`, always returns `Some(n)` (possibly `Some(0)`).
/// - For `Sum`/`Min`/`Max`, returns `None` if no record carries an integer under `key`.
pub fn reduce(records: &RecordSet, key: &str, op: ReduceOp) -> Option<i64> {
    let values = records
        .iter()
        .filter_map(|r| r.get(key).and_then(|v| v.as_i64()));

    match op {
        ReduceOp::Count => Some(values.count() as i64),
        ReduceOp::Sum => values.reduce(|a, v| a.saturating_add(v)),
        ReduceOp::Min => values.min(),
        ReduceOp::Max => values.max(),
    }
}
