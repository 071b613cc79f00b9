//! Ranked "top N plus others" rows for bar charts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stats::TimePerApp;

/// Name of the synthetic row summing everything past the top N.
pub const OTHERS: &str = "others";

/// Rows shown individually when the caller has no preference.
pub const DEFAULT_TOP_N: usize = 5;

/// The requested bucket count was zero.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("bucket size must be positive, got {0}")]
pub struct InvalidBucketSize(pub usize);

/// One bar of the chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRow {
    pub name: String,
    pub value: i64,
}

/// Reduces per-app totals to at most `n + 1` rows.
///
/// Apps are ranked by time descending, ties by name. The first `n` become
/// rows verbatim; the rest are summed into a single [`OTHERS`] row, which is
/// omitted entirely when nothing is left over.
pub fn bucketize(
    time_per_app: &TimePerApp,
    n: usize,
) -> Result<Vec<BucketRow>, InvalidBucketSize> {
    if n == 0 {
        return Err(InvalidBucketSize(n));
    }

    let ranked = time_per_app.ranked();
    let split = n.min(ranked.len());
    let (top, rest) = ranked.split_at(split);

    let mut rows: Vec<BucketRow> = top
        .iter()
        .map(|(name, value)| BucketRow {
            name: (*name).to_string(),
            value: *value,
        })
        .collect();

    if !rest.is_empty() {
        rows.push(BucketRow {
            name: OTHERS.to_string(),
            value: rest.iter().map(|(_, value)| value).sum(),
        });
    }

    Ok(rows)
}
