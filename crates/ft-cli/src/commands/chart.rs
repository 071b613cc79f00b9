//! Chart command: top applications plus an "others" bucket.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ft_core::{BucketRow, bucketize};
use ft_db::Database;

use super::util::{format_duration, load_current};

/// Prints bucketized time-per-app rows for the current session.
pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    top: usize,
    as_of: DateTime<Utc>,
    json: bool,
) -> Result<()> {
    let stats = load_current(db)?.snapshot(as_of);
    let rows = bucketize(&stats.time_per_app, top).context("invalid --top")?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&rows)?)?;
    } else {
        write!(writer, "{}", format_chart(&rows))?;
    }
    Ok(())
}

/// Generates a 10-character bar.
/// Values <5% of max get a single block for visibility.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn progress_bar(value: i64, max: i64) -> String {
    if max <= 0 {
        return "░░░░░░░░░░".to_string();
    }

    let ratio = value as f64 / max as f64;
    let filled = if ratio < 0.05 && value > 0 {
        1
    } else {
        (ratio * 10.0).round().clamp(0.0, 10.0) as usize
    };

    let empty = 10 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

/// Renders chart rows as horizontal bars scaled to the largest row.
pub fn format_chart(rows: &[BucketRow]) -> String {
    if rows.is_empty() {
        return "No focus recorded.\n".to_string();
    }

    let max = rows.iter().map(|r| r.value).max().unwrap_or(0);
    let width = rows.iter().map(|r| r.name.chars().count()).max().unwrap_or(0);

    let mut output = String::new();
    for row in rows {
        let _ = writeln!(
            output,
            "{:<width$}  {}  {}",
            row.name,
            progress_bar(row.value, max),
            format_duration(row.value)
        );
    }
    output
}
