//! Stats command: the current session's aggregate.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use ft_core::SessionStats;
use ft_db::Database;

use super::util::{format_duration, load_current};

/// Prints the current session's stats as of `as_of`.
pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    as_of: DateTime<Utc>,
    json: bool,
) -> Result<()> {
    let stats = load_current(db)?.snapshot(as_of);
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&stats)?)?;
    } else {
        write!(writer, "{}", format_stats(&stats))?;
    }
    Ok(())
}

/// Renders stats for the terminal.
#[expect(
    clippy::cast_possible_truncation,
    reason = "average of millisecond totals fits in i64"
)]
pub fn format_stats(stats: &SessionStats) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Session {} (started {})",
        stats.session.id,
        stats
            .session
            .started_at
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    );

    if stats.time_per_app.is_empty() && stats.open_entry().is_none() {
        let _ = writeln!(output, "No focus recorded.");
        return output;
    }

    let _ = writeln!(
        output,
        "Total: {}  Average: {}  Apps: {}",
        format_duration(stats.total_time_in_apps),
        format_duration(stats.avg_time_in_app.round() as i64),
        stats.time_per_app.len()
    );

    let ranked = stats.time_per_app.ranked();
    let width = ranked.iter().map(|(app, _)| app.chars().count()).max().unwrap_or(0);
    for (app, ms) in ranked {
        let _ = writeln!(output, "  {app:<width$}  {}", format_duration(ms));
    }

    if let Some(open) = stats.open_entry() {
        let _ = writeln!(
            output,
            "Focused: {} since {}",
            open.app_title(),
            open.start().to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }

    output
}
