//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use ft_core::SessionAggregator;
use ft_db::Database;
use regex::Regex;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(second|minute|hour|day)s?\s+ago$").unwrap());

/// Conservative bounds for relative time parsing (~100 years in seconds).
const MAX_RELATIVE_SECONDS: i64 = 100 * 365 * 24 * 60 * 60;

/// Parse a datetime string as either ISO 8601 or relative time.
///
/// Supports:
/// - ISO 8601: "2026-01-15T10:30:00Z"
/// - Relative: "30 seconds ago", "5 minutes ago", "2 hours ago", "1 day ago"
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid datetime: {s}. Use ISO 8601 (e.g., 2026-01-15T10:30:00Z) or relative (e.g., '5 minutes ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let seconds_per_unit = match &caps[2] {
        "second" => 1,
        "minute" => 60,
        "hour" => 60 * 60,
        "day" => 24 * 60 * 60,
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > MAX_RELATIVE_SECONDS / seconds_per_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    Ok(Utc::now() - Duration::seconds(n * seconds_per_unit))
}

/// Parses an optional time argument, defaulting to now.
pub fn time_or_now(s: Option<&str>) -> Result<DateTime<Utc>> {
    s.map_or_else(|| Ok(Utc::now()), parse_datetime)
}

/// Replays the current session's events into an aggregator.
pub fn load_current(db: &Database) -> Result<SessionAggregator> {
    let Some(session) = db.current_session()? else {
        anyhow::bail!("no session recorded yet; run `ft session start` or `ft record` first");
    };
    let events = db.list_session_events(session.id)?;
    tracing::debug!(session_id = session.id, events = events.len(), "replaying session");
    SessionAggregator::replay(session, &events).context("stored events could not be aggregated")
}

/// Formats milliseconds as a short duration.
///
/// "Xh Ym" from one hour, "Xm Ys" from one minute, "Xs" below that.
/// Negative durations are treated as 0s.
pub fn format_duration(ms: i64) -> String {
    if ms < 0 {
        return "0s".to_string();
    }
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else if minutes >= 1 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
