//! Timeline command: visit intervals as chart rows.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ft_core::project;
use ft_db::Database;

use super::util::load_current;

/// Prints the current session's timeline rows as JSON.
///
/// The open visit is left out unless `close_at` is given, in which case it
/// is closed at that time first.
pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    close_at: Option<DateTime<Utc>>,
) -> Result<()> {
    let mut entries = load_current(db)?.stats().app_visited_entries;

    if let (Some(close_at), Some(last)) = (close_at, entries.last_mut()) {
        if last.is_open() {
            if close_at < last.start() {
                anyhow::bail!(
                    "--as-of {close_at} is before the current visit to {} started at {}",
                    last.app_title(),
                    last.start()
                );
            }
            *last = last.clone().close_at(close_at);
        }
    }

    let rows = project(&entries).context("session contains a malformed visit")?;
    writeln!(writer, "{}", serde_json::to_string_pretty(&rows)?)?;
    Ok(())
}
