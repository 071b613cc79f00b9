//! Events command: the current session's focus events as JSON.

use std::io::Write;

use anyhow::Result;
use ft_db::Database;

/// Prints events as a JSON array, ordered by timestamp then id.
///
/// Only the current session is included unless `all` is set.
pub fn run<W: Write>(writer: &mut W, db: &Database, all: bool) -> Result<()> {
    let events = if all {
        db.list_events()?
    } else {
        match db.current_session()? {
            Some(session) => db.list_session_events(session.id)?,
            None => Vec::new(),
        }
    };

    writeln!(writer, "{}", serde_json::to_string_pretty(&events)?)?;
    Ok(())
}
