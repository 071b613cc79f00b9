//! Session commands: start a new session or show the current one.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use ft_db::Database;

/// Starts a new session and prints it as JSON.
pub fn start<W: Write>(writer: &mut W, db: &mut Database, at: DateTime<Utc>) -> Result<()> {
    let session = db.start_session(at)?;
    writeln!(writer, "{}", serde_json::to_string(&session)?)?;
    Ok(())
}

/// Prints the current session as JSON.
pub fn current<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let Some(session) = db.current_session()? else {
        anyhow::bail!("no session recorded yet");
    };
    writeln!(writer, "{}", serde_json::to_string(&session)?)?;
    Ok(())
}
