//! Record command: append one focus change to the current session.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ft_db::{Database, NewFocusEvent};

/// Records a focus change, starting a session first if none exists.
///
/// When `offset` is not given it defaults to milliseconds since the session
/// started. The stored event is printed as JSON.
pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    path: &str,
    title: &str,
    at: DateTime<Utc>,
    offset: Option<u64>,
) -> Result<()> {
    let session = match db.current_session()? {
        Some(session) => session,
        None => db.start_session(at)?,
    };

    let offset = offset.unwrap_or_else(|| {
        u64::try_from((at - session.started_at).num_milliseconds()).unwrap_or(0)
    });

    let event = db
        .record_event(
            session.id,
            &NewFocusEvent {
                path: path.to_string(),
                title: title.to_string(),
                timestamp: at,
                offset,
            },
        )
        .with_context(|| format!("failed to record focus on {title}"))?;

    writeln!(writer, "{}", serde_json::to_string(&event)?)?;
    Ok(())
}
