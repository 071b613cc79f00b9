//! Versioned `SessionStats` payloads.
//!
//! Version 0 is the shape emitted by the first backend: no `schema_version`
//! field, open visits reported with `"duration": 0`, and totals computed from
//! event offsets rather than from the per-app times. Version 1 is the current
//! [`SessionStats`] layout.
//!
//! Totals and averages are never trusted: every version is rebuilt through
//! [`SessionStats::new`], and the visited entries are checked before they are
//! accepted. New versions add an arm to [`migrate`]; call sites only ever see
//! the current struct.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::entry::VisitedEntry;
use crate::session::Session;
use crate::stats::{SCHEMA_VERSION, SessionStats, TimePerApp};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("unsupported stats schema version {0}")]
    UnsupportedVersion(u64),
    #[error("schema_version must be a non-negative integer")]
    InvalidVersionField,
    #[error("malformed stats payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("visited entry {index}: {defect}")]
    InvalidEntry { index: usize, defect: EntryDefect },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntryDefect {
    #[error("repeats {0}, the app of the previous entry")]
    RepeatedApp(String),
    #[error("open visit is not the last entry")]
    OpenBeforeEnd,
    #[error("duration is {found} ms, but finish - start is {expected} ms")]
    DurationMismatch { expected: i64, found: i64 },
}

/// The fields every version carries. Totals are dropped and recomputed.
#[derive(Deserialize)]
struct StoredStats {
    session: Session,
    time_per_app: TimePerApp,
    #[serde(default)]
    app_visited_entries: Vec<VisitedEntry>,
}

/// Reads a stats payload of any known version as the current schema.
pub fn migrate(payload: Value) -> Result<SessionStats, MigrationError> {
    let version = match payload.get("schema_version") {
        None => 0,
        Some(v) => v.as_u64().ok_or(MigrationError::InvalidVersionField)?,
    };

    if version == 0 {
        tracing::debug!("migrating v0 session stats");
    } else if version != u64::from(SCHEMA_VERSION) {
        return Err(MigrationError::UnsupportedVersion(version));
    }

    let stored: StoredStats = serde_json::from_value(payload)?;
    check_entries(&stored.app_visited_entries)?;
    Ok(SessionStats::new(
        stored.session,
        stored.time_per_app,
        stored.app_visited_entries,
    ))
}

/// Rejects entries the aggregator could never have produced.
fn check_entries(entries: &[VisitedEntry]) -> Result<(), MigrationError> {
    let invalid = |index, defect| MigrationError::InvalidEntry { index, defect };
    let last = entries.len().saturating_sub(1);

    for (index, entry) in entries.iter().enumerate() {
        if index > 0 && entries[index - 1].app_title() == entry.app_title() {
            return Err(invalid(
                index,
                EntryDefect::RepeatedApp(entry.app_title().to_string()),
            ));
        }
        match entry {
            VisitedEntry::Open { .. } if index != last => {
                return Err(invalid(index, EntryDefect::OpenBeforeEnd));
            }
            VisitedEntry::Open { .. } => {}
            VisitedEntry::Closed {
                start,
                finish,
                duration_ms,
                ..
            } => {
                let expected = (*finish - *start).num_milliseconds();
                if *duration_ms != expected {
                    return Err(invalid(
                        index,
                        EntryDefect::DurationMismatch {
                            expected,
                            found: *duration_ms,
                        },
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Parses a JSON document with [`migrate`].
pub fn migrate_str(json: &str) -> Result<SessionStats, MigrationError> {
    migrate(serde_json::from_str(json)?)
}
