//! Storage layer for the focus tracker.
//!
//! Persists sessions and focus events using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` can be moved between threads but needs external synchronization
//! (e.g. a `Mutex<Database>`) to be shared.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in RFC 3339 format with millisecond precision
//! (e.g. `2024-01-15T10:30:00.000Z`), so lexicographic order matches
//! chronological order.
//!
//! The current session is the one with the greatest id.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use ft_core::{FocusEvent, Session};
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored timestamp could not be parsed.
    #[error("invalid timestamp in {table} row {id}: {timestamp}")]
    TimestampParse {
        table: &'static str,
        id: i64,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// The referenced session does not exist.
    #[error("unknown session {0}")]
    UnknownSession(i64),
    /// The event is older than the latest event already recorded for its session.
    #[error("event at {timestamp} precedes latest event at {latest} in session {session_id}")]
    OutOfOrder {
        session_id: i64,
        timestamp: DateTime<Utc>,
        latest: DateTime<Utc>,
    },
    /// The offset does not fit the storage column.
    #[error("offset out of range: {0}")]
    OffsetOutOfRange(u64),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A focus event before it is assigned an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFocusEvent {
    pub path: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub offset: u64,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The schema is initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                datetime TEXT NOT NULL
            );

            -- Events table: one row per application-focus change
            -- timestamp: RFC 3339 with milliseconds (e.g., '2024-01-15T10:30:00.000Z')
            -- offset: producer-defined, opaque
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                path TEXT NOT NULL,
                title TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                "offset" INTEGER NOT NULL DEFAULT 0,
                session_id INTEGER NOT NULL,
                FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_events_session_timestamp
                ON events(session_id, timestamp);
            "#,
        )?;
        Ok(())
    }

    /// Starts a new session, which becomes the current one.
    pub fn start_session(&mut self, started_at: DateTime<Utc>) -> Result<Session, DbError> {
        self.conn.execute(
            "INSERT INTO sessions (datetime) VALUES (?)",
            params![format_timestamp(started_at)],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::info!(session_id = id, %started_at, "started session");
        Ok(Session::new(id, truncate_to_millis(started_at)))
    }

    /// Returns the session with the greatest id, if any.
    pub fn current_session(&self) -> Result<Option<Session>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, datetime FROM sessions ORDER BY id DESC LIMIT 1",
                [],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        row.map(|(id, datetime)| session_from_parts(id, &datetime))
            .transpose()
    }

    /// Looks up a session by id.
    pub fn get_session(&self, id: i64) -> Result<Option<Session>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, datetime FROM sessions WHERE id = ?",
                [id],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        row.map(|(id, datetime)| session_from_parts(id, &datetime))
            .transpose()
    }

    /// Appends a focus event to a session.
    ///
    /// Events must arrive in timestamp order within a session; an event older
    /// than the session's latest one is rejected.
    pub fn record_event(
        &mut self,
        session_id: i64,
        event: &NewFocusEvent,
    ) -> Result<FocusEvent, DbError> {
        let offset =
            i64::try_from(event.offset).map_err(|_| DbError::OffsetOutOfRange(event.offset))?;
        let timestamp = format_timestamp(event.timestamp);

        let tx = self.conn.transaction()?;
        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM sessions WHERE id = ?)",
            [session_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(DbError::UnknownSession(session_id));
        }

        let latest: Option<(i64, String)> = tx
            .query_row(
                "
                SELECT id, timestamp FROM events
                WHERE session_id = ?
                ORDER BY timestamp DESC, id DESC
                LIMIT 1
                ",
                [session_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        if let Some((latest_id, latest)) = latest {
            if timestamp < latest {
                return Err(DbError::OutOfOrder {
                    session_id,
                    timestamp: event.timestamp,
                    latest: parse_timestamp(&latest, "events", latest_id)?,
                });
            }
        }

        tx.execute(
            r#"
            INSERT INTO events (path, title, timestamp, "offset", session_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![event.path, event.title, timestamp, offset, session_id],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!(event_id = id, session_id, title = %event.title, "recorded focus event");
        Ok(FocusEvent {
            id,
            path: event.path.clone(),
            title: event.title.clone(),
            timestamp: truncate_to_millis(event.timestamp),
            offset: event.offset,
            session_id,
        })
    }

    /// Lists every stored event, grouped by session and ordered by timestamp then id.
    pub fn list_events(&self) -> Result<Vec<FocusEvent>, DbError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, path, title, timestamp, "offset", session_id
            FROM events
            ORDER BY session_id ASC, timestamp ASC, id ASC
            "#,
        )?;
        let rows = stmt.query_map([], raw_event)?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?.into_event()?);
        }
        Ok(events)
    }

    /// Lists the events of one session ordered by timestamp then id.
    pub fn list_session_events(&self, session_id: i64) -> Result<Vec<FocusEvent>, DbError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, path, title, timestamp, "offset", session_id
            FROM events
            WHERE session_id = ?
            ORDER BY timestamp ASC, id ASC
            "#,
        )?;
        let rows = stmt.query_map([session_id], raw_event)?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?.into_event()?);
        }
        Ok(events)
    }
}

/// An events row with its timestamp still in storage form.
struct RawEvent {
    id: i64,
    path: String,
    title: String,
    timestamp: String,
    offset: i64,
    session_id: i64,
}

fn raw_event(row: &Row<'_>) -> rusqlite::Result<RawEvent> {
    Ok(RawEvent {
        id: row.get(0)?,
        path: row.get(1)?,
        title: row.get(2)?,
        timestamp: row.get(3)?,
        offset: row.get(4)?,
        session_id: row.get(5)?,
    })
}

impl RawEvent {
    fn into_event(self) -> Result<FocusEvent, DbError> {
        Ok(FocusEvent {
            timestamp: parse_timestamp(&self.timestamp, "events", self.id)?,
            // Written from a u64, so never negative.
            offset: u64::try_from(self.offset).unwrap_or_default(),
            id: self.id,
            path: self.path,
            title: self.title,
            session_id: self.session_id,
        })
    }
}

fn session_from_parts(id: i64, datetime: &str) -> Result<Session, DbError> {
    Ok(Session::new(id, parse_timestamp(datetime, "sessions", id)?))
}

fn parse_timestamp(
    timestamp: &str,
    table: &'static str,
    id: i64,
) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            table,
            id,
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Drops sub-millisecond precision so returned values match what a reload yields.
fn truncate_to_millis(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(timestamp.timestamp_millis()).unwrap_or(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    fn focus(title: &str, seconds: i64) -> NewFocusEvent {
        NewFocusEvent {
            path: format!("/apps/{title}"),
            title: title.to_string(),
            timestamp: at(seconds),
            offset: u64::try_from(seconds * 1000).unwrap(),
        }
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");
        assert_eq!(
            table_columns(&db.conn, "events"),
            vec!["id", "path", "title", "timestamp", "offset", "session_id"]
        );
        assert_eq!(table_columns(&db.conn, "sessions"), vec!["id", "datetime"]);
    }

    #[test]
    fn current_session_is_newest() {
        let mut db = Database::open_in_memory().unwrap();
        assert_eq!(db.current_session().unwrap(), None);

        let first = db.start_session(at(0)).unwrap();
        let second = db.start_session(at(60)).unwrap();

        assert!(second.id > first.id);
        assert_eq!(db.current_session().unwrap(), Some(second));
        assert_eq!(db.get_session(first.id).unwrap(), Some(first));
        assert_eq!(db.get_session(999).unwrap(), None);
    }

    #[test]
    fn events_round_trip_in_order() {
        let mut db = Database::open_in_memory().unwrap();
        let session = db.start_session(at(0)).unwrap();

        let a = db.record_event(session.id, &focus("Editor", 1)).unwrap();
        let b = db.record_event(session.id, &focus("Browser", 5)).unwrap();
        let c = db.record_event(session.id, &focus("Browser", 5)).unwrap();

        let events = db.list_session_events(session.id).unwrap();
        assert_eq!(events, vec![a, b, c]);
        assert_eq!(events[0].offset, 1000);
        assert_eq!(events[1].timestamp, at(5));
    }

    #[test]
    fn list_events_spans_sessions() {
        let mut db = Database::open_in_memory().unwrap();
        let first = db.start_session(at(0)).unwrap();
        db.record_event(first.id, &focus("Editor", 1)).unwrap();
        let second = db.start_session(at(10)).unwrap();
        db.record_event(second.id, &focus("Terminal", 11)).unwrap();

        let all = db.list_events().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].session_id, first.id);
        assert_eq!(all[1].session_id, second.id);
        assert_eq!(db.list_session_events(second.id).unwrap().len(), 1);
    }

    #[test]
    fn out_of_order_event_is_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let session = db.start_session(at(0)).unwrap();
        db.record_event(session.id, &focus("Editor", 10)).unwrap();

        let err = db.record_event(session.id, &focus("Browser", 5)).unwrap_err();
        assert!(matches!(err, DbError::OutOfOrder { .. }));
        assert_eq!(db.list_session_events(session.id).unwrap().len(), 1);
    }

    #[test]
    fn unknown_session_is_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let err = db.record_event(42, &focus("Editor", 1)).unwrap_err();
        assert!(matches!(err, DbError::UnknownSession(42)));
    }

    #[test]
    fn reopening_keeps_data() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("focustime.db");

        {
            let mut db = Database::open(&path).unwrap();
            let session = db.start_session(at(0)).unwrap();
            db.record_event(session.id, &focus("Editor", 1)).unwrap();
        }

        let db = Database::open(&path).unwrap();
        let session = db.current_session().unwrap().unwrap();
        assert_eq!(db.list_session_events(session.id).unwrap().len(), 1);
    }
}
