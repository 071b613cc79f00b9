//! Contiguous focus intervals derived from events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A span during which one application held focus.
///
/// An interval still in progress is `Open`; it gains a `finish` and a duration
/// only when the next differing application takes focus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawVisitedEntry", into = "RawVisitedEntry")]
pub enum VisitedEntry {
    /// The application currently holding focus.
    Open {
        app_title: String,
        start: DateTime<Utc>,
    },
    /// A finished visit.
    Closed {
        app_title: String,
        start: DateTime<Utc>,
        finish: DateTime<Utc>,
        duration_ms: i64,
    },
}

impl VisitedEntry {
    /// Closes a visit, deriving the duration from the two timestamps.
    pub fn closed(
        app_title: impl Into<String>,
        start: DateTime<Utc>,
        finish: DateTime<Utc>,
    ) -> Self {
        Self::Closed {
            app_title: app_title.into(),
            start,
            finish,
            duration_ms: (finish - start).num_milliseconds(),
        }
    }

    pub fn app_title(&self) -> &str {
        match self {
            Self::Open { app_title, .. } | Self::Closed { app_title, .. } => app_title,
        }
    }

    pub const fn start(&self) -> DateTime<Utc> {
        match self {
            Self::Open { start, .. } | Self::Closed { start, .. } => *start,
        }
    }

    pub const fn finish(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Open { .. } => None,
            Self::Closed { finish, .. } => Some(*finish),
        }
    }

    /// Duration of a closed visit; `None` while open.
    pub const fn duration_ms(&self) -> Option<i64> {
        match self {
            Self::Open { .. } => None,
            Self::Closed { duration_ms, .. } => Some(*duration_ms),
        }
    }

    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// Closes an open visit at `finish`. Closed visits are returned unchanged.
    #[must_use]
    pub fn close_at(self, finish: DateTime<Utc>) -> Self {
        match self {
            Self::Open { app_title, start } => Self::closed(app_title, start, finish),
            closed @ Self::Closed { .. } => closed,
        }
    }
}

/// Wire shape shared with the dashboard: a nullable `finish` and `duration`.
#[derive(Serialize, Deserialize)]
struct RawVisitedEntry {
    start: DateTime<Utc>,
    finish: Option<DateTime<Utc>>,
    #[serde(default)]
    duration: Option<i64>,
    app_title: String,
}

impl From<RawVisitedEntry> for VisitedEntry {
    fn from(raw: RawVisitedEntry) -> Self {
        match raw.finish {
            None => Self::Open {
                app_title: raw.app_title,
                start: raw.start,
            },
            Some(finish) => Self::Closed {
                duration_ms: raw
                    .duration
                    .unwrap_or_else(|| (finish - raw.start).num_milliseconds()),
                app_title: raw.app_title,
                start: raw.start,
                finish,
            },
        }
    }
}

impl From<VisitedEntry> for RawVisitedEntry {
    fn from(entry: VisitedEntry) -> Self {
        match entry {
            VisitedEntry::Open { app_title, start } => Self {
                start,
                finish: None,
                duration: None,
                app_title,
            },
            VisitedEntry::Closed {
                app_title,
                start,
                finish,
                duration_ms,
            } => Self {
                start,
                finish: Some(finish),
                duration: Some(duration_ms),
                app_title,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn closed_derives_duration() {
        let entry = VisitedEntry::closed(
            "Editor",
            at("2024-01-01T10:00:00Z"),
            at("2024-01-01T10:00:02.500Z"),
        );
        assert_eq!(entry.duration_ms(), Some(2500));
        assert_eq!(entry.app_title(), "Editor");
        assert!(!entry.is_open());
    }

    #[test]
    fn open_entry_serializes_with_null_finish_and_duration() {
        let entry = VisitedEntry::Open {
            app_title: "Browser".into(),
            start: at("2024-01-01T10:00:00Z"),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "start": "2024-01-01T10:00:00Z",
                "finish": null,
                "duration": null,
                "app_title": "Browser"
            })
        );
    }

    #[test]
    fn null_finish_deserializes_as_open() {
        let entry: VisitedEntry = serde_json::from_str(
            r#"{"start":"2024-01-01T10:00:00Z","finish":null,"duration":0,"app_title":"Browser"}"#,
        )
        .unwrap();
        assert!(entry.is_open());
        assert_eq!(entry.duration_ms(), None);
    }

    #[test]
    fn close_at_turns_open_into_closed() {
        let entry = VisitedEntry::Open {
            app_title: "Browser".into(),
            start: at("2024-01-01T10:00:00Z"),
        }
        .close_at(at("2024-01-01T10:01:00Z"));

        assert_eq!(entry.finish(), Some(at("2024-01-01T10:01:00Z")));
        assert_eq!(entry.duration_ms(), Some(60_000));
    }
}
