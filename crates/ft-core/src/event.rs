//! Raw application-focus events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observed application-focus change.
///
/// Events of a session are ordered by `timestamp`, with ties broken by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusEvent {
    /// Monotonically increasing identifier within a session.
    pub id: i64,
    /// Path or handle of the focused application (e.g. the executable path).
    pub path: String,
    /// Human-readable title at the time of focus. Used as the application key.
    pub title: String,
    /// When the focus change was observed.
    pub timestamp: DateTime<Utc>,
    /// Producer-defined offset from session start.
    ///
    /// Treated as opaque metadata: durations are always derived from `timestamp`.
    #[serde(default)]
    pub offset: u64,
    /// The owning session.
    pub session_id: i64,
}

impl FocusEvent {
    /// The application identifier this event attributes time to.
    pub fn app(&self) -> &str {
        &self.title
    }

    /// Ordering key within a session.
    pub const fn order_key(&self) -> (DateTime<Utc>, i64) {
        (self.timestamp, self.id)
    }
}
