//! The aggregated, queryable view of a session.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entry::VisitedEntry;
use crate::session::Session;

/// Current version of the [`SessionStats`] wire schema.
pub const SCHEMA_VERSION: u32 = 1;

/// An application appeared twice in a `time_per_app` payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("duplicate application in time_per_app: {0}")]
pub struct DuplicateApp(pub String);

/// Cumulative milliseconds spent per application.
///
/// Serialized as an array of `[app, ms]` pairs in ranked order (most time first,
/// ties by name) so the dashboard can render it without re-sorting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(String, i64)>", into = "Vec<(String, i64)>")]
pub struct TimePerApp(BTreeMap<String, i64>);

impl TimePerApp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `ms` to the running total for `app`, creating the entry if needed.
    pub fn add(&mut self, app: &str, ms: i64) {
        match self.0.get_mut(app) {
            Some(total) => *total += ms,
            None => {
                self.0.insert(app.to_string(), ms);
            }
        }
    }

    pub fn get(&self, app: &str) -> Option<i64> {
        self.0.get(app).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(app, ms)| (app.as_str(), *ms))
    }

    /// Sum of all per-app totals.
    pub fn total(&self) -> i64 {
        self.0.values().sum()
    }

    /// Arithmetic mean of the per-app totals, 0 when empty.
    #[expect(
        clippy::cast_precision_loss,
        reason = "millisecond totals stay far below 2^52"
    )]
    pub fn average(&self) -> f64 {
        if self.0.is_empty() {
            0.0
        } else {
            self.total() as f64 / self.0.len() as f64
        }
    }

    /// Entries sorted by time spent descending, ties broken by name ascending.
    pub fn ranked(&self) -> Vec<(&str, i64)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| rank(*a, *b));
        entries
    }
}

pub(crate) fn rank(a: (&str, i64), b: (&str, i64)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

impl TryFrom<Vec<(String, i64)>> for TimePerApp {
    type Error = DuplicateApp;

    fn try_from(pairs: Vec<(String, i64)>) -> Result<Self, Self::Error> {
        let mut map = BTreeMap::new();
        for (app, ms) in pairs {
            if map.contains_key(&app) {
                return Err(DuplicateApp(app));
            }
            map.insert(app, ms);
        }
        Ok(Self(map))
    }
}

impl From<TimePerApp> for Vec<(String, i64)> {
    fn from(time: TimePerApp) -> Self {
        time.ranked()
            .into_iter()
            .map(|(app, ms)| (app.to_string(), ms))
            .collect()
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for TimePerApp {
    fn from_iter<I: IntoIterator<Item = (S, i64)>>(iter: I) -> Self {
        let mut time = Self::new();
        for (app, ms) in iter {
            let app: String = app.into();
            time.add(&app, ms);
        }
        time
    }
}

/// Aggregate statistics for one session, as served to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub schema_version: u32,
    pub session: Session,
    pub time_per_app: TimePerApp,
    pub avg_time_in_app: f64,
    pub total_time_in_apps: i64,
    /// Visits in chronological order. Only the last one may be open.
    pub app_visited_entries: Vec<VisitedEntry>,
}

impl SessionStats {
    /// Builds stats with the total and average derived from `time_per_app`.
    pub fn new(
        session: Session,
        time_per_app: TimePerApp,
        app_visited_entries: Vec<VisitedEntry>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            session,
            avg_time_in_app: time_per_app.average(),
            total_time_in_apps: time_per_app.total(),
            time_per_app,
            app_visited_entries,
        }
    }

    /// Stats for a session with no recorded events.
    pub fn empty(session: Session) -> Self {
        Self::new(session, TimePerApp::new(), Vec::new())
    }

    /// The visit currently in progress, if any.
    pub fn open_entry(&self) -> Option<&VisitedEntry> {
        self.app_visited_entries.last().filter(|e| e.is_open())
    }
}
