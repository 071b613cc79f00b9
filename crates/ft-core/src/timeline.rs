//! Rows for a timeline (Gantt-style) chart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entry::VisitedEntry;

/// A closed visit ends before it starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("visit to {app_title} finishes at {finish}, before its start at {start}")]
pub struct InvalidInterval {
    pub app_title: String,
    pub start: DateTime<Utc>,
    pub finish: DateTime<Utc>,
}

/// One bar on the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineRow {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Projects closed visits into timeline rows, preserving order.
///
/// Open visits are skipped; close them first (see
/// [`VisitedEntry::close_at`]) to include the one in progress.
pub fn project(entries: &[VisitedEntry]) -> Result<Vec<TimelineRow>, InvalidInterval> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            VisitedEntry::Open { .. } => None,
            VisitedEntry::Closed {
                app_title,
                start,
                finish,
                ..
            } => Some((app_title, *start, *finish)),
        })
        .map(|(app_title, start, finish)| {
            if finish < start {
                return Err(InvalidInterval {
                    app_title: app_title.clone(),
                    start,
                    finish,
                });
            }
            Ok(TimelineRow {
                label: app_title.clone(),
                start,
                end: finish,
            })
        })
        .collect()
}
