//! Session aggregation.
//!
//! Turns an ordered stream of [`FocusEvent`]s into [`SessionStats`].
//!
//! # State
//!
//! At most one visit is open at any time: the application currently holding
//! focus. An event naming a different application closes it (stamping
//! `finish` and adding the duration to that app's total) and opens a new one;
//! an event naming the same application is coalesced into the open visit.
//!
//! Every [`SessionAggregator::ingest`] validates the event before touching any
//! state, so a rejected event leaves the aggregate exactly as it was.
//!
//! # Thread Safety
//!
//! [`SessionAggregator`] is a plain value with `&mut self` mutation. For shared
//! access use [`SharedAggregator`], which serializes writers and lets
//! snapshots observe only complete ingests.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::entry::VisitedEntry;
use crate::event::FocusEvent;
use crate::session::Session;
use crate::stats::{SessionStats, TimePerApp};

/// Reasons an event is rejected by the aggregator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// The event's timestamp is earlier than the last ingested event.
    #[error("event {event_id} at {timestamp} is earlier than the last ingested event at {last_timestamp}")]
    OutOfOrderEvent {
        event_id: i64,
        timestamp: DateTime<Utc>,
        last_timestamp: DateTime<Utc>,
    },
    /// The event belongs to a session other than the one being tracked.
    #[error("event {event_id} belongs to session {found}, tracking session {expected}")]
    SessionMismatch {
        event_id: i64,
        expected: i64,
        found: i64,
    },
}

/// What an accepted event did to the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new visit was opened (closing the previous one, if any).
    Opened,
    /// The event named the application already holding focus.
    Coalesced,
    /// The event id was already ingested; nothing changed.
    Duplicate,
}

/// Incremental aggregator for a single session.
#[derive(Debug, Clone)]
pub struct SessionAggregator {
    session: Session,
    time_per_app: TimePerApp,
    entries: Vec<VisitedEntry>,
    /// `(timestamp, id)` of the last accepted event.
    last_event: Option<(DateTime<Utc>, i64)>,
}

impl SessionAggregator {
    /// Starts tracking `session` with an empty aggregate.
    pub fn new(session: Session) -> Self {
        Self {
            session,
            time_per_app: TimePerApp::new(),
            entries: Vec::new(),
            last_event: None,
        }
    }

    /// Builds an aggregator by ingesting a complete, ordered event list.
    pub fn replay<'a, I>(session: Session, events: I) -> Result<Self, IngestError>
    where
        I: IntoIterator<Item = &'a FocusEvent>,
    {
        let mut aggregator = Self::new(session);
        for event in events {
            aggregator.ingest(event)?;
        }
        Ok(aggregator)
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Timestamp of the last accepted event.
    pub fn last_event_at(&self) -> Option<DateTime<Utc>> {
        self.last_event.map(|(timestamp, _)| timestamp)
    }

    /// Applies one focus-change event.
    pub fn ingest(&mut self, event: &FocusEvent) -> Result<IngestOutcome, IngestError> {
        if event.session_id != self.session.id {
            return Err(IngestError::SessionMismatch {
                event_id: event.id,
                expected: self.session.id,
                found: event.session_id,
            });
        }

        if let Some((last_timestamp, last_id)) = self.last_event {
            if event.timestamp < last_timestamp {
                tracing::warn!(
                    event_id = event.id,
                    timestamp = %event.timestamp,
                    last_timestamp = %last_timestamp,
                    "rejecting out-of-order focus event"
                );
                return Err(IngestError::OutOfOrderEvent {
                    event_id: event.id,
                    timestamp: event.timestamp,
                    last_timestamp,
                });
            }
            if event.id <= last_id {
                tracing::debug!(event_id = event.id, last_id, "ignoring redelivered event");
                return Ok(IngestOutcome::Duplicate);
            }
        }

        self.last_event = Some(event.order_key());

        if let Some(VisitedEntry::Open { app_title, .. }) = self.entries.last() {
            if app_title == event.app() {
                return Ok(IngestOutcome::Coalesced);
            }
        }

        self.close_open_entry(event.timestamp);
        tracing::debug!(app = event.app(), start = %event.timestamp, "focus moved");
        self.entries.push(VisitedEntry::Open {
            app_title: event.app().to_string(),
            start: event.timestamp,
        });
        Ok(IngestOutcome::Opened)
    }

    fn close_open_entry(&mut self, finish: DateTime<Utc>) {
        if !self.entries.last().is_some_and(VisitedEntry::is_open) {
            return;
        }
        if let Some(open) = self.entries.pop() {
            let closed = open.close_at(finish);
            if let Some(duration_ms) = closed.duration_ms() {
                self.time_per_app.add(closed.app_title(), duration_ms);
            }
            self.entries.push(closed);
        }
    }

    /// Current aggregate, counting only closed visits.
    pub fn stats(&self) -> SessionStats {
        SessionStats::new(
            self.session.clone(),
            self.time_per_app.clone(),
            self.entries.clone(),
        )
    }

    /// Current aggregate as of `as_of`.
    ///
    /// When a visit is open and `as_of` is past its start, the elapsed time is
    /// credited to that application and to the grand total. Nothing is
    /// mutated, so repeated calls with any `as_of` are independent.
    pub fn snapshot(&self, as_of: DateTime<Utc>) -> SessionStats {
        let mut time_per_app = self.time_per_app.clone();
        if let Some(VisitedEntry::Open { app_title, start }) = self.entries.last() {
            let elapsed = (as_of - *start).num_milliseconds();
            if elapsed > 0 {
                time_per_app.add(app_title, elapsed);
            }
        }
        SessionStats::new(self.session.clone(), time_per_app, self.entries.clone())
    }

    /// Starts tracking a new session, discarding the in-memory aggregate.
    pub fn reset(&mut self, session: Session) {
        tracing::info!(
            previous = self.session.id,
            next = session.id,
            "resetting session aggregate"
        );
        *self = Self::new(session);
    }
}

/// A [`SessionAggregator`] shared between threads.
///
/// Ingests and resets take the write lock; snapshots take the read lock and
/// therefore see the state fully before or fully after any ingest.
#[derive(Debug, Clone)]
pub struct SharedAggregator {
    inner: Arc<RwLock<SessionAggregator>>,
}

impl SharedAggregator {
    pub fn new(session: Session) -> Self {
        Self::from(SessionAggregator::new(session))
    }

    pub fn ingest(&self, event: &FocusEvent) -> Result<IngestOutcome, IngestError> {
        // Ingest never leaves partial state, so a poisoned lock is still consistent.
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .ingest(event)
    }

    pub fn snapshot(&self, as_of: DateTime<Utc>) -> SessionStats {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot(as_of)
    }

    pub fn reset(&self, session: Session) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .reset(session);
    }
}

impl From<SessionAggregator> for SharedAggregator {
    fn from(aggregator: SessionAggregator) -> Self {
        Self {
            inner: Arc::new(RwLock::new(aggregator)),
        }
    }
}
