//! Core domain logic for the focus tracker.
//!
//! This crate contains:
//! - The event model: focus-change events and sessions
//! - Session aggregation: per-app time, totals and visit intervals
//! - Chart projections: top-N buckets and timeline rows
//! - Stats schema versioning and migration

pub mod aggregate;
pub mod bucket;
pub mod entry;
pub mod event;
pub mod schema;
pub mod session;
pub mod stats;
pub mod timeline;

pub use aggregate::{IngestError, IngestOutcome, SessionAggregator, SharedAggregator};
pub use bucket::{BucketRow, DEFAULT_TOP_N, InvalidBucketSize, OTHERS, bucketize};
pub use entry::VisitedEntry;
pub use event::FocusEvent;
pub use schema::{EntryDefect, MigrationError, migrate, migrate_str};
pub use session::Session;
pub use stats::{SCHEMA_VERSION, SessionStats, TimePerApp};
pub use timeline::{InvalidInterval, TimelineRow, project};
