//! Observation sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bounded period of observation.
///
/// The newest session is the "current" one until another is started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier.
    pub id: i64,
    /// When observation began.
    #[serde(rename = "datetime")]
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub const fn new(id: i64, started_at: DateTime<Utc>) -> Self {
        Self { id, started_at }
    }
}
