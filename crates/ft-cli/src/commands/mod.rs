//! CLI subcommand implementations.

pub mod chart;
pub mod events;
pub mod migrate;
pub mod record;
pub mod session;
pub mod stats;
pub mod timeline;
pub mod util;
