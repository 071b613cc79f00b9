//! Focus tracker CLI library.
//!
//! This crate provides the `ft` command line: recording focus changes and
//! answering the dashboard's session queries.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, SessionAction};
pub use config::Config;
