use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ft_cli::commands::{chart, events, migrate, record, session, stats, timeline, util};
use ft_cli::{Cli, Commands, Config, SessionAction};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(ft_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = ft_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let mut stdout = std::io::stdout().lock();

    match &cli.command {
        Some(Commands::Session(action)) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            match action {
                SessionAction::Start { at } => {
                    let at = util::time_or_now(at.as_deref())?;
                    session::start(&mut stdout, &mut db, at)?;
                }
                SessionAction::Current => session::current(&mut stdout, &db)?,
            }
        }
        Some(Commands::Record {
            path,
            title,
            at,
            offset,
        }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            let at = util::time_or_now(at.as_deref())?;
            record::run(&mut stdout, &mut db, path, title, at, *offset)?;
        }
        Some(Commands::Events { all }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            events::run(&mut stdout, &db, *all)?;
        }
        Some(Commands::Stats { as_of, json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            let as_of = util::time_or_now(as_of.as_deref())?;
            stats::run(&mut stdout, &db, as_of, *json)?;
        }
        Some(Commands::Chart { top, as_of, json }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let as_of = util::time_or_now(as_of.as_deref())?;
            chart::run(&mut stdout, &db, top.unwrap_or(config.top_n), as_of, *json)?;
        }
        Some(Commands::Timeline { as_of }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            let close_at = as_of.as_deref().map(util::parse_datetime).transpose()?;
            timeline::run(&mut stdout, &db, close_at)?;
        }
        Some(Commands::Migrate { file }) => {
            // Migration is a pure transform; no database needed.
            migrate::run(&mut stdout, std::io::stdin().lock(), file.as_deref())?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
