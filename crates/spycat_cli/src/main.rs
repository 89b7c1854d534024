//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `spycat_core` wiring against the configured database.
//! - Optionally check one breed name against the live vocabulary.

use clap::{Parser, Subcommand};
use log::info;
use spycat_core::db::migrations::current_version;
use spycat_core::db::open_db;
use spycat_core::{
    init_logging_from_config, BreedCache, BreedValidator, CatRepository, CoreConfig, Mission,
    MissionRepository, SqliteCatRepository, SqliteMissionRepository, TheCatApiSource,
};
use std::error::Error;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "spycat_cli",
    version,
    about = "Status probe for the spy cat agency store"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print schema version and record counts (default)
    Status,
    /// Check one breed name against the live vocabulary
    Breed {
        /// Breed name, matched case-insensitively
        name: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("spycat_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::from_env()?;
    init_logging_from_config(&config)?;

    println!("spycat_core version={}", spycat_core::core_version());

    match cli.command.unwrap_or(Command::Status) {
        Command::Status => print_status(&config),
        Command::Breed { name } => check_breed(&config, &name),
    }
}

fn print_status(config: &CoreConfig) -> Result<(), Box<dyn Error>> {
    let mut conn = open_db(&config.database_path)?;
    println!("database path={}", config.database_path.display());
    println!("schema version={}", current_version(&conn)?);

    let cats = SqliteCatRepository::try_new(&mut conn)?.list_cats()?.len();
    let missions = SqliteMissionRepository::try_new(&mut conn)?.list_missions()?;
    let active = count_active(&missions);

    println!("cats={cats} missions={} active_missions={active}", missions.len());
    info!(
        "event=cli_status module=cli status=ok cats={cats} missions={} active_missions={active}",
        missions.len()
    );
    Ok(())
}

/// Missions not yet completed, assigned or not.
fn count_active(missions: &[Mission]) -> usize {
    missions.iter().filter(|mission| !mission.completed).count()
}

fn check_breed(config: &CoreConfig, name: &str) -> Result<(), Box<dyn Error>> {
    let cache = BreedCache::new(TheCatApiSource::from_config(config), config.breed_cache_ttl());
    let known = cache.is_known_breed(name)?;
    println!(
        "breed `{}` known={known} vocabulary_size={}",
        name.trim(),
        cache.cached_len().unwrap_or(0)
    );
    Ok(())
}
