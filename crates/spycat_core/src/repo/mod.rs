//! Repository layer: the persisted entity store.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for cats and missions.
//! - Isolate SQLite query details from service orchestration.
//! - Run every invariant-bearing check-then-write inside one `IMMEDIATE`
//!   transaction, so racing connections serialize on SQLite's writer lock.
//!
//! # Invariants
//! - Repositories only accept connections migrated to `latest_version()`.
//! - Failed operations roll back; no partial writes survive an error.

pub mod cat_repo;
pub mod mission_repo;

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::cat::{CatId, CatValidationError};
use crate::model::mission::{LifecycleError, MissionId, TargetId};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Identity of a record that a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Cat(CatId),
    Mission(MissionId),
    /// Target scoped to the mission it was looked up through.
    Target {
        mission_id: MissionId,
        target_id: TargetId,
    },
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cat(id) => write!(f, "cat {id}"),
            Self::Mission(id) => write!(f, "mission {id}"),
            Self::Target {
                mission_id,
                target_id,
            } => write!(f, "target {target_id} in mission {mission_id}"),
        }
    }
}

/// Repository error for entity persistence and lifecycle-guarded writes.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(EntityRef),
    /// A lifecycle rule rejected the write; nothing was persisted.
    Rule(LifecycleError),
    Validation(CatValidationError),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(entity) => write!(f, "{entity} not found"),
            Self::Rule(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Rule(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::NotFound(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<LifecycleError> for RepoError {
    fn from(value: LifecycleError) -> Self {
        Self::Rule(value)
    }
}

impl From<CatValidationError> for RepoError {
    fn from(value: CatValidationError) -> Self {
        Self::Validation(value)
    }
}

const REQUIRED_TABLES: [&str; 3] = ["cats", "missions", "targets"];

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in REQUIRED_TABLES {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    Ok(())
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
