//! Mission/target repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist missions together with their fixed target set.
//! - Execute lifecycle transitions (assign, target update, delete) as single
//!   `IMMEDIATE` transactions that load state, evaluate the rules in
//!   `model::mission`, and write.
//!
//! # Invariants
//! - A mission and its targets become visible in the same commit.
//! - "Cat has no active mission" and "set `cat_id`" commit together.
//! - A target change and the mission completion recheck commit together.
//! - Mission deletion removes targets first, then the mission, in one commit.

use crate::model::cat::CatId;
use crate::model::mission::{
    all_targets_completed, apply_target_update, validate_new_targets, LifecycleError, Mission,
    MissionId, NewTarget, Target, TargetId, TargetUpdate,
};
use crate::repo::{
    bool_to_int, ensure_connection_ready, int_to_bool, EntityRef, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

/// Result of a target update, including whether it completed the mission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUpdateOutcome {
    pub mission: Mission,
    /// True only for the update that flipped the mission to completed.
    pub mission_completed_now: bool,
}

/// Repository interface for missions and their targets.
pub trait MissionRepository {
    /// Validates and persists a new unassigned mission with its targets.
    fn create_mission(&mut self, targets: &[NewTarget]) -> RepoResult<Mission>;
    fn get_mission(&self, id: MissionId) -> RepoResult<Option<Mission>>;
    /// All missions ordered by id, each with targets ordered by id.
    fn list_missions(&self) -> RepoResult<Vec<Mission>>;
    fn load_targets(&self, mission_id: MissionId) -> RepoResult<Vec<Target>>;
    /// The non-completed mission owned by `cat_id`, if any.
    fn active_mission_for_cat(&self, cat_id: CatId) -> RepoResult<Option<Mission>>;
    fn assign_cat(&mut self, mission_id: MissionId, cat_id: CatId) -> RepoResult<Mission>;
    fn update_target(
        &mut self,
        mission_id: MissionId,
        target_id: TargetId,
        update: &TargetUpdate,
    ) -> RepoResult<TargetUpdateOutcome>;
    fn delete_mission(&mut self, id: MissionId) -> RepoResult<()>;
}

/// SQLite-backed mission repository.
pub struct SqliteMissionRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteMissionRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl MissionRepository for SqliteMissionRepository<'_> {
    fn create_mission(&mut self, targets: &[NewTarget]) -> RepoResult<Mission> {
        validate_new_targets(targets)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("INSERT INTO missions (cat_id, completed) VALUES (NULL, 0);", [])?;
        let mission_id = tx.last_insert_rowid();

        for target in targets {
            tx.execute(
                "INSERT INTO targets (mission_id, name, country, notes, completed)
                 VALUES (?1, ?2, ?3, ?4, 0);",
                params![
                    mission_id,
                    target.name.trim(),
                    target.country.trim(),
                    target.notes.as_str(),
                ],
            )?;
        }

        let mission = load_mission(&tx, mission_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("mission {mission_id} missing after insert"))
        })?;
        tx.commit()?;
        Ok(mission)
    }

    fn get_mission(&self, id: MissionId) -> RepoResult<Option<Mission>> {
        load_mission(self.conn, id)
    }

    fn list_missions(&self) -> RepoResult<Vec<Mission>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, cat_id, completed
             FROM missions
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut missions = Vec::new();
        while let Some(row) = rows.next()? {
            let mut mission = parse_mission_row(row)?;
            mission.targets = load_targets(self.conn, mission.id)?;
            missions.push(mission);
        }
        Ok(missions)
    }

    fn load_targets(&self, mission_id: MissionId) -> RepoResult<Vec<Target>> {
        load_targets(self.conn, mission_id)
    }

    fn active_mission_for_cat(&self, cat_id: CatId) -> RepoResult<Option<Mission>> {
        match active_mission_id(self.conn, cat_id)? {
            Some(mission_id) => load_mission(self.conn, mission_id),
            None => Ok(None),
        }
    }

    fn assign_cat(&mut self, mission_id: MissionId, cat_id: CatId) -> RepoResult<Mission> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mission = load_mission(&tx, mission_id)?
            .ok_or(RepoError::NotFound(EntityRef::Mission(mission_id)))?;
        if !cat_exists(&tx, cat_id)? {
            return Err(RepoError::NotFound(EntityRef::Cat(cat_id)));
        }
        mission.ensure_assignable()?;
        if let Some(active_mission_id) = active_mission_id(&tx, cat_id)? {
            return Err(LifecycleError::CatBusy {
                cat_id,
                active_mission_id,
            }
            .into());
        }

        let changed = tx.execute(
            "UPDATE missions
             SET
                cat_id = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND cat_id IS NULL;",
            params![mission_id, cat_id],
        )?;
        if changed != 1 {
            return Err(RepoError::InvalidData(format!(
                "mission {mission_id} changed during assignment"
            )));
        }

        let mission = load_mission(&tx, mission_id)?
            .ok_or(RepoError::NotFound(EntityRef::Mission(mission_id)))?;
        tx.commit()?;
        Ok(mission)
    }

    fn update_target(
        &mut self,
        mission_id: MissionId,
        target_id: TargetId,
        update: &TargetUpdate,
    ) -> RepoResult<TargetUpdateOutcome> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mission = load_mission(&tx, mission_id)?
            .ok_or(RepoError::NotFound(EntityRef::Mission(mission_id)))?;
        let target = mission
            .target(target_id)
            .ok_or(RepoError::NotFound(EntityRef::Target {
                mission_id,
                target_id,
            }))?;

        let next = apply_target_update(&mission, target, update)?;
        if &next != target {
            tx.execute(
                "UPDATE targets
                 SET
                    notes = ?3,
                    completed = ?4,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1
                   AND mission_id = ?2;",
                params![
                    target_id,
                    mission_id,
                    next.notes.as_str(),
                    bool_to_int(next.completed)
                ],
            )?;
        }

        // Runs on every update: an earlier call may have left completion pending.
        let targets = load_targets(&tx, mission_id)?;
        let mission_completed_now = !mission.completed && all_targets_completed(&targets);
        if mission_completed_now {
            tx.execute(
                "UPDATE missions
                 SET
                    completed = 1,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                [mission_id],
            )?;
        }

        let mission = load_mission(&tx, mission_id)?
            .ok_or(RepoError::NotFound(EntityRef::Mission(mission_id)))?;
        tx.commit()?;
        Ok(TargetUpdateOutcome {
            mission,
            mission_completed_now,
        })
    }

    fn delete_mission(&mut self, id: MissionId) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mission =
            load_mission(&tx, id)?.ok_or(RepoError::NotFound(EntityRef::Mission(id)))?;
        mission.ensure_deletable()?;

        tx.execute("DELETE FROM targets WHERE mission_id = ?1;", [id])?;
        tx.execute("DELETE FROM missions WHERE id = ?1;", [id])?;
        tx.commit()?;
        Ok(())
    }
}

fn load_mission(conn: &Connection, id: MissionId) -> RepoResult<Option<Mission>> {
    let mut stmt = conn.prepare(
        "SELECT id, cat_id, completed
         FROM missions
         WHERE id = ?1;",
    )?;
    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => {
            let mut mission = parse_mission_row(row)?;
            mission.targets = load_targets(conn, id)?;
            Ok(Some(mission))
        }
        None => Ok(None),
    }
}

fn load_targets(conn: &Connection, mission_id: MissionId) -> RepoResult<Vec<Target>> {
    let mut stmt = conn.prepare(
        "SELECT id, mission_id, name, country, notes, completed
         FROM targets
         WHERE mission_id = ?1
         ORDER BY id ASC;",
    )?;
    let mut rows = stmt.query([mission_id])?;
    let mut targets = Vec::new();
    while let Some(row) = rows.next()? {
        targets.push(parse_target_row(row)?);
    }
    Ok(targets)
}

fn active_mission_id(conn: &Connection, cat_id: CatId) -> RepoResult<Option<MissionId>> {
    let id = conn
        .query_row(
            "SELECT id
             FROM missions
             WHERE cat_id = ?1
               AND completed = 0
             ORDER BY id ASC
             LIMIT 1;",
            [cat_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

fn cat_exists(conn: &Connection, cat_id: CatId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM cats WHERE id = ?1);",
        [cat_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_mission_row(row: &Row<'_>) -> RepoResult<Mission> {
    Ok(Mission {
        id: row.get("id")?,
        cat_id: row.get("cat_id")?,
        completed: int_to_bool(row.get("completed")?, "missions.completed")?,
        targets: Vec::new(),
    })
}

fn parse_target_row(row: &Row<'_>) -> RepoResult<Target> {
    Ok(Target {
        id: row.get("id")?,
        mission_id: row.get("mission_id")?,
        name: row.get("name")?,
        country: row.get("country")?,
        notes: row.get("notes")?,
        completed: int_to_bool(row.get("completed")?, "targets.completed")?,
    })
}
