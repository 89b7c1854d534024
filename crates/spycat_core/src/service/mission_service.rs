//! Mission lifecycle use-case service.
//!
//! # Responsibility
//! - Create missions with a validated 1..=3 target set.
//! - Assign cats under the one-active-mission-per-cat rule.
//! - Update targets under the notes-freeze rule with auto-completion.
//! - Delete missions only while unassigned.
//!
//! # Invariants
//! - Rule checks and writes for one operation share one repository
//!   transaction; this layer adds no check-then-act of its own.
//! - Mutating operations return the mission read model after the change.

use crate::model::cat::CatId;
use crate::model::mission::{
    validate_new_targets, Mission, MissionId, NewTarget, TargetId, TargetUpdate,
};
use crate::repo::mission_repo::MissionRepository;
use crate::repo::EntityRef;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::log_failure;
use log::info;

/// Mission lifecycle engine over a repository implementation.
pub struct MissionService<R: MissionRepository> {
    repo: R,
}

impl<R: MissionRepository> MissionService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an unassigned mission with its targets.
    ///
    /// Fails with `InvalidInput` outside 1..=3 targets or on blank fields and
    /// with `DuplicateTarget` at the first normalized `(name, country)` repeat.
    pub fn create_mission(&mut self, targets: &[NewTarget]) -> ServiceResult<Mission> {
        let result = validate_new_targets(targets)
            .map_err(ServiceError::from)
            .and_then(|()| {
                self.repo
                    .create_mission(targets)
                    .map_err(ServiceError::from)
            });
        match &result {
            Ok(mission) => info!(
                "event=mission_create module=service status=ok mission_id={} targets={}",
                mission.id,
                mission.targets.len()
            ),
            Err(err) => log_failure("mission_create", err),
        }
        result
    }

    /// All missions ordered by id, with targets.
    pub fn list_missions(&self) -> ServiceResult<Vec<Mission>> {
        Ok(self.repo.list_missions()?)
    }

    pub fn get_mission(&self, id: MissionId) -> ServiceResult<Mission> {
        self.repo
            .get_mission(id)?
            .ok_or(ServiceError::NotFound(EntityRef::Mission(id)))
    }

    /// The cat's non-completed mission, if it has one.
    pub fn active_mission_for_cat(&self, cat_id: CatId) -> ServiceResult<Option<Mission>> {
        Ok(self.repo.active_mission_for_cat(cat_id)?)
    }

    /// Assigns `cat_id` to an unassigned mission.
    ///
    /// Assignment is single-shot: a second call fails with `AlreadyAssigned`
    /// even for the same cat. A cat owning any non-completed mission fails
    /// with `CatBusy`.
    pub fn assign_cat(&mut self, mission_id: MissionId, cat_id: CatId) -> ServiceResult<Mission> {
        let result = self
            .repo
            .assign_cat(mission_id, cat_id)
            .map_err(ServiceError::from);
        match &result {
            Ok(_) => info!(
                "event=mission_assign module=service status=ok mission_id={mission_id} cat_id={cat_id}"
            ),
            Err(err) => log_failure("mission_assign", err),
        }
        result
    }

    /// Applies notes and/or completion changes to one target, then completes
    /// the mission when every target is completed.
    pub fn update_target(
        &mut self,
        mission_id: MissionId,
        target_id: TargetId,
        update: &TargetUpdate,
    ) -> ServiceResult<Mission> {
        match self.repo.update_target(mission_id, target_id, update) {
            Ok(outcome) => {
                info!(
                    "event=target_update module=service status=ok mission_id={mission_id} target_id={target_id} notes_changed={} mission_completed={}",
                    update.notes.is_some(),
                    outcome.mission.completed
                );
                if outcome.mission_completed_now {
                    info!(
                        "event=mission_complete module=service status=ok mission_id={mission_id} cat_id={}",
                        outcome
                            .mission
                            .cat_id
                            .map_or_else(|| "none".to_string(), |id| id.to_string())
                    );
                }
                Ok(outcome.mission)
            }
            Err(err) => {
                let err = ServiceError::from(err);
                log_failure("target_update", &err);
                Err(err)
            }
        }
    }

    /// Deletes an unassigned mission together with its targets.
    pub fn delete_mission(&mut self, id: MissionId) -> ServiceResult<()> {
        let result = self.repo.delete_mission(id).map_err(ServiceError::from);
        match &result {
            Ok(()) => info!("event=mission_delete module=service status=ok mission_id={id}"),
            Err(err) => log_failure("mission_delete", err),
        }
        result
    }
}
