//! Mission and target records plus the lifecycle rules that govern them.
//!
//! # Responsibility
//! - Define the mission/target read models returned to callers.
//! - Evaluate creation, assignment, target-update and deletion rules as pure
//!   functions over already-loaded state.
//!
//! # Invariants
//! - Target count is fixed at creation and stays within
//!   `MIN_TARGETS..=MAX_TARGETS`.
//! - Normalized `(name, country)` pairs are unique within one mission.
//! - Notes are frozen once the target or its mission is completed.
//! - A mission is completed exactly when it has targets and all of them are.
//!
//! Mission stages: `Unassigned+Incomplete -> Assigned+Incomplete ->
//! Assigned+Complete`. No transition unassigns or reopens a mission.

use crate::model::cat::CatId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type MissionId = i64;
pub type TargetId = i64;

pub const MIN_TARGETS: usize = 1;
pub const MAX_TARGETS: usize = 3;

/// One objective inside a mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub mission_id: MissionId,
    pub name: String,
    pub country: String,
    pub notes: String,
    pub completed: bool,
}

/// Mission read model with its targets ordered by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub id: MissionId,
    /// `None` while unassigned.
    pub cat_id: Option<CatId>,
    pub completed: bool,
    pub targets: Vec<Target>,
}

/// Target descriptor supplied at mission creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTarget {
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub notes: String,
}

/// Partial target change. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetUpdate {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

/// Lifecycle rule violations. Every variant is a caller-recoverable failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    InvalidTargetCount(usize),
    BlankTargetField {
        index: usize,
        field: &'static str,
    },
    DuplicateTarget {
        name: String,
        country: String,
    },
    AlreadyAssigned {
        mission_id: MissionId,
        cat_id: CatId,
    },
    CatBusy {
        cat_id: CatId,
        active_mission_id: MissionId,
    },
    Frozen {
        target_id: TargetId,
    },
    MissionAlreadyCompleted {
        mission_id: MissionId,
    },
    CompletionIrreversible {
        target_id: TargetId,
    },
    AssignedMissionDelete {
        mission_id: MissionId,
        cat_id: CatId,
    },
    CatHasActiveMission {
        cat_id: CatId,
        mission_id: MissionId,
    },
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTargetCount(count) => write!(
                f,
                "mission must have between {MIN_TARGETS} and {MAX_TARGETS} targets, got {count}"
            ),
            Self::BlankTargetField { index, field } => {
                write!(f, "target #{index} has a blank `{field}`")
            }
            Self::DuplicateTarget { name, country } => write!(
                f,
                "targets must be unique within a mission: `{name}` / `{country}` repeats"
            ),
            Self::AlreadyAssigned { mission_id, cat_id } => {
                write!(f, "mission {mission_id} is already assigned to cat {cat_id}")
            }
            Self::CatBusy {
                cat_id,
                active_mission_id,
            } => write!(
                f,
                "cat {cat_id} already has active mission {active_mission_id}"
            ),
            Self::Frozen { target_id } => write!(
                f,
                "notes of target {target_id} are frozen because the target or mission is completed"
            ),
            Self::MissionAlreadyCompleted { mission_id } => {
                write!(f, "mission {mission_id} is already completed")
            }
            Self::CompletionIrreversible { target_id } => {
                write!(f, "target {target_id} is completed and cannot be reopened")
            }
            Self::AssignedMissionDelete { mission_id, cat_id } => write!(
                f,
                "mission {mission_id} is assigned to cat {cat_id} and cannot be deleted"
            ),
            Self::CatHasActiveMission { cat_id, mission_id } => write!(
                f,
                "cat {cat_id} owns active mission {mission_id} and cannot be deleted"
            ),
        }
    }
}

impl Error for LifecycleError {}

impl NewTarget {
    pub fn new(
        name: impl Into<String>,
        country: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            notes: notes.into(),
        }
    }

    /// Normalized identity used for the per-mission uniqueness rule.
    pub fn key(&self) -> (String, String) {
        target_key(&self.name, &self.country)
    }
}

impl TargetUpdate {
    pub fn notes(notes: impl Into<String>) -> Self {
        Self {
            notes: Some(notes.into()),
            completed: None,
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            notes: None,
            completed: Some(completed),
        }
    }
}

impl Mission {
    pub fn is_assigned(&self) -> bool {
        self.cat_id.is_some()
    }

    pub fn target(&self, target_id: TargetId) -> Option<&Target> {
        self.targets.iter().find(|target| target.id == target_id)
    }

    /// Assignment is single-shot, even for the same cat.
    pub fn ensure_assignable(&self) -> Result<(), LifecycleError> {
        match self.cat_id {
            Some(cat_id) => Err(LifecycleError::AlreadyAssigned {
                mission_id: self.id,
                cat_id,
            }),
            None => Ok(()),
        }
    }

    pub fn ensure_deletable(&self) -> Result<(), LifecycleError> {
        match self.cat_id {
            Some(cat_id) => Err(LifecycleError::AssignedMissionDelete {
                mission_id: self.id,
                cat_id,
            }),
            None => Ok(()),
        }
    }
}

/// Trim + lowercase normalization shared by uniqueness checks.
pub fn target_key(name: &str, country: &str) -> (String, String) {
    (name.trim().to_lowercase(), country.trim().to_lowercase())
}

/// Validates a creation request: count bounds, blank fields, then uniqueness
/// reported at the first collision in input order.
pub fn validate_new_targets(targets: &[NewTarget]) -> Result<(), LifecycleError> {
    if !(MIN_TARGETS..=MAX_TARGETS).contains(&targets.len()) {
        return Err(LifecycleError::InvalidTargetCount(targets.len()));
    }

    for (index, target) in targets.iter().enumerate() {
        if target.name.trim().is_empty() {
            return Err(LifecycleError::BlankTargetField {
                index,
                field: "name",
            });
        }
        if target.country.trim().is_empty() {
            return Err(LifecycleError::BlankTargetField {
                index,
                field: "country",
            });
        }
    }

    let mut seen = HashSet::with_capacity(targets.len());
    for target in targets {
        if !seen.insert(target.key()) {
            return Err(LifecycleError::DuplicateTarget {
                name: target.name.trim().to_string(),
                country: target.country.trim().to_string(),
            });
        }
    }

    Ok(())
}

/// Computes the next state of `target` for `update`.
///
/// The notes rule is evaluated against the target's prior completion state,
/// so one request cannot complete a target and edit its notes together.
pub fn apply_target_update(
    mission: &Mission,
    target: &Target,
    update: &TargetUpdate,
) -> Result<Target, LifecycleError> {
    let mut next = target.clone();

    if let Some(notes) = update.notes.as_ref() {
        if mission.completed || target.completed {
            return Err(LifecycleError::Frozen {
                target_id: target.id,
            });
        }
        next.notes = notes.clone();
    }

    if let Some(completed) = update.completed {
        if mission.completed {
            return Err(LifecycleError::MissionAlreadyCompleted {
                mission_id: mission.id,
            });
        }
        if target.completed && !completed {
            return Err(LifecycleError::CompletionIrreversible {
                target_id: target.id,
            });
        }
        next.completed = completed;
    }

    Ok(next)
}

/// True when the target set is non-empty and fully completed.
pub fn all_targets_completed(targets: &[Target]) -> bool {
    !targets.is_empty() && targets.iter().all(|target| target.completed)
}
