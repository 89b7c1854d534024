//! Service-level failure taxonomy.
//!
//! # Invariants
//! - Every variant is recoverable by the caller; none is process-fatal.
//! - `ValidationUnavailable` and `Storage` are infrastructure failures that a
//!   caller may retry; everything else is a business-rule or input failure.

use crate::breeds::BreedError;
use crate::model::cat::CatId;
use crate::model::mission::{LifecycleError, MissionId, TargetId};
use crate::repo::{EntityRef, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    NotFound(EntityRef),
    /// Malformed or out-of-range field.
    InvalidInput(String),
    /// Breed is not in the upstream vocabulary.
    InvalidBreed(String),
    /// Breed vocabulary could not be checked.
    ValidationUnavailable(BreedError),
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
    /// Deletion blocked by assignment state.
    Conflict(String),
    Storage(RepoError),
}

impl ServiceError {
    /// True for failures caused by infrastructure rather than caller input.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::ValidationUnavailable(_) | Self::Storage(_))
    }

    /// Stable machine-readable code, used as `error_code` in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidBreed(_) => "invalid_breed",
            Self::ValidationUnavailable(_) => "validation_unavailable",
            Self::DuplicateTarget { .. } => "duplicate_target",
            Self::AlreadyAssigned { .. } => "already_assigned",
            Self::CatBusy { .. } => "cat_busy",
            Self::Frozen { .. } => "frozen",
            Self::MissionAlreadyCompleted { .. } => "mission_already_completed",
            Self::Conflict(_) => "conflict",
            Self::Storage(_) => "storage_error",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(entity) => write!(f, "{entity} not found"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::InvalidBreed(breed) => write!(f, "unknown cat breed `{breed}`"),
            Self::ValidationUnavailable(err) => {
                write!(f, "breed validation unavailable: {err}")
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
            Self::Frozen { target_id } => write!(f, "notes of target {target_id} are frozen"),
            Self::MissionAlreadyCompleted { mission_id } => {
                write!(f, "mission {mission_id} is already completed")
            }
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::Storage(err) => write!(f, "storage error: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ValidationUnavailable(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LifecycleError> for ServiceError {
    fn from(value: LifecycleError) -> Self {
        match value {
            LifecycleError::DuplicateTarget { name, country } => {
                Self::DuplicateTarget { name, country }
            }
            LifecycleError::AlreadyAssigned { mission_id, cat_id } => {
                Self::AlreadyAssigned { mission_id, cat_id }
            }
            LifecycleError::CatBusy {
                cat_id,
                active_mission_id,
            } => Self::CatBusy {
                cat_id,
                active_mission_id,
            },
            LifecycleError::Frozen { target_id } => Self::Frozen { target_id },
            LifecycleError::MissionAlreadyCompleted { mission_id } => {
                Self::MissionAlreadyCompleted { mission_id }
            }
            LifecycleError::AssignedMissionDelete { .. }
            | LifecycleError::CatHasActiveMission { .. } => Self::Conflict(value.to_string()),
            LifecycleError::InvalidTargetCount(_)
            | LifecycleError::BlankTargetField { .. }
            | LifecycleError::CompletionIrreversible { .. } => {
                Self::InvalidInput(value.to_string())
            }
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(entity) => Self::NotFound(entity),
            RepoError::Rule(err) => err.into(),
            RepoError::Validation(err) => Self::InvalidInput(err.to_string()),
            other => Self::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ServiceError;
    use crate::breeds::BreedError;
    use crate::db::DbError;
    use crate::model::mission::LifecycleError;
    use crate::repo::{EntityRef, RepoError};

    #[test]
    fn lifecycle_rules_map_to_service_kinds() {
        let err: ServiceError = RepoError::Rule(LifecycleError::AssignedMissionDelete {
            mission_id: 1,
            cat_id: 2,
        })
        .into();
        assert_eq!(err.code(), "conflict");

        let err: ServiceError = LifecycleError::InvalidTargetCount(4).into();
        assert_eq!(err.code(), "invalid_input");

        let err: ServiceError = LifecycleError::CompletionIrreversible { target_id: 3 }.into();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn infrastructure_failures_are_distinguishable() {
        let storage: ServiceError =
            RepoError::Db(DbError::Sqlite(rusqlite::Error::InvalidQuery)).into();
        assert!(storage.is_infrastructure());

        let upstream = ServiceError::ValidationUnavailable(BreedError::UpstreamUnavailable(
            "timeout".to_string(),
        ));
        assert!(upstream.is_infrastructure());

        assert!(!ServiceError::InvalidBreed("Dragon".to_string()).is_infrastructure());
        assert!(!ServiceError::NotFound(EntityRef::Cat(1)).is_infrastructure());
    }
}
