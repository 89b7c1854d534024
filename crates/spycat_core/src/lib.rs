//! Core domain logic for the spy cat agency.
//! This crate is the single source of truth for business invariants: mission
//! target sets, one active mission per cat, notes freezing, and automatic
//! mission completion.

pub mod breeds;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use breeds::{BreedCache, BreedError, BreedSource, BreedValidator, Clock, TheCatApiSource};
pub use config::{ConfigError, CoreConfig};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::cat::{Cat, CatId, NewCat};
pub use model::mission::{
    LifecycleError, Mission, MissionId, NewTarget, Target, TargetId, TargetUpdate,
};
pub use repo::cat_repo::{CatRepository, SqliteCatRepository};
pub use repo::mission_repo::{MissionRepository, SqliteMissionRepository, TargetUpdateOutcome};
pub use repo::{EntityRef, RepoError, RepoResult};
pub use service::cat_service::CatService;
pub use service::error::{ServiceError, ServiceResult};
pub use service::mission_service::MissionService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
