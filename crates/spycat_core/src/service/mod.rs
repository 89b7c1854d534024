//! Core use-case services.
//!
//! # Responsibility
//! - `CatService`: the cat registry, gated on breed validation at creation.
//! - `MissionService`: the mission lifecycle engine.
//! - Map repository and rule failures onto one caller-facing taxonomy.
//!
//! # Invariants
//! - Services never bypass repository transactions for writes.
//! - Every mutating operation logs one outcome event.

pub mod cat_service;
pub mod error;
pub mod mission_service;

use crate::service::error::ServiceError;
use log::{error, info};

fn log_failure(event: &str, err: &ServiceError) {
    if err.is_infrastructure() {
        error!(
            "event={event} module=service status=error error_code={} error={err}",
            err.code()
        );
    } else {
        info!(
            "event={event} module=service status=rejected error_code={}",
            err.code()
        );
    }
}
