//! Breed vocabulary validation.
//!
//! # Responsibility
//! - Answer "is this breed known?" for cat creation.
//! - Keep the remote vocabulary behind a time-bounded, lock-guarded cache.
//!
//! # Invariants
//! - Lookups and cached entries share one normalization: trim + lowercase.
//! - Infrastructure failures surface as `BreedError::UpstreamUnavailable`,
//!   never as "unknown breed".

mod cache;
mod source;

pub use cache::{BreedCache, Clock, SystemClock};
pub use source::{parse_breed_names, BreedSource, TheCatApiSource};

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from breed validation infrastructure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreedError {
    /// The remote vocabulary could not be fetched or decoded.
    UpstreamUnavailable(String),
}

impl Display for BreedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UpstreamUnavailable(reason) => {
                write!(f, "breed vocabulary upstream unavailable: {reason}")
            }
        }
    }
}

impl Error for BreedError {}

/// Contract consumed by the cat registry.
pub trait BreedValidator: Send + Sync {
    fn is_known_breed(&self, name: &str) -> Result<bool, BreedError>;
}

pub fn normalize_breed(name: &str) -> String {
    name.trim().to_lowercase()
}
