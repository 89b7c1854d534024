//! Domain model for cats, missions and targets.
//!
//! # Responsibility
//! - Define canonical records shared by repositories and services.
//! - Hold the pure lifecycle rules (no I/O) that repositories evaluate inside
//!   their write transactions.
//!
//! # Invariants
//! - A mission holds 1..=3 targets with unique normalized `(name, country)`.
//! - Mission `cat_id` is set at most once and never cleared.
//! - Target completion is monotonic.

pub mod cat;
pub mod mission;
