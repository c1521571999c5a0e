//! Leadscout Core - canonical lead model and pure pipeline stages
//!
//! This crate provides the foundational primitives:
//! - the `Lead` record every source normalizes into, with identity keys
//! - union-policy merging with trust-ranked conflict resolution
//! - monotonic digital-presence scoring
//! - per-run reporting types

pub mod lead;
pub mod merge;
pub mod report;
pub mod score;

pub use lead::*;
pub use merge::*;
pub use report::*;
pub use score::*;

/// Upper bound of the presence score range
pub const MAX_SCORE: f64 = 100.0;

/// Minimum digits for a phone number to count as an identity field
pub const MIN_PHONE_DIGITS: usize = 8;
