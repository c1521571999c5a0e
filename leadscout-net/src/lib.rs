//! Leadscout networking layer
//!
//! Shared HTTP plumbing for source adapters: client construction, bounded
//! retry with backoff, and per-source rolling-window rate limiting.

pub mod client;
pub mod limiter;

pub use client::*;
pub use limiter::*;
