//! Leadscout runtime - run orchestration
//!
//! One run: fan out to every enabled source concurrently, wait for the
//! whole fleet, then normalize, merge, score and publish a single
//! consistent batch. A failing source is contained; a failing fleet
//! aborts the run before anything reaches the sink.

pub mod pipeline;
pub mod sink;

pub use pipeline::*;
pub use sink::*;
