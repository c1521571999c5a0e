//! Leadscout source adapters
//!
//! Every external data source sits behind the [`LeadSource`] capability:
//! - **Google Places**: text search plus per-place details
//! - **SerpAPI**: `google_maps` engine search
//!
//! Adapters are isolated failure domains: an error is reported for its
//! source and never aborts the others. The registry turns configuration
//! into the enabled adapter set, recording key-less sources as disabled
//! without ever building a client for them.

pub mod normalize;
pub mod places;
pub mod raw;
pub mod registry;
pub mod serp;
pub mod traits;

pub use normalize::*;
pub use places::*;
pub use raw::*;
pub use registry::*;
pub use serp::*;
pub use traits::*;
