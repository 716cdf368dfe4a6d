//! Caplife Domain Layer
//!
//! Core model and classification primitives for the hot/cold capture storage
//! lifecycle. Every other crate in the workspace builds on the concepts here.
//!
//! ## Key Concepts
//!
//! - **ArtifactClass**: the kind of produced file (segment, capture, thumbnail, metadata),
//!   each with its own hot capacity and cold retention
//! - **CaptureEntry**: a point-in-time record of one file on disk
//! - **BucketKey**: one of the 24 reusable hour-of-day cold buckets
//! - **Location**: where a capture unit lives (flat legacy, hot, cold bucket, deleted)
//! - **HotWindow**: the newest-N / overflow partition of a hot directory
//!
//! ## Architecture
//!
//! - Pure logic only, no filesystem access
//! - Trait seams (`Clock`, `CaptureStore`) for everything with side effects
//! - Infrastructure implementations live in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bucket;
pub mod class;
pub mod classify;
pub mod location;
pub mod retention;
pub mod traits;
pub mod window;

// Re-exports for convenience
pub use bucket::{BucketClock, BucketKey};
pub use class::ArtifactClass;
pub use classify::{classify_name, newest_first, CaptureEntry, ParsedName};
pub use location::{Location, Mode};
pub use retention::BucketAssessment;
pub use traits::{CaptureStore, Clock, FaultKind, ManualClock, RelocateOutcome, StoreFault, SystemClock};
pub use window::HotWindow;
