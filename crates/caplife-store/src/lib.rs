//! Caplife Store
//!
//! Filesystem implementation of the capture tree:
//!
//! ```text
//! <root>/<class>/            hot files  (<prefix>_<seq>.<ext>)
//! <root>/<class>/<0-23>/     cold files for that hour of day
//! ```
//!
//! The only commit point for any move is a single `rename(2)`. Files are never
//! copied, so a reader sees each file in exactly one place at every instant and
//! the mtime travels with it.

#![warn(missing_docs)]

mod error;
mod fs_store;
mod layout;
mod relocate;
mod tracker;

pub use error::StoreError;
pub use fs_store::{ClassOccupancy, FsStore};
pub use layout::CaptureLayout;
pub use relocate::{list_classified, relocate_into};
pub use tracker::HotWindowTracker;
