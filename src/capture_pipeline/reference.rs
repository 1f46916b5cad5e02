//! Reference image module
//!
//! Owns the single "nothing of interest" baseline image used by
//! reference-comparison modes.

mod store;

pub use store::ReferenceStore;
