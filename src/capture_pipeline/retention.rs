//! Retention module
//!
//! Keeps the evidence directory under a fixed file count, evicting the
//! oldest files first. Ordering is by modification time, which is the
//! contract shared with anything else that reviews or trims the directory.

mod policy;
mod sweep;
pub mod types;

pub use policy::RetentionPolicy;
pub use sweep::{EVIDENCE_EXTENSIONS, list_evidence, plan_sweep, storage_info, sweep};
pub use types::{EvidenceFile, StorageInfo};
