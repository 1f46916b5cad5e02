//! Retention data types

use std::path::PathBuf;
use std::time::SystemTime;

/// One stored evidence file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceFile {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub size_bytes: u64,
}

/// Summary of the evidence directory.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageInfo {
    pub file_count: usize,
    pub total_size_mb: f64,
    pub oldest: Option<SystemTime>,
    pub newest: Option<SystemTime>,
}
