use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::retention::sweep::sweep;

/// Runs [`sweep`] on its own cadence, checked from inside the capture loop.
///
/// There is no timer thread: the loop asks [`RetentionPolicy::run_if_due`]
/// once per cycle and the sweep happens inline when the interval has passed.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    directory: PathBuf,
    max_count: usize,
    interval: Duration,
    last_sweep: Instant,
}

impl RetentionPolicy {
    /// The first sweep becomes due one `interval` after `now`.
    pub fn new(
        directory: impl Into<PathBuf>,
        max_count: usize,
        interval: Duration,
        now: Instant,
    ) -> Result<Self> {
        if max_count == 0 {
            return Err(CaptureError::InvalidParameter(
                "retention max count must be positive".to_string(),
            ));
        }
        Ok(Self {
            directory: directory.into(),
            max_count,
            interval,
            last_sweep: now,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    pub fn last_sweep(&self) -> Instant {
        self.last_sweep
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_sweep) >= self.interval
    }

    /// Sweeps when due and returns the number of deleted files.
    ///
    /// A failed sweep is logged and still counts as the latest sweep, so a
    /// broken directory is retried on the next interval rather than every cycle.
    pub fn run_if_due(&mut self, now: Instant) -> Option<usize> {
        if !self.is_due(now) {
            return None;
        }
        self.last_sweep = now;
        match sweep(&self.directory, self.max_count) {
            Ok(deleted) => {
                if deleted > 0 {
                    info!(deleted, "Cleaned up old evidence");
                }
                Some(deleted)
            }
            Err(e) => {
                warn!(directory = %self.directory.display(), "Retention sweep failed: {}", e);
                None
            }
        }
    }
}
