//! Camera configuration types

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn matches(&self, dimensions: (usize, usize)) -> bool {
        (self.width as usize, self.height as usize) == dimensions
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Operating resolution of the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    /// Low resolution, sampled every cycle
    Detection,
    /// High resolution, used only to produce evidence
    Capture,
}

/// Resolution switching and recovery settings for a [`CameraRig`](super::CameraRig)
#[derive(Debug, Clone)]
pub struct RigConfig {
    pub detection: Resolution,
    pub capture: Resolution,
    /// Pause after opening before the first frame is trusted
    pub warmup: Duration,
    /// Pause after a resolution switch
    pub settle: Duration,
    /// Frames thrown away after opening and after each switch
    pub discard_frames: usize,
    /// Consecutive failed reopen attempts tolerated at runtime
    pub max_reopen_attempts: u32,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            detection: Resolution::new(320, 240),
            capture: Resolution::new(1280, 960),
            warmup: Duration::from_secs(2),
            settle: Duration::from_millis(500),
            discard_frames: 2,
            max_reopen_attempts: 3,
        }
    }
}
