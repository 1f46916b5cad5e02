//! Differencing parameters and results

/// Smoothing and binarisation settings for a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffParams {
    /// Gaussian kernel size; 0 compares raw pixels
    pub blur_kernel: usize,
    /// A pixel counts as changed when its absolute difference exceeds this
    pub binary_threshold: u8,
}

impl Default for DiffParams {
    fn default() -> Self {
        Self {
            blur_kernel: 0,
            binary_threshold: 50,
        }
    }
}

/// Outcome of comparing two frames against an event threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffResult {
    pub changed_pixels: u64,
    pub threshold: u64,
}

impl DiffResult {
    pub fn exceeds_threshold(&self) -> bool {
        self.changed_pixels > self.threshold
    }
}
