use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    /// The camera could not be opened, or stayed unusable after the reopen budget ran out.
    #[error("Camera device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A single frame read or capture failed; the cycle is skipped.
    #[error("Transient capture failure: {0}")]
    TransientCaptureFailure(String),

    #[error("Frame dimensions differ: {left_width}x{left_height} vs {right_width}x{right_height}")]
    DimensionMismatch {
        left_width: usize,
        left_height: usize,
        right_width: usize,
        right_height: usize,
    },

    #[error("Storage I/O error: {0}")]
    StorageIo(String),

    #[error("Classifier degraded: {0}")]
    ClassifierDegraded(String),

    #[error("Reference image not found: {}", .0.display())]
    ReferenceNotFound(PathBuf),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Failed to encode image: {0}")]
    EncodeError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CaptureError {
    /// Only an unusable camera may stop the capture loop; everything else is
    /// contained within a single cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CaptureError::DeviceUnavailable(_))
    }

    pub fn dimension_mismatch(left: (usize, usize), right: (usize, usize)) -> Self {
        CaptureError::DimensionMismatch {
            left_width: left.0,
            left_height: left.1,
            right_width: right.0,
            right_height: right.1,
        }
    }
}

pub type Result<T> = std::result::Result<T, CaptureError>;
