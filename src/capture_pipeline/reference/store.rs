use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::capture_pipeline::codec::{FrameWriter, StandardTiffWriter, TiffCompression, read_tiff_frame};
use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::frame::Frame;

/// Persists the baseline as a lossless grayscale TIFF at a well-known path.
///
/// The stored image is only ever replaced wholesale: saves go to a sibling
/// temporary file that is then renamed over the old one.
#[derive(Debug, Clone)]
pub struct ReferenceStore {
    path: PathBuf,
    writer: StandardTiffWriter,
}

impl ReferenceStore {
    pub fn new(path: impl Into<PathBuf>, compression: TiffCompression) -> Self {
        Self {
            path: path.into(),
            writer: StandardTiffWriter::new(compression),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Loads the reference as grayscale.
    pub fn load(&self) -> Result<Frame> {
        if !self.exists() {
            return Err(CaptureError::ReferenceNotFound(self.path.clone()));
        }
        Ok(read_tiff_frame(&self.path)?.into_gray())
    }

    /// Stores `frame` (converted to grayscale) as the new reference.
    pub fn save(&self, frame: &Frame) -> Result<()> {
        let gray = frame.to_gray();
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| storage_error(parent, e))?;
            }
        }

        let staging = self.path.with_extension("tiff.partial");
        {
            let file = File::create(&staging).map_err(|e| storage_error(&staging, e))?;
            let mut output = BufWriter::new(file);
            self.writer.write_frame(&gray, &mut output)?;
            output
                .into_inner()
                .map_err(|e| storage_error(&staging, e.into_error()))?
                .sync_all()
                .map_err(|e| storage_error(&staging, e))?;
        }
        fs::rename(&staging, &self.path).map_err(|e| storage_error(&self.path, e))?;

        info!(path = %self.path.display(), width = gray.width(), height = gray.height(), "Reference image saved");
        Ok(())
    }

    /// Returns the stored reference, or captures, persists and returns a
    /// fresh one when it is missing or unreadable.
    ///
    /// `capture` is expected to return a frame of the current, quiescent
    /// scene. Its failure is propagated: comparison modes cannot run without
    /// a baseline.
    #[instrument(skip(self, capture), fields(path = %self.path.display()))]
    pub fn ensure<F>(&self, capture: F) -> Result<Frame>
    where
        F: FnOnce() -> Result<Frame>,
    {
        match self.load() {
            Ok(frame) => {
                info!(width = frame.width(), height = frame.height(), "Loaded reference image");
                return Ok(frame);
            }
            Err(CaptureError::ReferenceNotFound(_)) => {
                info!("No reference image yet; capturing the current scene");
            }
            Err(e) => {
                warn!("Reference image unreadable ({}); recapturing", e);
            }
        }

        let gray = capture()?.into_gray();
        self.save(&gray)?;
        Ok(gray)
    }
}

fn storage_error(path: &Path, e: std::io::Error) -> CaptureError {
    CaptureError::StorageIo(format!("{}: {}", path.display(), e))
}
