use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::capture_pipeline::codec::FrameWriter;
use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::frame::Frame;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Upper bound on same-second suffixes tried before giving up.
const MAX_SUFFIX: u32 = 10_000;

pub struct EvidenceSink {
    directory: PathBuf,
    prefix: String,
    writer: Box<dyn FrameWriter + Send>,
}

impl EvidenceSink {
    pub fn new(
        directory: impl Into<PathBuf>,
        prefix: impl Into<String>,
        writer: Box<dyn FrameWriter + Send>,
    ) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
            writer,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Writes `frame` to `<prefix>_<YYYYmmdd_HHMMSS>.<ext>`, appending `_<n>`
    /// when that name is taken.
    ///
    /// Names are claimed with exclusive creation, so two saves within the
    /// same second never overwrite each other even when they race.
    pub fn save(&self, frame: &Frame, timestamp: DateTime<Local>) -> Result<PathBuf> {
        fs::create_dir_all(&self.directory).map_err(|e| storage_error(&self.directory, e))?;

        let stamp = timestamp.format(TIMESTAMP_FORMAT).to_string();
        let extension = self.writer.extension();

        for suffix in 0..MAX_SUFFIX {
            let name = if suffix == 0 {
                format!("{}_{}.{}", self.prefix, stamp, extension)
            } else {
                format!("{}_{}_{}.{}", self.prefix, stamp, suffix, extension)
            };
            let path = self.directory.join(name);

            let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "Evidence name taken, trying next suffix");
                    continue;
                }
                Err(e) => return Err(storage_error(&path, e)),
            };

            if let Err(e) = self.write_to(frame, file) {
                // Do not leave a truncated image behind for reviewers.
                let _ = fs::remove_file(&path);
                return Err(e);
            }
            info!(path = %path.display(), "Evidence saved");
            return Ok(path);
        }

        Err(CaptureError::StorageIo(format!(
            "no free evidence name for {} in {}",
            stamp,
            self.directory.display()
        )))
    }

    fn write_to(&self, frame: &Frame, file: fs::File) -> Result<()> {
        let mut output = BufWriter::new(file);
        self.writer
            .write_frame(frame, &mut output)
            .map_err(|e| CaptureError::StorageIo(e.to_string()))?;
        output
            .flush()
            .map_err(|e| CaptureError::StorageIo(e.to_string()))
    }
}

fn storage_error(path: &Path, e: std::io::Error) -> CaptureError {
    CaptureError::StorageIo(format!("{}: {}", path.display(), e))
}
