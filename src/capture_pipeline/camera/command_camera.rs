use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::capture_pipeline::camera::device::Camera;
use crate::capture_pipeline::camera::types::Resolution;
use crate::capture_pipeline::codec::read_image_file;
use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::frame::Frame;

const WAIT_POLL: Duration = Duration::from_millis(20);

/// Settings for an external still-capture tool.
///
/// Arguments may contain `{output}`, `{width}`, `{height}` and `{quality}`,
/// substituted on every capture.
#[derive(Debug, Clone)]
pub struct CommandCameraConfig {
    pub program: String,
    pub args: Vec<String>,
    pub quality: u8,
    pub timeout: Duration,
    /// Where the tool writes its temporary output
    pub scratch_dir: PathBuf,
}

impl Default for CommandCameraConfig {
    fn default() -> Self {
        Self {
            program: "rpicam-still".to_string(),
            args: [
                "--nopreview", "-o", "{output}", "--width", "{width}", "--height", "{height}",
                "-q", "{quality}", "-t", "1000",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            quality: 85,
            timeout: Duration::from_secs(15),
            scratch_dir: std::env::temp_dir(),
        }
    }
}

/// Camera backed by one external process run per frame.
///
/// Each capture can take a few hundred milliseconds or more; nothing is
/// streamed and no memory is held between frames.
pub struct CommandCamera {
    config: CommandCameraConfig,
    resolution: Resolution,
    open: bool,
    sequence: u64,
}

impl CommandCamera {
    pub fn new(config: CommandCameraConfig) -> Self {
        Self {
            config,
            resolution: Resolution::new(320, 240),
            open: false,
            sequence: 0,
        }
    }

    fn output_path(&mut self) -> PathBuf {
        self.sequence += 1;
        self.config.scratch_dir.join(format!(
            "catnap-capture-{}-{}.jpg",
            std::process::id(),
            self.sequence
        ))
    }

    fn expand_args(&self, output: &str) -> Vec<String> {
        self.config
            .args
            .iter()
            .map(|arg| {
                arg.replace("{output}", output)
                    .replace("{width}", &self.resolution.width.to_string())
                    .replace("{height}", &self.resolution.height.to_string())
                    .replace("{quality}", &self.config.quality.to_string())
            })
            .collect()
    }

    fn capture(&mut self) -> Result<Frame> {
        let output = self.output_path();
        let args = self.expand_args(&output.to_string_lossy());
        debug!(program = %self.config.program, resolution = %self.resolution, "Running capture command");

        let mut child = Command::new(&self.config.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                CaptureError::DeviceUnavailable(format!("{}: {}", self.config.program, e))
            })?;

        // Drain stderr on the side so a chatty tool cannot block on a full pipe.
        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });

        let status = wait_with_timeout(&mut child, self.config.timeout);
        let stderr_text = stderr
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        let result = match status {
            Ok(Some(status)) if status.success() => read_image_file(&output)
                .map_err(|e| CaptureError::TransientCaptureFailure(e.to_string())),
            Ok(Some(status)) => Err(CaptureError::TransientCaptureFailure(format!(
                "{} exited with {}: {}",
                self.config.program,
                status,
                stderr_text.trim()
            ))),
            Ok(None) => Err(CaptureError::TransientCaptureFailure(format!(
                "{} timed out after {:?}",
                self.config.program, self.config.timeout
            ))),
            Err(e) => Err(CaptureError::TransientCaptureFailure(e.to_string())),
        };

        if output.exists() {
            if let Err(e) = std::fs::remove_file(&output) {
                warn!(path = %output.display(), "Failed to remove capture scratch file: {}", e);
            }
        }
        result
    }
}

/// `Ok(None)` means the process was killed after `timeout`.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            child.kill()?;
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(WAIT_POLL);
    }
}

impl Camera for CommandCamera {
    /// Verifies the tool with a test capture at the current resolution.
    fn open(&mut self) -> Result<()> {
        info!(program = %self.config.program, "Testing capture command");
        self.open = true;
        match self.capture() {
            Ok(frame) => {
                info!("Capture command working: {}x{}", frame.width(), frame.height());
                Ok(())
            }
            Err(e) => {
                self.open = false;
                Err(match e {
                    CaptureError::DeviceUnavailable(_) => e,
                    other => CaptureError::DeviceUnavailable(other.to_string()),
                })
            }
        }
    }

    fn set_resolution(&mut self, resolution: Resolution) -> Result<()> {
        if resolution.width == 0 || resolution.height == 0 {
            return Err(CaptureError::InvalidParameter(format!(
                "invalid resolution {}",
                resolution
            )));
        }
        self.resolution = resolution;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame> {
        if !self.open {
            return Err(CaptureError::DeviceUnavailable("capture command not opened".to_string()));
        }
        self.capture()
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
