//! File configuration for the `catnap-watch` binary.
//!
//! Every section falls back to its defaults, so `{}` is a complete config.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::capture_pipeline::camera::{CommandCameraConfig, Resolution, RigConfig};
use crate::capture_pipeline::classify::ClassifierConfig;
use crate::capture_pipeline::codec::{EvidenceFormat, TiffCompression};
use crate::capture_pipeline::controller::{ConfirmStrategy, ControllerConfig, TriggerSource};
use crate::capture_pipeline::diff::DiffParams;
use crate::capture_pipeline::frame::validate_blur_kernel;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraBackend {
    /// External still-capture tool, one process per frame
    #[default]
    Command,
    /// V4L2 streaming device (needs the `v4l` feature)
    V4l,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub backend: CameraBackend,
    pub device: PathBuf,
    pub command: String,
    pub args: Vec<String>,
    pub command_timeout_secs: u64,
    pub quality: u8,
    pub detection: Resolution,
    pub capture: Resolution,
    pub warmup_secs: f64,
    pub settle_ms: u64,
    pub discard_frames: usize,
    pub max_reopen_attempts: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        let command = CommandCameraConfig::default();
        let rig = RigConfig::default();
        Self {
            backend: CameraBackend::Command,
            device: PathBuf::from("/dev/video0"),
            command: command.program,
            args: command.args,
            command_timeout_secs: command.timeout.as_secs(),
            quality: command.quality,
            detection: rig.detection,
            capture: rig.capture,
            warmup_secs: rig.warmup.as_secs_f64(),
            settle_ms: rig.settle.as_millis() as u64,
            discard_frames: rig.discard_frames,
            max_reopen_attempts: rig.max_reopen_attempts,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    pub interval_secs: u64,
    /// Changed pixels a detection frame must exceed to count as motion
    pub diff_threshold: u64,
    pub binary_threshold: u8,
    pub blur_kernel: usize,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            diff_threshold: 5000,
            binary_threshold: 50,
            blur_kernel: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub min_brightness: f64,
    pub light_cutoff: f64,
    pub blur_kernel: usize,
    pub min_area: usize,
    pub max_area: usize,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        let defaults = ClassifierConfig::default();
        Self {
            min_brightness: defaults.min_brightness,
            light_cutoff: defaults.light_cutoff,
            blur_kernel: defaults.blur_kernel,
            min_area: defaults.min_area,
            max_area: defaults.max_area,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReferenceSettings {
    pub path: PathBuf,
    pub diff_threshold: u64,
    pub binary_threshold: u8,
    pub blur_kernel: usize,
    pub compression: TiffCompression,
}

impl Default for ReferenceSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("baseline/reference.tiff"),
            diff_threshold: 3000,
            binary_threshold: 25,
            blur_kernel: 5,
            compression: TiffCompression::Deflate,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TriggerSettings {
    pub source: TriggerSource,
    /// sysfs `value` file of the sensor GPIO
    pub gpio_value_path: PathBuf,
    pub sensor_poll_ms: u64,
    pub cooldown_secs: u64,
}

impl Default for TriggerSettings {
    fn default() -> Self {
        Self {
            source: TriggerSource::Interval,
            gpio_value_path: PathBuf::from("/sys/class/gpio/gpio17/value"),
            sensor_poll_ms: 100,
            cooldown_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfirmSettings {
    pub strategy: ConfirmStrategy,
    pub record_all: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EvidenceSettings {
    pub directory: PathBuf,
    pub prefix: String,
    pub format: EvidenceFormat,
    pub jpeg_quality: u8,
}

impl Default for EvidenceSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("photos"),
            prefix: "cat".to_string(),
            format: EvidenceFormat::Jpeg,
            jpeg_quality: 85,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetentionSettings {
    pub max_count: usize,
    pub interval_hours: u64,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            max_count: 100,
            interval_hours: 24,
        }
    }
}

impl RetentionSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours * 3600)
    }
}

/// External notification command; absent means events are only logged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotifierSettings {
    pub command: Option<String>,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WatchSettings {
    pub camera: CameraSettings,
    pub detection: DetectionSettings,
    pub classifier: ClassifierSettings,
    pub reference: ReferenceSettings,
    pub trigger: TriggerSettings,
    pub confirm: ConfirmSettings,
    pub evidence: EvidenceSettings,
    pub retention: RetentionSettings,
    pub notifier: NotifierSettings,
    pub log_file: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<WatchSettings, SettingsError> {
    let data = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings: WatchSettings =
        serde_json::from_str(&data).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    settings.validate()?;
    Ok(settings)
}

impl WatchSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        for (name, kernel) in [
            ("detection.blur_kernel", self.detection.blur_kernel),
            ("classifier.blur_kernel", self.classifier.blur_kernel),
            ("reference.blur_kernel", self.reference.blur_kernel),
        ] {
            validate_blur_kernel(kernel)
                .map_err(|e| SettingsError::Invalid(format!("{}: {}", name, e)))?;
        }

        if self.retention.max_count == 0 {
            return Err(SettingsError::Invalid(
                "retention.max_count must be positive".to_string(),
            ));
        }

        for (name, resolution) in [
            ("camera.detection", self.camera.detection),
            ("camera.capture", self.camera.capture),
        ] {
            if resolution.width == 0 || resolution.height == 0 {
                return Err(SettingsError::Invalid(format!(
                    "{} resolution must be non-zero, got {}",
                    name, resolution
                )));
            }
        }

        if self.classifier.min_area > self.classifier.max_area {
            return Err(SettingsError::Invalid(format!(
                "classifier area band is inverted: [{}, {}]",
                self.classifier.min_area, self.classifier.max_area
            )));
        }

        // The sweep would count the reference as evidence and eventually delete it.
        let reference = normalize_path(&self.reference.path);
        if reference.starts_with(normalize_path(&self.evidence.directory)) {
            return Err(SettingsError::Invalid(format!(
                "reference image {} must not live inside the evidence directory {}",
                self.reference.path.display(),
                self.evidence.directory.display()
            )));
        }

        Ok(())
    }

    pub fn rig_config(&self) -> RigConfig {
        RigConfig {
            detection: self.camera.detection,
            capture: self.camera.capture,
            warmup: Duration::from_secs_f64(self.camera.warmup_secs.max(0.0)),
            settle: Duration::from_millis(self.camera.settle_ms),
            discard_frames: self.camera.discard_frames,
            max_reopen_attempts: self.camera.max_reopen_attempts,
        }
    }

    pub fn command_camera_config(&self) -> CommandCameraConfig {
        CommandCameraConfig {
            program: self.camera.command.clone(),
            args: self.camera.args.clone(),
            quality: self.camera.quality,
            timeout: Duration::from_secs(self.camera.command_timeout_secs),
            ..CommandCameraConfig::default()
        }
    }

    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            min_brightness: self.classifier.min_brightness,
            light_cutoff: self.classifier.light_cutoff,
            blur_kernel: self.classifier.blur_kernel,
            min_area: self.classifier.min_area,
            max_area: self.classifier.max_area,
        }
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig::builder()
            .trigger(self.trigger.source)
            .confirm(self.confirm.strategy)
            .poll_interval(Duration::from_secs(self.detection.interval_secs))
            .sensor_poll_interval(Duration::from_millis(self.trigger.sensor_poll_ms))
            .cooldown(Duration::from_secs(self.trigger.cooldown_secs))
            .motion(
                DiffParams {
                    blur_kernel: self.detection.blur_kernel,
                    binary_threshold: self.detection.binary_threshold,
                },
                self.detection.diff_threshold,
            )
            .reference(
                DiffParams {
                    blur_kernel: self.reference.blur_kernel,
                    binary_threshold: self.reference.binary_threshold,
                },
                self.reference.diff_threshold,
            )
            .classifier(self.classifier_config())
            .record_all(self.confirm.record_all)
            .build()
    }
}

/// Lexically absolute form of `path`, resolved against the working directory
/// with `.` and `..` folded away. The file does not have to exist.
fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
