use std::fs;
use std::path::{Path, PathBuf};

use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::sensor::device::TriggerSensor;

/// GPIO line exported through sysfs, read from its `value` file.
///
/// The pin must already be exported and configured as an input.
#[derive(Debug, Clone)]
pub struct SysfsGpioSensor {
    value_path: PathBuf,
}

impl SysfsGpioSensor {
    pub fn new(value_path: impl Into<PathBuf>) -> Self {
        Self {
            value_path: value_path.into(),
        }
    }

    pub fn value_path(&self) -> &Path {
        &self.value_path
    }
}

impl TriggerSensor for SysfsGpioSensor {
    fn poll_level(&mut self) -> Result<bool> {
        let raw = fs::read_to_string(&self.value_path).map_err(|e| {
            CaptureError::DeviceUnavailable(format!("{}: {}", self.value_path.display(), e))
        })?;
        match raw.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(CaptureError::InvalidParameter(format!(
                "unexpected GPIO value {:?} in {}",
                other,
                self.value_path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_levels_from_value_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("value");
        let mut sensor = SysfsGpioSensor::new(&path);

        fs::write(&path, "0\n").unwrap();
        assert!(!sensor.poll_level().unwrap());

        fs::write(&path, "1\n").unwrap();
        assert!(sensor.poll_level().unwrap());
    }

    #[test]
    fn missing_value_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut sensor = SysfsGpioSensor::new(dir.path().join("gpio17/value"));
        assert!(matches!(sensor.poll_level(), Err(CaptureError::DeviceUnavailable(_))));
    }

    #[test]
    fn garbage_value_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("value");
        fs::write(&path, "x").unwrap();
        assert!(SysfsGpioSensor::new(&path).poll_level().is_err());
    }
}
