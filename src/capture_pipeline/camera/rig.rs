use std::thread;

use tracing::{debug, error, info, warn};

use crate::capture_pipeline::camera::device::Camera;
use crate::capture_pipeline::camera::types::{ResolutionMode, RigConfig};
use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::frame::Frame;

/// Owns the camera and enforces the two-resolution protocol.
///
/// Outside of [`CameraRig::capture_frame`] the device is always at detection
/// resolution. A failed read marks the device for reopening at the start of
/// the next operation; once `max_reopen_attempts` reopens in a row have
/// failed the rig reports [`CaptureError::DeviceUnavailable`].
pub struct CameraRig<C: Camera> {
    camera: C,
    config: RigConfig,
    mode: ResolutionMode,
    needs_reopen: bool,
    failed_reopens: u32,
    restore_error: Option<CaptureError>,
}

impl<C: Camera> CameraRig<C> {
    pub fn new(camera: C, config: RigConfig) -> Self {
        Self {
            camera,
            config,
            mode: ResolutionMode::Detection,
            needs_reopen: false,
            failed_reopens: 0,
            restore_error: None,
        }
    }

    pub fn config(&self) -> &RigConfig {
        &self.config
    }

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut C {
        &mut self.camera
    }

    pub fn is_open(&self) -> bool {
        self.camera.is_open()
    }

    /// Opens the device at detection resolution, waits out the warm-up and
    /// discards the first frames.
    pub fn open(&mut self) -> Result<()> {
        info!(
            detection = %self.config.detection,
            capture = %self.config.capture,
            "Opening camera"
        );
        self.camera
            .set_resolution(self.config.detection)
            .and_then(|_| self.camera.open())
            .map_err(|e| match e {
                CaptureError::DeviceUnavailable(_) => e,
                other => CaptureError::DeviceUnavailable(other.to_string()),
            })?;
        self.mode = ResolutionMode::Detection;
        self.needs_reopen = false;

        if !self.config.warmup.is_zero() {
            debug!("Camera warming up for {:?}", self.config.warmup);
            thread::sleep(self.config.warmup);
        }
        self.discard_frames();
        info!("Camera ready");
        Ok(())
    }

    pub fn close(&mut self) {
        if self.camera.is_open() {
            self.camera.close();
            info!("Camera released");
        }
    }

    /// Reopens the device if a previous failure asked for it.
    fn recover(&mut self) -> Result<()> {
        if !self.needs_reopen {
            return Ok(());
        }
        warn!(attempt = self.failed_reopens + 1, "Reopening camera");
        self.camera.close();
        match self.open() {
            Ok(()) => {
                self.failed_reopens = 0;
                Ok(())
            }
            Err(e) => {
                self.failed_reopens += 1;
                if self.failed_reopens >= self.config.max_reopen_attempts {
                    error!(attempts = self.failed_reopens, "Camera reopen budget exhausted");
                    Err(CaptureError::DeviceUnavailable(format!(
                        "gave up after {} reopen attempts: {}",
                        self.failed_reopens, e
                    )))
                } else {
                    Err(CaptureError::TransientCaptureFailure(format!(
                        "camera reopen failed: {}",
                        e
                    )))
                }
            }
        }
    }

    fn read(&mut self) -> Result<Frame> {
        self.camera.read_frame().map_err(|e| {
            self.needs_reopen = true;
            match e {
                CaptureError::TransientCaptureFailure(_) => e,
                other => CaptureError::TransientCaptureFailure(other.to_string()),
            }
        })
    }

    fn discard_frames(&mut self) {
        for _ in 0..self.config.discard_frames {
            if let Err(e) = self.camera.read_frame() {
                debug!("Discarded frame read failed: {}", e);
            }
        }
    }

    /// One frame at detection resolution.
    pub fn read_detection_frame(&mut self) -> Result<Frame> {
        self.recover()?;
        if self.mode != ResolutionMode::Detection {
            self.restore_detection()?;
        }
        self.read()
    }

    /// One frame at capture resolution.
    ///
    /// Switches up, waits for the sensor to settle, discards transient
    /// frames and reads. Detection resolution is restored before returning
    /// on every path, including errors. If it cannot be restored, even by
    /// reopening the device, that failure is returned instead of the frame.
    pub fn capture_frame(&mut self) -> Result<Frame> {
        self.recover()?;
        let result = {
            let mut guard = CaptureModeGuard::enter(self);
            guard.rig.capture_read()
        };

        match (self.restore_error.take(), result) {
            (Some(restore), Ok(_)) => Err(restore),
            (Some(restore), Err(_)) if restore.is_fatal() => Err(restore),
            (_, result) => result,
        }
    }

    fn capture_read(&mut self) -> Result<Frame> {
        self.camera.set_resolution(self.config.capture)?;
        debug!(resolution = %self.config.capture, "Switched to capture resolution");

        if !self.config.settle.is_zero() {
            thread::sleep(self.config.settle);
        }
        self.discard_frames();
        self.read()
    }

    fn restore_detection(&mut self) -> Result<()> {
        match self.camera.set_resolution(self.config.detection) {
            Ok(()) => {
                self.mode = ResolutionMode::Detection;
                debug!(resolution = %self.config.detection, "Restored detection resolution");
                Ok(())
            }
            Err(e) => {
                // Reopening resets the device to detection resolution.
                error!("Failed to restore detection resolution: {}", e);
                self.needs_reopen = true;
                self.recover()
            }
        }
    }
}

impl<C: Camera> Drop for CameraRig<C> {
    fn drop(&mut self) {
        self.close();
    }
}

struct CaptureModeGuard<'a, C: Camera> {
    rig: &'a mut CameraRig<C>,
}

impl<'a, C: Camera> CaptureModeGuard<'a, C> {
    fn enter(rig: &'a mut CameraRig<C>) -> Self {
        rig.mode = ResolutionMode::Capture;
        Self { rig }
    }
}

impl<C: Camera> Drop for CaptureModeGuard<'_, C> {
    fn drop(&mut self) {
        if let Err(e) = self.rig.restore_detection() {
            self.rig.restore_error = Some(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture_pipeline::camera::types::Resolution;
    use crate::capture_pipeline::frame::PixelFormat;
    use std::collections::VecDeque;
    use std::time::Duration;

    #[derive(Default)]
    struct MockCamera {
        open: bool,
        resolution: Option<Resolution>,
        reads: VecDeque<bool>,
        open_failures: u32,
        opens: u32,
        fail_switch_to: Option<Resolution>,
        fail_next_switch_to: Option<Resolution>,
    }

    impl Camera for MockCamera {
        fn open(&mut self) -> Result<()> {
            self.opens += 1;
            if self.open_failures > 0 {
                self.open_failures -= 1;
                return Err(CaptureError::DeviceUnavailable("Mock open error".into()));
            }
            self.open = true;
            Ok(())
        }

        fn set_resolution(&mut self, resolution: Resolution) -> Result<()> {
            if self.fail_switch_to == Some(resolution) {
                return Err(CaptureError::TransientCaptureFailure("Mock switch error".into()));
            }
            if self.fail_next_switch_to == Some(resolution) {
                self.fail_next_switch_to = None;
                return Err(CaptureError::TransientCaptureFailure("Mock switch error".into()));
            }
            self.resolution = Some(resolution);
            Ok(())
        }

        fn read_frame(&mut self) -> Result<Frame> {
            if !self.reads.pop_front().unwrap_or(true) {
                return Err(CaptureError::TransientCaptureFailure("Mock read error".into()));
            }
            let res = self.resolution.unwrap();
            Ok(Frame::filled(res.width as usize, res.height as usize, PixelFormat::Rgb8, 0))
        }

        fn close(&mut self) {
            self.open = false;
        }

        fn is_open(&self) -> bool {
            self.open
        }
    }

    fn quick_config() -> RigConfig {
        RigConfig {
            detection: Resolution::new(32, 24),
            capture: Resolution::new(64, 48),
            warmup: Duration::ZERO,
            settle: Duration::ZERO,
            discard_frames: 0,
            max_reopen_attempts: 2,
        }
    }

    #[test]
    fn capture_returns_high_res_and_restores_detection() {
        let mut rig = CameraRig::new(MockCamera::default(), quick_config());
        rig.open().unwrap();

        let frame = rig.capture_frame().unwrap();

        assert_eq!(frame.dimensions(), (64, 48));
        assert_eq!(rig.mode(), ResolutionMode::Detection);
        assert_eq!(rig.camera().resolution, Some(Resolution::new(32, 24)));
    }

    #[test]
    fn failed_capture_read_still_restores_detection() {
        let mut rig = CameraRig::new(MockCamera::default(), quick_config());
        rig.open().unwrap();
        rig.camera_mut().reads.push_back(false);

        let result = rig.capture_frame();

        assert!(matches!(result, Err(CaptureError::TransientCaptureFailure(_))));
        assert_eq!(rig.mode(), ResolutionMode::Detection);
        assert_eq!(rig.camera().resolution, Some(Resolution::new(32, 24)));
    }

    #[test]
    fn failed_switch_up_restores_detection() {
        let camera = MockCamera {
            fail_switch_to: Some(Resolution::new(64, 48)),
            ..MockCamera::default()
        };
        let mut rig = CameraRig::new(camera, quick_config());
        rig.open().unwrap();

        assert!(rig.capture_frame().is_err());
        assert_eq!(rig.mode(), ResolutionMode::Detection);
        assert_eq!(rig.camera().resolution, Some(Resolution::new(32, 24)));
    }

    #[test]
    fn failed_switch_down_reopens_before_returning() {
        let mut rig = CameraRig::new(MockCamera::default(), quick_config());
        rig.open().unwrap();
        rig.camera_mut().fail_next_switch_to = Some(Resolution::new(32, 24));

        let frame = rig.capture_frame().unwrap();

        assert_eq!(frame.dimensions(), (64, 48));
        assert_eq!(rig.mode(), ResolutionMode::Detection);
        assert_eq!(rig.camera().resolution, Some(Resolution::new(32, 24)));
        assert_eq!(rig.camera().opens, 2);
        assert!(rig.is_open());
    }

    #[test]
    fn failed_switch_down_and_reopen_surfaces_error() {
        let mut rig = CameraRig::new(MockCamera::default(), quick_config());
        rig.open().unwrap();
        rig.camera_mut().fail_next_switch_to = Some(Resolution::new(32, 24));
        rig.camera_mut().open_failures = 1;

        let result = rig.capture_frame();

        assert!(matches!(result, Err(CaptureError::TransientCaptureFailure(_))));
        assert!(!rig.is_open());

        let frame = rig.read_detection_frame().unwrap();
        assert_eq!(frame.dimensions(), (32, 24));
        assert_eq!(rig.mode(), ResolutionMode::Detection);
    }

    #[test]
    fn read_failure_triggers_reopen_on_next_read() {
        let mut rig = CameraRig::new(MockCamera::default(), quick_config());
        rig.open().unwrap();
        rig.camera_mut().reads.push_back(false);

        assert!(rig.read_detection_frame().is_err());
        assert!(rig.read_detection_frame().is_ok());
        assert_eq!(rig.camera().opens, 2);
    }

    #[test]
    fn reopen_budget_exhaustion_is_fatal() {
        let mut rig = CameraRig::new(MockCamera::default(), quick_config());
        rig.open().unwrap();
        rig.camera_mut().reads.push_back(false);
        rig.camera_mut().open_failures = 5;

        assert!(rig.read_detection_frame().is_err());
        let first = rig.read_detection_frame().unwrap_err();
        assert!(!first.is_fatal());
        let second = rig.read_detection_frame().unwrap_err();
        assert!(second.is_fatal());
    }

    #[test]
    fn open_failure_is_device_unavailable() {
        let camera = MockCamera {
            open_failures: 1,
            ..MockCamera::default()
        };
        let mut rig = CameraRig::new(camera, quick_config());
        assert!(matches!(rig.open(), Err(CaptureError::DeviceUnavailable(_))));
    }
}
