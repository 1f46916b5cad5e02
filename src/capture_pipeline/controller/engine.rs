use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{debug, error, info, info_span, instrument, warn};

use crate::capture_pipeline::camera::{Camera, CameraRig};
use crate::capture_pipeline::classify::{HeuristicClassifier, SubjectClassifier};
use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::controller::timing::{CycleTimings, Timer};
use crate::capture_pipeline::controller::types::{
    CaptureEvent, CaptureState, ConfirmStrategy, ControllerConfig, CycleOutcome, TriggerSource,
};
use crate::capture_pipeline::diff::FrameDiffer;
use crate::capture_pipeline::evidence::EvidenceSink;
use crate::capture_pipeline::frame::Frame;
use crate::capture_pipeline::notify::Notifier;
use crate::capture_pipeline::reference::ReferenceStore;
use crate::capture_pipeline::retention::RetentionPolicy;
use crate::capture_pipeline::sensor::TriggerLatch;

/// Longest uninterrupted sleep; the running flag is rechecked in between.
const SLEEP_SLICE: Duration = Duration::from_millis(250);

/// The event-detection and adaptive-capture state machine.
///
/// One controller owns one camera and runs strictly sequentially:
/// `Idle -> Sensing -> (Confirming) -> (Recording) -> Idle`. What enters
/// Sensing is chosen by [`TriggerSource`], what gates Recording by
/// [`ConfirmStrategy`]. The camera is at detection resolution whenever a
/// cycle starts or ends.
pub struct CaptureController<C: Camera, N: Notifier, K: SubjectClassifier = HeuristicClassifier> {
    config: ControllerConfig,
    rig: CameraRig<C>,
    classifier: K,
    motion_differ: FrameDiffer,
    reference_differ: FrameDiffer,
    reference_store: ReferenceStore,
    reference: Option<Frame>,
    detection_baseline: Option<Frame>,
    sink: EvidenceSink,
    retention: RetentionPolicy,
    notifier: N,
    latch: TriggerLatch,
    last_trigger: Option<Instant>,
    state: CaptureState,
}

impl<C: Camera, N: Notifier> CaptureController<C, N, HeuristicClassifier> {
    pub fn new(
        config: ControllerConfig,
        rig: CameraRig<C>,
        reference_store: ReferenceStore,
        sink: EvidenceSink,
        retention: RetentionPolicy,
        notifier: N,
    ) -> Self {
        let classifier = HeuristicClassifier::new(config.classifier.clone());
        Self::with_custom(config, rig, classifier, reference_store, sink, retention, notifier)
    }
}

impl<C: Camera, N: Notifier, K: SubjectClassifier> CaptureController<C, N, K> {
    pub fn with_custom(
        config: ControllerConfig,
        rig: CameraRig<C>,
        classifier: K,
        reference_store: ReferenceStore,
        sink: EvidenceSink,
        retention: RetentionPolicy,
        notifier: N,
    ) -> Self {
        Self {
            motion_differ: FrameDiffer::new(config.motion_params, config.motion_threshold),
            reference_differ: FrameDiffer::new(config.reference_params, config.reference_threshold),
            config,
            rig,
            classifier,
            reference_store,
            reference: None,
            detection_baseline: None,
            sink,
            retention,
            notifier,
            latch: TriggerLatch::new(),
            last_trigger: None,
            state: CaptureState::Idle,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn rig(&self) -> &CameraRig<C> {
        &self.rig
    }

    pub fn rig_mut(&mut self) -> &mut CameraRig<C> {
        &mut self.rig
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn reference(&self) -> Option<&Frame> {
        self.reference.as_ref()
    }

    /// Handle for the edge watcher; firing it requests one trigger cycle.
    pub fn trigger_latch(&self) -> TriggerLatch {
        self.latch.clone()
    }

    /// Opens the camera and, for reference comparison, loads or captures the
    /// reference image. Any failure here is fatal.
    pub fn start(&mut self) -> Result<()> {
        self.rig.open()?;
        if self.config.confirm.needs_reference() {
            self.ensure_reference()?;
        }
        info!(
            trigger = ?self.config.trigger,
            confirm = ?self.config.confirm,
            record_all = self.config.record_all,
            "Capture controller started"
        );
        Ok(())
    }

    fn ensure_reference(&mut self) -> Result<()> {
        let rig = &mut self.rig;
        let reference = self.reference_store.ensure(|| rig.capture_frame())?;
        self.check_reference(&reference)?;
        self.reference = Some(reference);
        Ok(())
    }

    fn check_reference(&self, reference: &Frame) -> Result<()> {
        let capture = self.rig.config().capture;
        if capture.matches(reference.dimensions()) {
            Ok(())
        } else {
            error!(
                path = %self.reference_store.path().display(),
                "Reference image does not match capture resolution {}; re-baseline required",
                capture
            );
            Err(CaptureError::dimension_mismatch(
                reference.dimensions(),
                (capture.width as usize, capture.height as usize),
            ))
        }
    }

    /// Captures the current scene and replaces the stored reference.
    #[instrument(skip(self))]
    pub fn rebaseline(&mut self) -> Result<()> {
        let gray = self.rig.capture_frame()?.into_gray();
        self.reference_store.save(&gray)?;
        info!(
            width = gray.width(),
            height = gray.height(),
            path = %self.reference_store.path().display(),
            "Reference image replaced"
        );
        self.reference = Some(gray);
        Ok(())
    }

    /// Runs one pass through the state machine. Always ends in `Idle`.
    pub fn run_cycle(&mut self, now: Instant) -> Result<CycleOutcome> {
        let span = info_span!("cycle", trigger = ?self.config.trigger);
        let _enter = span.enter();

        let mut timings = CycleTimings::new();
        let outcome = match self.config.trigger {
            TriggerSource::Interval => self.sense_motion(&mut timings),
            TriggerSource::EdgeSensor => {
                if self.latch.take() {
                    self.handle_trigger_timed(now, &mut timings)
                } else {
                    Ok(CycleOutcome::NoTrigger)
                }
            }
        };
        self.state = CaptureState::Idle;
        timings.log_summary();
        outcome
    }

    /// Accepts or debounces one sensor trigger and, if accepted, runs the
    /// confirm and record stages.
    pub fn handle_trigger(&mut self, now: Instant) -> Result<CycleOutcome> {
        let mut timings = CycleTimings::new();
        let outcome = self.handle_trigger_timed(now, &mut timings);
        self.state = CaptureState::Idle;
        timings.log_summary();
        outcome
    }

    fn handle_trigger_timed(
        &mut self,
        now: Instant,
        timings: &mut CycleTimings,
    ) -> Result<CycleOutcome> {
        if let Some(last) = self.last_trigger {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.config.cooldown {
                debug!(
                    remaining_ms = (self.config.cooldown - elapsed).as_millis() as u64,
                    "Trigger ignored during cooldown"
                );
                return Ok(CycleOutcome::Debounced);
            }
        }
        self.last_trigger = Some(now);
        self.state = CaptureState::Sensing;
        info!("Trigger accepted");
        self.confirm_and_record(timings)
    }

    fn sense_motion(&mut self, timings: &mut CycleTimings) -> Result<CycleOutcome> {
        self.state = CaptureState::Sensing;

        let timer = Timer::start("sense");
        let gray = self.rig.read_detection_frame()?.into_gray();
        let Some(previous) = self.detection_baseline.as_ref() else {
            debug!(width = gray.width(), height = gray.height(), "Detection baseline established");
            self.detection_baseline = Some(gray);
            timer.stop(timings);
            return Ok(CycleOutcome::BaselineEstablished);
        };

        let result = match self.motion_differ.compare(&gray, previous) {
            Ok(result) => result,
            Err(e) => {
                // Start over from the new frame so the next cycle can compare.
                self.detection_baseline = Some(gray);
                return Err(e);
            }
        };
        timer.stop(timings);

        if !result.exceeds_threshold() {
            debug!(
                changed_pixels = result.changed_pixels,
                threshold = result.threshold,
                "No significant motion"
            );
            return Ok(CycleOutcome::Quiet {
                changed_pixels: result.changed_pixels,
            });
        }

        info!(
            changed_pixels = result.changed_pixels,
            threshold = result.threshold,
            "Motion detected"
        );
        self.detection_baseline = Some(gray);
        self.confirm_and_record(timings)
    }

    fn confirm_and_record(&mut self, timings: &mut CycleTimings) -> Result<CycleOutcome> {
        self.state = CaptureState::Confirming;

        let timer = Timer::start("capture");
        let frame = self.rig.capture_frame()?;
        timer.stop(timings);

        let timer = Timer::start("confirm");
        let confirmed = self.confirm(&frame)?;
        timer.stop(timings);

        if !confirmed {
            if !self.config.record_all {
                info!(strategy = ?self.config.confirm, "Capture not confirmed");
                return Ok(CycleOutcome::Rejected);
            }
            info!(strategy = ?self.config.confirm, "Capture not confirmed; recording anyway");
        }

        self.state = CaptureState::Recording;
        Ok(CycleOutcome::Recorded(self.record(frame, timings)))
    }

    fn confirm(&self, frame: &Frame) -> Result<bool> {
        match self.config.confirm {
            ConfirmStrategy::PreviousFrameDiff => {
                let present = self.classifier.is_subject_present(frame);
                debug!(present, "Classifier result");
                Ok(present)
            }
            ConfirmStrategy::ReferenceImageDiff => {
                let reference = self.reference.as_ref().ok_or_else(|| {
                    CaptureError::ReferenceNotFound(self.reference_store.path().to_path_buf())
                })?;
                let result = self.reference_differ.compare(&frame.to_gray(), reference)?;
                info!(
                    changed_pixels = result.changed_pixels,
                    threshold = result.threshold,
                    "Compared against reference"
                );
                Ok(result.exceeds_threshold())
            }
            ConfirmStrategy::AlwaysConfirm => Ok(true),
        }
    }

    /// Stores, classifies and announces one frame. A storage failure loses
    /// the evidence but still notifies without a path.
    fn record(&mut self, frame: Frame, timings: &mut CycleTimings) -> CaptureEvent {
        let timestamp = Local::now();

        let timer = Timer::start("store");
        let evidence_path = match self.sink.save(&frame, timestamp) {
            Ok(path) => Some(path),
            Err(e) => {
                error!("Evidence not stored: {}", e);
                None
            }
        };
        timer.stop(timings);

        let subject_color = self.classifier.color_class(&frame);
        drop(frame);

        let timer = Timer::start("notify");
        if !self.notifier.notify(subject_color, evidence_path.as_deref()) {
            warn!(color = %subject_color, "Notification failed");
        }
        timer.stop(timings);

        info!(
            color = %subject_color,
            path = ?evidence_path,
            "Event recorded"
        );
        CaptureEvent {
            timestamp,
            evidence_path,
            subject_color,
        }
    }

    /// Starts the controller and cycles until `running` is cleared or the
    /// camera is lost for good. The camera is released and all held frames
    /// dropped on every exit path.
    pub fn run(&mut self, running: &AtomicBool) -> Result<()> {
        let result = self.start().and_then(|_| self.run_loop(running));
        self.shutdown();
        result
    }

    fn run_loop(&mut self, running: &AtomicBool) -> Result<()> {
        let idle_sleep = match self.config.trigger {
            TriggerSource::Interval => self.config.poll_interval,
            TriggerSource::EdgeSensor => self.config.sensor_poll_interval,
        };

        while running.load(Ordering::Relaxed) {
            match self.run_cycle(Instant::now()) {
                Ok(_) => {}
                Err(e) if e.is_fatal() => {
                    error!("Camera lost, stopping: {}", e);
                    return Err(e);
                }
                Err(e) => {
                    error!("Capture cycle failed: {}", e);
                    pause(running, self.config.error_pause);
                }
            }
            self.retention.run_if_due(Instant::now());
            pause(running, idle_sleep);
        }
        info!("Stop requested");
        Ok(())
    }

    /// Releases the camera and drops every held frame.
    pub fn shutdown(&mut self) {
        self.detection_baseline = None;
        self.reference = None;
        self.state = CaptureState::Idle;
        self.rig.close();
        info!("Capture controller stopped");
    }
}

/// Sleeps for `duration`, returning early once `running` is cleared.
fn pause(running: &AtomicBool, duration: Duration) {
    let deadline = Instant::now() + duration;
    while running.load(Ordering::Relaxed) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        thread::sleep(remaining.min(SLEEP_SLICE));
    }
}
