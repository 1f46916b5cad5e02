//! Capture controller configuration and state types

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Deserialize;

use crate::capture_pipeline::classify::{ClassifierConfig, SubjectColor};
use crate::capture_pipeline::diff::DiffParams;

/// What moves the controller from Idle into Sensing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    /// Every poll interval: diff a detection frame against the previous one
    #[default]
    Interval,
    /// A rising edge on a discrete sensor, subject to the cooldown
    EdgeSensor,
}

/// What a high-resolution frame must pass before it is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmStrategy {
    /// Motion was found by frame differencing; the classifier confirms it
    #[default]
    PreviousFrameDiff,
    /// The frame must differ from the stored reference image
    ReferenceImageDiff,
    /// Every captured frame is recorded
    AlwaysConfirm,
}

impl ConfirmStrategy {
    pub fn needs_reference(self) -> bool {
        matches!(self, ConfirmStrategy::ReferenceImageDiff)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Sensing,
    Confirming,
    Recording,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureState::Idle => "idle",
            CaptureState::Sensing => "sensing",
            CaptureState::Confirming => "confirming",
            CaptureState::Recording => "recording",
        };
        f.write_str(name)
    }
}

/// A confirmed event, handed to the notifier and then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureEvent {
    pub timestamp: DateTime<Local>,
    /// `None` when the evidence frame could not be stored
    pub evidence_path: Option<PathBuf>,
    pub subject_color: SubjectColor,
}

/// How one pass through the state machine ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// No trigger was pending
    NoTrigger,
    /// First detection frame, stored as the motion baseline
    BaselineEstablished,
    /// Detection frame did not change enough
    Quiet { changed_pixels: u64 },
    /// Trigger arrived inside the cooldown window and was ignored
    Debounced,
    /// High-resolution frame failed confirmation
    Rejected,
    Recorded(CaptureEvent),
}

/// Configuration for the capture controller
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub trigger: TriggerSource,
    pub confirm: ConfirmStrategy,
    /// Sleep between cycles in interval mode
    pub poll_interval: Duration,
    /// Sleep between latch checks in edge-sensor mode
    pub sensor_poll_interval: Duration,
    /// Minimum time between two accepted sensor triggers
    pub cooldown: Duration,
    /// Pause after a failed cycle
    pub error_pause: Duration,
    pub motion_params: DiffParams,
    /// Changed pixels a detection frame must exceed to count as motion
    pub motion_threshold: u64,
    pub reference_params: DiffParams,
    /// Changed pixels a capture frame must exceed against the reference
    pub reference_threshold: u64,
    pub classifier: ClassifierConfig,
    /// Record every confirming frame regardless of the confirmation outcome
    pub record_all: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            trigger: TriggerSource::Interval,
            confirm: ConfirmStrategy::PreviousFrameDiff,
            poll_interval: Duration::from_secs(60),
            sensor_poll_interval: Duration::from_millis(100),
            cooldown: Duration::from_secs(30),
            error_pause: Duration::from_secs(5),
            motion_params: DiffParams {
                blur_kernel: 0,
                binary_threshold: 50,
            },
            motion_threshold: 5000,
            reference_params: DiffParams {
                blur_kernel: 5,
                binary_threshold: 25,
            },
            reference_threshold: 3000,
            classifier: ClassifierConfig::default(),
            record_all: false,
        }
    }
}

impl ControllerConfig {
    pub fn builder() -> ControllerConfigBuilder {
        ControllerConfigBuilder::default()
    }
}

/// Builder for ControllerConfig
#[derive(Default)]
pub struct ControllerConfigBuilder {
    trigger: Option<TriggerSource>,
    confirm: Option<ConfirmStrategy>,
    poll_interval: Option<Duration>,
    sensor_poll_interval: Option<Duration>,
    cooldown: Option<Duration>,
    error_pause: Option<Duration>,
    motion: Option<(DiffParams, u64)>,
    reference: Option<(DiffParams, u64)>,
    classifier: Option<ClassifierConfig>,
    record_all: Option<bool>,
}

impl ControllerConfigBuilder {
    pub fn trigger(mut self, trigger: TriggerSource) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn confirm(mut self, confirm: ConfirmStrategy) -> Self {
        self.confirm = Some(confirm);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn sensor_poll_interval(mut self, interval: Duration) -> Self {
        self.sensor_poll_interval = Some(interval);
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    pub fn error_pause(mut self, pause: Duration) -> Self {
        self.error_pause = Some(pause);
        self
    }

    pub fn motion(mut self, params: DiffParams, threshold: u64) -> Self {
        self.motion = Some((params, threshold));
        self
    }

    pub fn reference(mut self, params: DiffParams, threshold: u64) -> Self {
        self.reference = Some((params, threshold));
        self
    }

    pub fn classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn record_all(mut self, enable: bool) -> Self {
        self.record_all = Some(enable);
        self
    }

    pub fn build(self) -> ControllerConfig {
        let default = ControllerConfig::default();
        let (motion_params, motion_threshold) = self
            .motion
            .unwrap_or((default.motion_params, default.motion_threshold));
        let (reference_params, reference_threshold) = self
            .reference
            .unwrap_or((default.reference_params, default.reference_threshold));
        ControllerConfig {
            trigger: self.trigger.unwrap_or(default.trigger),
            confirm: self.confirm.unwrap_or(default.confirm),
            poll_interval: self.poll_interval.unwrap_or(default.poll_interval),
            sensor_poll_interval: self
                .sensor_poll_interval
                .unwrap_or(default.sensor_poll_interval),
            cooldown: self.cooldown.unwrap_or(default.cooldown),
            error_pause: self.error_pause.unwrap_or(default.error_pause),
            motion_params,
            motion_threshold,
            reference_params,
            reference_threshold,
            classifier: self.classifier.unwrap_or(default.classifier),
            record_all: self.record_all.unwrap_or(default.record_all),
        }
    }
}
