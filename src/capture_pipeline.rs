//! Event-detection and adaptive-capture pipeline
//!
//! Leaf components (frame differencing, classification, reference and
//! evidence storage, retention) are independent of each other; the
//! controller drives them from a single capture loop that owns the camera.

pub mod camera;
pub mod classify;
pub mod codec;
pub mod common;
pub mod controller;
pub mod diff;
pub mod evidence;
pub mod frame;
pub mod notify;
pub mod reference;
pub mod retention;
pub mod sensor;

pub use common::{CaptureError, Result};

pub use frame::{Frame, PixelFormat};

pub use diff::{DiffParams, DiffResult, FrameDiffer, score};

pub use classify::{ClassifierConfig, HeuristicClassifier, SubjectClassifier, SubjectColor};

pub use codec::{EvidenceFormat, FrameWriter, JpegWriter, StandardTiffWriter, TiffCompression};

pub use reference::ReferenceStore;

pub use evidence::EvidenceSink;

pub use retention::{RetentionPolicy, StorageInfo};

pub use camera::{Camera, CameraRig, CommandCamera, CommandCameraConfig, Resolution, RigConfig};

pub use sensor::{SysfsGpioSensor, TriggerLatch, TriggerSensor};

pub use notify::{CommandNotifier, LogNotifier, Notifier};

pub use controller::{
    CaptureController, CaptureEvent, ConfirmStrategy, ControllerConfig, CycleOutcome,
    TriggerSource,
};
