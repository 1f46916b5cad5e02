//! Capture controller module
//!
//! The state machine tying the pipeline together. Both driving variants
//! (interval polling and edge-sensor triggers) and all confirmation
//! strategies run through one engine.

mod engine;
mod timing;
pub mod types;

pub use engine::CaptureController;
pub use timing::{CycleTimings, StageTiming, Timer};
pub use types::{
    CaptureEvent, CaptureState, ConfirmStrategy, ControllerConfig, ControllerConfigBuilder,
    CycleOutcome, TriggerSource,
};
